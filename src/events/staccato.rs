//! Staccato shortening and conversion of merged notes into [`NoteEvent`]s.

use super::ties::MergedNote;
use super::types::NoteEvent;

pub const DEFAULT_STACCATO_FACTOR: f64 = 0.4;
pub const MIN_STACCATO_FACTOR: f64 = 0.1;
pub const MAX_STACCATO_FACTOR: f64 = 0.9;

/// Clamp a staccato factor into `[MIN_STACCATO_FACTOR, MAX_STACCATO_FACTOR]`.
pub fn clamp_staccato_factor(factor: f64) -> f64 {
    let clamped = factor.clamp(MIN_STACCATO_FACTOR, MAX_STACCATO_FACTOR);
    if clamped != factor {
        tracing::debug!("Staccato factor {} clamped to {}", factor, clamped);
    }
    clamped
}

/// Build the event for a merged note, shortening the rendered length of staccato notes.
///
/// `original_duration` always keeps the full tie-merged length.
pub fn to_note_event(
    note: MergedNote,
    staccato_factor: f64,
    instrument_label: &str,
    instrument_family: &str,
) -> NoteEvent {
    let duration = if note.staccato {
        note.duration * staccato_factor
    } else {
        note.duration
    };

    NoteEvent {
        pitch_midi: note.pitch_midi,
        start_time: note.start,
        duration,
        original_duration: note.duration,
        instrument_family: instrument_family.to_string(),
        instrument_label: instrument_label.to_string(),
        dynamic_level: note.dynamic.level,
        dynamic_mark: note.dynamic.mark,
        pitch_overlap: 1,
    }
}
