//! # Public API
//!
//! This module contains the main entry point of the library.
//!
//! ## Functions
//!
//! - [`convert()`] - Run the full pipeline over a score
//! - [`detect_ensembles()`](crate::detect_ensembles) - Suggest an ensemble grouping (separate
//!   side channel, never changes `convert` output)
//!
//! ## Typical Usage
//!
//! ```rust
//! use score_timeline::{convert, ConversionOptions, Score};
//!
//! let score = Score::from_yaml(r#"
//! parts:
//!   - name: Violin
//!     measures:
//!       - number: 1
//!         bar-duration: 4.0
//!         elements:
//!           - { kind: note, offset: 0.0, pitch: C4, duration: 2.0, tie: start }
//!       - number: 2
//!         bar-duration: 4.0
//!         elements:
//!           - { kind: note, offset: 0.0, pitch: C4, duration: 1.0, tie: stop }
//!           - { kind: note, offset: 1.0, pitch: E4, duration: 1.0, articulations: [staccato] }
//! "#)?;
//!
//! let timeline = convert(&score, &ConversionOptions::default())?;
//! assert_eq!(timeline.events.len(), 2);
//! assert_eq!(timeline.events[0].start_time, 0.0);
//! assert_eq!(timeline.events[0].duration, 3.0);  // tied over the barline
//! assert_eq!(timeline.events[1].duration, 0.4);  // staccato
//! # Ok::<(), score_timeline::TimelineError>(())
//! ```

use serde::Serialize;

use crate::collect::{collect_parts, collect_rehearsal_marks};
use crate::events::{
    count_overlaps, detect_connections, merge_ties, split_overlaps, to_note_event, Connection,
    NoteEvent, RehearsalMark,
};
use crate::measures::{MeasureOffsetMap, MeasureTick};
use crate::options::ConversionOptions;
use crate::score::Score;
use crate::TimelineError;

/// Everything a renderer needs to plot one score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub events: Vec<NoteEvent>,
    pub rehearsal_marks: Vec<RehearsalMark>,
    pub measure_ticks: Vec<MeasureTick>,
    /// Empty unless connections were requested
    pub connections: Vec<Connection>,
    /// Canonical score length, or the window length when sliced
    pub total_duration: f64,
}

/// Convert a score into a flat timeline of note events.
///
/// # Pipeline
/// 1. Build the canonical measure timeline
/// 2. Collect raw events and dynamics per part
/// 3. Merge ties and resolve loudness
/// 4. Apply staccato shortening
/// 5. Split (or count) same-pitch overlaps
/// 6. Clip to the slice window, if any
/// 7. Detect connections, if requested
///
/// # Errors
/// Returns [`TimelineError::NoNotes`] when no note survives, and
/// [`TimelineError::InvalidSlice`] when the slice cannot be placed on this score.
pub fn convert(score: &Score, options: &ConversionOptions) -> Result<Timeline, TimelineError> {
    let offsets = MeasureOffsetMap::build(score);

    // Resolve the window first so a bad slice fails before any work
    let window = options
        .slice
        .map(|range| range.resolve(&offsets))
        .transpose()?;

    let mut events: Vec<NoteEvent> = Vec::new();
    for part in collect_parts(score, &offsets, options.ensemble) {
        let merged = merge_ties(&part);
        events.extend(merged.into_iter().map(|note| {
            to_note_event(
                note,
                options.staccato_factor,
                &part.instrument_label,
                &part.instrument_family,
            )
        }));
    }

    let before = events.len();
    events.retain(|e| e.duration > 0.0);
    if events.len() < before {
        tracing::debug!("Dropped {} zero-length events", before - events.len());
    }

    let mut events = if options.split_overlaps {
        split_overlaps(events)
    } else {
        count_overlaps(events)
    };

    let mut rehearsal_marks = collect_rehearsal_marks(score, &offsets);
    let mut measure_ticks = offsets.ticks();
    let mut total_duration = offsets.total_duration();

    if let Some(window) = window {
        events = window.clip_events(events);
        rehearsal_marks = window.clip_marks(rehearsal_marks);
        measure_ticks = window.clip_ticks(measure_ticks);
        total_duration = window.length();
    }

    if events.is_empty() {
        return Err(TimelineError::NoNotes);
    }

    let connections = if options.show_connections {
        detect_connections(&events)
    } else {
        Vec::new()
    };

    tracing::info!(
        "Converted {} parts into {} events ({} connections, {} beats)",
        score.parts.len(),
        events.len(),
        connections.len(),
        total_duration
    );

    Ok(Timeline {
        events,
        rehearsal_marks,
        measure_ticks,
        connections,
        total_duration,
    })
}
