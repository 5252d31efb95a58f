//! Same-pitch overlap handling.
//!
//! Two strategies:
//! - [`split_overlaps`] cuts every pitch into intervals between consecutive note boundaries
//!   and emits one segment per active note per interval, tagged with the interval's count.
//! - [`count_overlaps`] keeps notes whole and tags each with the peak number of same-pitch
//!   notes sounding during its lifetime.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::types::NoteEvent;

/// Group events by exact pitch, keeping first-seen order of pitches and of events.
fn group_by_pitch(events: Vec<NoteEvent>) -> Vec<Vec<NoteEvent>> {
    let mut slots: HashMap<u64, usize> = HashMap::new();
    let mut groups: Vec<Vec<NoteEvent>> = Vec::new();

    for event in events {
        let slot = *slots.entry(event.pitch_midi.to_bits()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(event);
    }

    groups
}

/// Output order: start time, then pitch, then instrument label.
pub(crate) fn sort_events(events: &mut [NoteEvent]) {
    events.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then_with(|| a.pitch_midi.total_cmp(&b.pitch_midi))
            .then_with(|| a.instrument_label.cmp(&b.instrument_label))
    });
}

/// Split same-pitch notes into non-overlapping segments.
///
/// Within one interval `[b0, b1)` every active note yields a segment covering the whole
/// interval; its `original_duration` still reaches the note's true end, so a cut segment
/// keeps touching whatever follows the note.
///
/// # Example
/// A flute holding C4 for two beats while a clarinet plays C4 for one:
/// ```text
/// flute    [0, 2)  ->  [0, 1) overlap 2,  [1, 2) overlap 1
/// clarinet [0, 1)  ->  [0, 1) overlap 2
/// ```
pub fn split_overlaps(events: Vec<NoteEvent>) -> Vec<NoteEvent> {
    let mut segments = Vec::with_capacity(events.len());

    for group in group_by_pitch(events) {
        let mut boundaries: Vec<f64> = group
            .iter()
            .flat_map(|e| [e.start_time, e.end_time()])
            .collect();
        boundaries.sort_by(f64::total_cmp);
        boundaries.dedup();

        for window in boundaries.windows(2) {
            let (b0, b1) = (window[0], window[1]);
            let active: Vec<&NoteEvent> = group
                .iter()
                .filter(|e| e.start_time < b1 && e.end_time() > b0)
                .collect();
            let count = active.len() as u32;

            segments.extend(active.into_iter().map(|event| NoteEvent {
                start_time: b0,
                duration: b1 - b0,
                original_duration: event.true_end() - b0,
                pitch_overlap: count,
                ..event.clone()
            }));
        }
    }

    sort_events(&mut segments);
    segments
}

/// Tag whole notes with their peak same-pitch overlap, without cutting them.
pub fn count_overlaps(mut events: Vec<NoteEvent>) -> Vec<NoteEvent> {
    let mut by_pitch: HashMap<u64, Vec<usize>> = HashMap::new();
    for (idx, event) in events.iter().enumerate() {
        by_pitch
            .entry(event.pitch_midi.to_bits())
            .or_default()
            .push(idx);
    }

    let mut counts = vec![1u32; events.len()];
    for indices in by_pitch.values_mut() {
        indices.sort_by(|&a, &b| match events[a].start_time.total_cmp(&events[b].start_time) {
            Ordering::Equal => a.cmp(&b),
            other => other,
        });

        let mut active: Vec<(usize, f64)> = Vec::new();
        for &idx in indices.iter() {
            let start = events[idx].start_time;
            active.retain(|&(_, end)| end > start);

            let current = active.len() as u32 + 1;
            counts[idx] = counts[idx].max(current);
            for &(other, _) in &active {
                counts[other] = counts[other].max(current);
            }
            active.push((idx, events[idx].end_time()));
        }
    }

    for (event, count) in events.iter_mut().zip(counts) {
        event.pitch_overlap = count;
    }
    sort_events(&mut events);
    events
}
