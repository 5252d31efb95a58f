//! Tie merging.
//!
//! Each pitch of a part runs its own small state machine over the part's raw events in
//! offset order:
//!
//! ```text
//! Idle --start--> Accumulating --stop--> Idle (chain closed)
//!                 Accumulating --start--> Accumulating (previous chain closed as is)
//! Idle --stop--> Idle (orphaned stop, emitted as an ordinary note)
//! ```
//!
//! Untied events never touch the state; they are emitted as they come.

use std::collections::HashMap;

use crate::collect::{PartEvents, RawEvent};
use crate::dynamics::ResolvedDynamic;
use crate::score::Tie;

/// A logical note after tie merging, before staccato and overlap handling.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedNote {
    pub pitch_midi: f64,
    pub start: f64,
    /// Summed length of the tie chain
    pub duration: f64,
    pub dynamic: ResolvedDynamic,
    pub staccato: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ChainState {
    Idle,
    /// Chain open; the index points at its note in the output
    Accumulating { index: usize },
}

/// Fold tie chains of one part into single notes.
///
/// Loudness and staccato come from the element that opens the chain.
pub fn merge_ties(part: &PartEvents) -> Vec<MergedNote> {
    let mut raw: Vec<&RawEvent> = part.raw_events.iter().collect();
    // Stable, so simultaneous events keep their source order
    raw.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    let mut states: HashMap<u64, ChainState> = HashMap::new();
    let mut merged: Vec<MergedNote> = Vec::with_capacity(raw.len());

    for event in raw {
        let state = states
            .entry(event.pitch_midi.to_bits())
            .or_insert(ChainState::Idle);

        match (event.tie, *state) {
            (Some(Tie::Start), current) => {
                if let ChainState::Accumulating { index } = current {
                    tracing::debug!(
                        "Tie chain on pitch {} at {} restarted before a stop",
                        event.pitch_midi,
                        merged[index].start
                    );
                }
                *state = ChainState::Accumulating {
                    index: merged.len(),
                };
                merged.push(note_from(part, event));
            }
            (Some(Tie::Stop), ChainState::Accumulating { index }) => {
                merged[index].duration += event.duration;
                *state = ChainState::Idle;
            }
            (Some(Tie::Stop), ChainState::Idle) => {
                tracing::debug!(
                    "Orphaned tie stop on pitch {} at {}",
                    event.pitch_midi,
                    event.offset
                );
                merged.push(note_from(part, event));
            }
            (None, _) => merged.push(note_from(part, event)),
        }
    }

    merged
}

fn note_from(part: &PartEvents, event: &RawEvent) -> MergedNote {
    MergedNote {
        pitch_midi: event.pitch_midi,
        start: event.offset,
        duration: event.duration,
        dynamic: part.dynamics.resolve(event.offset, event.velocity),
        staccato: event.staccato,
    }
}
