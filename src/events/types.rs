//! Event type definitions
//!
//! This module defines the flat output units of the pipeline.

use serde::Serialize;

/// Tolerance, in beats, for every "same instant" comparison.
pub const EPSILON: f64 = 0.001;

/// Quantize a beat position onto the [`EPSILON`] grid.
pub(crate) fn quantize(beats: f64) -> i64 {
    (beats / EPSILON).round() as i64
}

/// One plotted note (or one split segment of a note).
///
/// # Fields
/// - `duration`: rendered length, possibly staccato-shortened or clipped by splitting/slicing
/// - `original_duration`: distance from `start_time` to the note's true sounding end
/// - `instrument_family`: family tag when grouped, the instrument label when ungrouped
/// - `dynamic_level`: loudness in `[0.2, 1.2]`
/// - `pitch_overlap`: number of same-pitch events sounding over this span (at least 1)
///
/// `duration <= original_duration` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub pitch_midi: f64,
    pub start_time: f64,
    pub duration: f64,
    pub original_duration: f64,
    pub instrument_family: String,
    pub instrument_label: String,
    pub dynamic_level: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_mark: Option<String>,
    pub pitch_overlap: u32,
}

impl NoteEvent {
    /// End of the rendered bar.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// End of the sounding note, ignoring staccato and clipping.
    pub fn true_end(&self) -> f64 {
        self.start_time + self.original_duration
    }
}

/// Labeled landmark on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalMark {
    pub label: String,
    pub start_time: f64,
}

/// Edge between two events of the same instrument: `from` ends where `to` starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
}
