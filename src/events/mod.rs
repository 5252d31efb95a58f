//! # Events Module
//!
//! Turn collected per-part material into the flat, plot-ready event list.
//!
//! ## Stages
//! 1. **Tie merging** (`ties`) - fold start/stop chains of one pitch into one logical note and
//!    resolve its loudness at the chain start
//! 2. **Staccato** (`staccato`) - shorten the rendered length of staccato notes, keeping the
//!    true length in `original_duration`
//! 3. **Overlap** (`overlap`) - split same-pitch notes into counted segments, or tag whole
//!    notes with their peak overlap
//! 4. **Slice** (`slice`) - optionally clip everything to a window and re-base it to zero
//! 5. **Connections** (`connections`) - side channel linking notes that abut within one
//!    instrument
//!
//! ## Key Types
//! - [`NoteEvent`] - one plotted note or segment
//! - [`RehearsalMark`] - labeled landmark
//! - [`Connection`] - `(from, to)` indices into the event list
//! - [`SliceWindow`] / [`SliceRange`] - absolute and user-facing windows
//! - [`ConnectionConfig`] - how connection lines are drawn
//!
//! ## Duration vs Original Duration
//!
//! Every event carries two lengths:
//!
//! ### Duration
//! - What gets drawn
//! - Shortened by staccato, cut by overlap splitting and slicing
//!
//! ### Original Duration
//! - Distance from the event's start to the note's true sounding end
//! - Never shortened, so a staccato note or the first segment of a split note still reaches
//!   the next note
//!
//! `duration <= original_duration` holds for every event.
//!
//! ## Numeric Tolerance
//!
//! Beat positions accumulate through measure offsets, tie sums and clipping. Comparisons of
//! "the same instant" use [`EPSILON`] (0.001 beats) instead of exact equality.
//!
//! ## Related Modules
//! - `collect` - produces the raw per-part input
//! - `api` - wires the stages together

mod connections;
mod overlap;
mod slice;
mod staccato;
mod ties;
mod types;


pub use connections::{detect_connections, ConnectionConfig};
pub use overlap::{count_overlaps, split_overlaps};
pub use slice::{SliceRange, SliceWindow};
pub use staccato::{
    clamp_staccato_factor, to_note_event, DEFAULT_STACCATO_FACTOR, MAX_STACCATO_FACTOR,
    MIN_STACCATO_FACTOR,
};
pub use ties::{merge_ties, MergedNote};
pub use types::{Connection, NoteEvent, RehearsalMark, EPSILON};
