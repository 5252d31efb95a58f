//! # Error Types
//!
//! This module defines all error types for the timeline pipeline.
//!
//! Most malformed input is recovered locally (orphaned tie stops become ordinary notes,
//! unknown measures fall back to native offsets, out-of-range staccato factors are
//! clamped). Only the conditions below ever reach the caller.
//!
//! ## Error Types
//! - `NoNotes` - nothing pitched survived collection or slicing
//! - `InvalidSlice` - slice bounds rejected before clipping
//! - `ScoreError` - the score description could not be deserialized
//! - `ConfigError` - conversion options could not be deserialized or named an unknown value
//!
//! ## Usage
//! ```rust
//! use score_timeline::{convert, ConversionOptions, Score, TimelineError};
//!
//! let score = Score::from_yaml("parts: []").unwrap();
//! match convert(&score, &ConversionOptions::default()) {
//!     Ok(timeline) => println!("{} events", timeline.events.len()),
//!     Err(TimelineError::NoNotes) => eprintln!("nothing to plot"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelineError {
    /// No pitched events survived collection (or the slice window).
    ///
    /// # Example
    /// ```
    /// # use score_timeline::TimelineError;
    /// assert_eq!(TimelineError::NoNotes.to_string(), "No notes found in score");
    /// ```
    #[error("No notes found in score")]
    NoNotes,

    /// Slice bounds were rejected at construction time.
    ///
    /// # Example
    /// ```
    /// # use score_timeline::TimelineError;
    /// let err = TimelineError::InvalidSlice("end (2) must be greater than start (3)".to_string());
    /// assert_eq!(err.to_string(), "Invalid slice: end (2) must be greater than start (3)");
    /// ```
    #[error("Invalid slice: {0}")]
    InvalidSlice(String),

    /// Score description could not be read.
    #[error("Invalid score: {0}")]
    ScoreError(String),

    /// Conversion options could not be read.
    #[error("Invalid options: {0}")]
    ConfigError(String),
}
