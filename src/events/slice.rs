//! Slice windows: restrict a timeline to `[start, end)` and re-base it to zero.

use serde::Serialize;

use crate::error::TimelineError;
use crate::measures::{MeasureOffsetMap, MeasureTick};

use super::types::{NoteEvent, RehearsalMark, EPSILON};

/// Absolute window in beats, start-inclusive and end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliceWindow {
    start: f64,
    end: f64,
}

impl SliceWindow {
    /// Create a window, rejecting empty, inverted or non-finite bounds.
    ///
    /// # Example
    /// ```
    /// use score_timeline::events::SliceWindow;
    ///
    /// let window = SliceWindow::new(1.0, 3.0).unwrap();
    /// assert_eq!(window.length(), 2.0);
    /// assert!(SliceWindow::new(3.0, 3.0).is_err());
    /// ```
    pub fn new(start: f64, end: f64) -> Result<Self, TimelineError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(TimelineError::InvalidSlice(format!(
                "bounds must be finite, got {} and {}",
                start, end
            )));
        }
        if end <= start {
            return Err(TimelineError::InvalidSlice(format!(
                "end ({}) must be greater than start ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` falls in the window, with both edges widened or narrowed by
    /// [`EPSILON`] so accumulated drift cannot move an instant across a boundary.
    pub fn contains(&self, time: f64) -> bool {
        time > self.start - EPSILON && time < self.end - EPSILON
    }

    fn rebase(&self, time: f64) -> f64 {
        (time - self.start).max(0.0)
    }

    /// Drop events outside the window, clip the rest to it and re-base to zero.
    ///
    /// Events overlapping the window by no more than [`EPSILON`] are dropped. A clipped
    /// event's `original_duration` still reaches its true end, which may lie past the window.
    pub fn clip_events(&self, events: Vec<NoteEvent>) -> Vec<NoteEvent> {
        events
            .into_iter()
            .filter(|e| e.start_time < self.end - EPSILON && e.end_time() > self.start + EPSILON)
            .map(|event| {
                let clipped_start = event.start_time.max(self.start);
                let clipped_end = event.end_time().min(self.end);
                NoteEvent {
                    start_time: clipped_start - self.start,
                    duration: clipped_end - clipped_start,
                    original_duration: event.true_end() - clipped_start,
                    ..event
                }
            })
            .collect()
    }

    pub fn clip_ticks(&self, ticks: Vec<MeasureTick>) -> Vec<MeasureTick> {
        ticks
            .into_iter()
            .filter(|t| self.contains(t.start_time))
            .map(|t| MeasureTick {
                start_time: self.rebase(t.start_time),
                ..t
            })
            .collect()
    }

    pub fn clip_marks(&self, marks: Vec<RehearsalMark>) -> Vec<RehearsalMark> {
        marks
            .into_iter()
            .filter(|m| self.contains(m.start_time))
            .map(|m| RehearsalMark {
                start_time: self.rebase(m.start_time),
                ..m
            })
            .collect()
    }
}

/// A user-facing slice, resolved against the canonical measure map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliceRange {
    /// Bar numbers, start-inclusive and end-exclusive
    Bars { start: u32, end: u32 },
    /// 1-indexed beats, start-inclusive and end-exclusive
    Beats { start: f64, end: f64 },
}

impl SliceRange {
    /// Check bounds that can be judged without a score.
    pub fn validate(&self) -> Result<(), TimelineError> {
        match *self {
            SliceRange::Bars { start, end } if end <= start => Err(TimelineError::InvalidSlice(
                format!("end bar ({}) must be greater than start bar ({})", end, start),
            )),
            SliceRange::Beats { start, end } => {
                SliceWindow::new(start - 1.0, end - 1.0).map(|_| ())
            }
            _ => Ok(()),
        }
    }

    /// Translate into an absolute window.
    ///
    /// An unknown start bar is an error; an end bar past the last measure resolves to the
    /// end of the score.
    pub fn resolve(&self, offsets: &MeasureOffsetMap) -> Result<SliceWindow, TimelineError> {
        match *self {
            SliceRange::Bars { start, end } => {
                let window_start = offsets.offset_of(&start.to_string()).ok_or_else(|| {
                    TimelineError::InvalidSlice(format!("bar {} not found in score", start))
                })?;
                let window_end = offsets
                    .offset_of(&end.to_string())
                    .unwrap_or_else(|| offsets.total_duration());
                SliceWindow::new(window_start, window_end)
            }
            SliceRange::Beats { start, end } => SliceWindow::new(start - 1.0, end - 1.0),
        }
    }
}
