//! Canonical measure timeline shared by all parts.
//!
//! Parts with missing or duplicated time signatures (percussion and lead-sheet parts are the
//! usual suspects) report bars that are locally too long. Taking the shortest length seen
//! for each measure number keeps one bloated part from pushing every later bar late for the
//! whole ensemble.

use std::collections::HashMap;

use serde::Serialize;

use crate::score::Score;

/// Start of a measure on the canonical timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureTick {
    pub number: String,
    pub start_time: f64,
}

/// Measure number → canonical absolute start time in beats.
///
/// Numbers are kept in first-seen order; offsets are non-decreasing in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureOffsetMap {
    order: Vec<String>,
    offsets: HashMap<String, f64>,
    total_duration: f64,
}

impl MeasureOffsetMap {
    /// Build the canonical timeline for a score.
    ///
    /// When no measure anywhere carries a length the map is empty and the total falls back
    /// to the score's native duration.
    ///
    /// # Example
    /// ```
    /// use score_timeline::{MeasureOffsetMap, Score};
    ///
    /// let score = Score::from_yaml(r#"
    /// parts:
    ///   - measures: [ { number: 1, bar-duration: 4.0 }, { number: 2, bar-duration: 4.0 } ]
    ///   - measures: [ { number: 1, bar-duration: 2.0 }, { number: 2, bar-duration: 2.0 } ]
    /// "#).unwrap();
    ///
    /// let map = MeasureOffsetMap::build(&score);
    /// assert_eq!(map.offset_of("2"), Some(2.0));
    /// assert_eq!(map.total_duration(), 4.0);
    /// ```
    pub fn build(score: &Score) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut canonical: HashMap<String, f64> = HashMap::new();

        for part in &score.parts {
            for measure in &part.measures {
                let Some(length) = measure.nominal_length() else {
                    continue;
                };
                match canonical.get_mut(&measure.number) {
                    Some(shortest) => *shortest = shortest.min(length),
                    None => {
                        order.push(measure.number.clone());
                        canonical.insert(measure.number.clone(), length);
                    }
                }
            }
        }

        if order.is_empty() {
            return Self {
                total_duration: score.native_duration(),
                ..Self::default()
            };
        }

        let mut offsets = HashMap::with_capacity(order.len());
        let mut current = 0.0;
        for number in &order {
            offsets.insert(number.clone(), current);
            current += canonical[number];
        }

        tracing::debug!(
            "Canonical timeline: {} measures, {} beats",
            order.len(),
            current
        );

        Self {
            order,
            offsets,
            total_duration: current,
        }
    }

    pub fn offset_of(&self, number: &str) -> Option<f64> {
        self.offsets.get(number).copied()
    }

    /// Sum of canonical lengths (or the native score duration for an empty map).
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Measure starts in first-seen order.
    pub fn ticks(&self) -> Vec<MeasureTick> {
        self.order
            .iter()
            .map(|number| MeasureTick {
                number: number.clone(),
                start_time: self.offsets[number],
            })
            .collect()
    }
}
