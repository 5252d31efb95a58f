//! Connections between consecutive notes of one instrument.
//!
//! A connection links a note to the note that starts where it stops sounding. Detection uses
//! the true end (`start_time + original_duration`) so staccato and split segments still
//! connect; [`ConnectionConfig`] only decides how an edge is drawn.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use super::types::{quantize, Connection, NoteEvent, EPSILON};

/// Drawing parameters for connection lines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConnectionConfig {
    pub alpha: f64,
    pub min_alpha: f64,
    /// Gap in beats where fading begins
    pub fade_start: f64,
    /// Gap in beats where alpha bottoms out at `min_alpha`
    pub fade_end: f64,
    /// Edges with a larger visual gap are not drawn
    pub max_gap: Option<f64>,
    pub linewidth: f64,
    /// 0 draws a straight line; positive values bend upward
    pub curve_height_factor: f64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            min_alpha: 0.25,
            fade_start: 4.0,
            fade_end: 8.0,
            max_gap: None,
            linewidth: 1.0,
            curve_height_factor: 0.0,
        }
    }
}

impl ConnectionConfig {
    /// Horizontal distance between the end of `from`'s bar and the start of `to`.
    pub fn visual_gap(from: &NoteEvent, to: &NoteEvent) -> f64 {
        to.start_time - from.end_time()
    }

    pub fn should_draw(&self, gap: f64) -> bool {
        self.max_gap.map_or(true, |max| gap <= max)
    }

    /// Opacity for a line spanning `gap` beats.
    pub fn alpha_for_length(&self, gap: f64) -> f64 {
        let full = self.alpha.clamp(0.0, 1.0);
        if self.fade_end <= self.fade_start || gap <= self.fade_start {
            return full;
        }
        let t = ((gap - self.fade_start) / (self.fade_end - self.fade_start)).clamp(0.0, 1.0);
        (self.alpha * (1.0 - t)).min(1.0).max(self.min_alpha)
    }
}

/// Key identifying the underlying note of a segment: pitch and quantized true end.
fn note_key(event: &NoteEvent) -> (u64, i64) {
    (event.pitch_midi.to_bits(), quantize(event.true_end()))
}

/// Detect connections within each instrument.
///
/// Indices refer to `events`. Split segments of one note collapse to their latest segment as
/// source, while every segment of the instrument is a candidate target. Same-pitch pairs are
/// ignored and only one edge enters any onset instant of an instrument.
///
/// # Example
/// ```
/// use score_timeline::events::{detect_connections, Connection, NoteEvent};
///
/// let note = |pitch: f64, start: f64| NoteEvent {
///     pitch_midi: pitch,
///     start_time: start,
///     duration: 1.0,
///     original_duration: 1.0,
///     instrument_family: "strings".to_string(),
///     instrument_label: "Violin".to_string(),
///     dynamic_level: 0.6,
///     dynamic_mark: None,
///     pitch_overlap: 1,
/// };
///
/// let events = vec![note(60.0, 0.0), note(62.0, 1.0), note(64.0, 3.0)];
/// assert_eq!(detect_connections(&events), vec![Connection { from: 0, to: 1 }]);
/// ```
pub fn detect_connections(events: &[NoteEvent]) -> Vec<Connection> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (idx, event) in events.iter().enumerate() {
        let slot = *slots
            .entry(event.instrument_label.as_str())
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[slot].push(idx);
    }

    let mut connections = Vec::new();
    for mut group in groups {
        group.sort_by(|&a, &b| {
            events[a]
                .start_time
                .total_cmp(&events[b].start_time)
                .then_with(|| events[a].pitch_midi.total_cmp(&events[b].pitch_midi))
        });
        connect_group(events, &group, &mut connections);
    }

    tracing::debug!("Detected {} connections", connections.len());
    connections
}

fn connect_group(events: &[NoteEvent], sorted: &[usize], connections: &mut Vec<Connection>) {
    // Latest segment per underlying note is the source
    let mut tails: HashMap<(u64, i64), usize> = HashMap::new();
    for &idx in sorted {
        tails.insert(note_key(&events[idx]), idx);
    }

    let mut connected_starts: HashSet<i64> = HashSet::new();
    for &source in sorted {
        let from = &events[source];
        if tails.get(&note_key(from)) != Some(&source) {
            continue;
        }

        let end = from.true_end();
        let first = sorted.partition_point(|&c| events[c].start_time < end - EPSILON);
        for &target in &sorted[first..] {
            let to = &events[target];
            if to.start_time - end > EPSILON {
                break;
            }
            if to.pitch_midi == from.pitch_midi {
                continue;
            }
            if !connected_starts.insert(quantize(to.start_time)) {
                continue;
            }
            connections.push(Connection {
                from: source,
                to: target,
            });
            break;
        }
    }
}
