//! Raw event collection.
//!
//! Walks each part once, resolving every element's absolute offset through the canonical
//! measure map, and produces the per-part material the tie merger works on: pitched raw
//! events, the part's dynamics timeline, and its instrument label/family.

use std::collections::HashMap;

use crate::dynamics::DynamicsTimeline;
use crate::instruments::{classify, Ensemble};
use crate::measures::MeasureOffsetMap;
use crate::score::{Element, Part, Score, Tie, Velocity};

/// One sounding pitch before tie merging.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub pitch_midi: f64,
    pub offset: f64,
    pub duration: f64,
    pub tie: Option<Tie>,
    pub staccato: bool,
    pub velocity: Option<Velocity>,
}

/// Everything collected from one part.
#[derive(Debug, Clone)]
pub struct PartEvents {
    pub instrument_label: String,
    pub instrument_family: String,
    pub raw_events: Vec<RawEvent>,
    pub dynamics: DynamicsTimeline,
}

/// Absolute placement of one element.
struct Placed<'a> {
    offset: f64,
    element: &'a Element,
}

/// Resolve every element of a part to an absolute offset.
///
/// Measured content goes through the canonical map; when a measure number is unknown the
/// part's own native measure offset is used instead. Unmeasured content is already absolute.
fn place_elements<'a>(part: &'a Part, offsets: &MeasureOffsetMap) -> Vec<Placed<'a>> {
    let native = part.native_measure_offsets();
    let mut placed = Vec::new();

    for (measure, native_start) in part.measures.iter().zip(native) {
        let start = match offsets.offset_of(&measure.number) {
            Some(start) => start,
            None => {
                tracing::debug!(
                    "Measure {} not on canonical timeline, using native offset {}",
                    measure.number,
                    native_start
                );
                native_start
            }
        };
        placed.extend(measure.elements.iter().map(|element| Placed {
            offset: start + element.offset(),
            element,
        }));
    }

    placed.extend(part.elements.iter().map(|element| Placed {
        offset: element.offset(),
        element,
    }));

    placed
}

/// Base label for a part: instrument name, then part name, then `Instrument {n}`.
fn base_label(part: &Part, part_number: usize) -> String {
    part.instrument_name()
        .or(part.name.as_deref())
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Instrument {}", part_number))
}

/// Gives repeated labels an increasing suffix: "Flute", "Flute 2", ...
#[derive(Debug, Default)]
struct LabelCounter {
    counts: HashMap<String, usize>,
}

impl LabelCounter {
    fn disambiguate(&mut self, label: String) -> String {
        let count = self.counts.entry(label.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            label
        } else {
            format!("{} {}", label, count)
        }
    }
}

/// Collect raw events and dynamics for every part of the score.
pub fn collect_parts(
    score: &Score,
    offsets: &MeasureOffsetMap,
    ensemble: Ensemble,
) -> Vec<PartEvents> {
    let mut labels = LabelCounter::default();

    score
        .parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let base = base_label(part, index + 1);
            let (instrument_label, instrument_family) = match ensemble {
                Ensemble::Ungrouped => {
                    let label = labels.disambiguate(base);
                    (label.clone(), label)
                }
                _ => {
                    let family = classify(
                        part.program(),
                        part.instrument_name().or(part.name.as_deref()),
                        ensemble,
                    );
                    (base, family.as_str().to_string())
                }
            };

            let mut raw_events = Vec::new();
            let mut dynamics = DynamicsTimeline::new();

            for Placed { offset, element } in place_elements(part, offsets) {
                if let Element::Dynamic(dynamic) = element {
                    dynamics.push(offset, &dynamic.mark);
                    continue;
                }
                let Some(sounding) = element.sounding() else {
                    continue;
                };
                raw_events.extend(sounding.pitches.iter().map(|&pitch_midi| RawEvent {
                    pitch_midi,
                    offset,
                    duration: sounding.duration,
                    tie: sounding.tie,
                    staccato: sounding.staccato,
                    velocity: sounding.velocity,
                }));
            }

            tracing::debug!(
                "Part '{}' ({}): {} raw events, {} dynamics",
                instrument_label,
                instrument_family,
                raw_events.len(),
                dynamics.len()
            );

            PartEvents {
                instrument_label,
                instrument_family,
                raw_events,
                dynamics,
            }
        })
        .collect()
}

/// Rehearsal marks of the first part, placed on the canonical timeline.
pub fn collect_rehearsal_marks(
    score: &Score,
    offsets: &MeasureOffsetMap,
) -> Vec<crate::events::RehearsalMark> {
    let Some(part) = score.parts.first() else {
        return Vec::new();
    };

    place_elements(part, offsets)
        .into_iter()
        .filter_map(|Placed { offset, element }| match element {
            Element::Rehearsal(mark) => {
                let label = mark.label.trim();
                (!label.is_empty()).then(|| crate::events::RehearsalMark {
                    label: label.to_string(),
                    start_time: offset,
                })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(yaml: &str, ensemble: Ensemble) -> Vec<PartEvents> {
        let score = Score::from_yaml(yaml).unwrap();
        let offsets = MeasureOffsetMap::build(&score);
        collect_parts(&score, &offsets, ensemble)
    }

    #[test]
    fn test_chord_expands_per_pitch() {
        let parts = collect(
            r#"
parts:
  - name: Piano
    elements:
      - { kind: chord, offset: 1.0, pitches: [C4, E4, G4], duration: 2.0, tie: start }
      - { kind: rest, offset: 3.0, duration: 1.0 }
"#,
            Ensemble::Orchestra,
        );
        let raw = &parts[0].raw_events;
        assert_eq!(raw.len(), 3);
        assert!(raw.iter().all(|e| e.offset == 1.0 && e.duration == 2.0));
        assert!(raw.iter().all(|e| e.tie == Some(Tie::Start)));
        let pitches: Vec<f64> = raw.iter().map(|e| e.pitch_midi).collect();
        assert_eq!(pitches, vec![60.0, 64.0, 67.0]);
    }

    #[test]
    fn test_offsets_use_canonical_measures() {
        // Drums claim 6-beat bars; the canonical bar is 4 beats
        let parts = collect(
            r#"
parts:
  - name: Drum Set
    measures:
      - { number: 1, bar-duration: 6.0 }
      - number: 2
        bar-duration: 6.0
        elements:
          - { kind: note, offset: 1.0, pitch: 38, duration: 1.0 }
  - name: Flute
    measures:
      - { number: 1, bar-duration: 4.0 }
      - { number: 2, bar-duration: 4.0 }
"#,
            Ensemble::Orchestra,
        );
        assert_eq!(parts[0].raw_events[0].offset, 5.0);
    }

    #[test]
    fn test_unknown_measure_falls_back_to_native_offset() {
        // Measure "X" holds only a rehearsal mark, so it has no length and never reaches
        // the canonical map
        let score = Score::from_yaml(
            r#"
parts:
  - measures:
      - { number: 1, bar-duration: 4.0 }
      - number: X
        offset: 10.0
        elements:
          - { kind: rehearsal, offset: 0.5, label: Coda }
"#,
        )
        .unwrap();
        let offsets = MeasureOffsetMap::build(&score);
        assert_eq!(offsets.offset_of("X"), None);

        let marks = collect_rehearsal_marks(&score, &offsets);
        assert_eq!(marks[0].start_time, 10.5);
    }

    #[test]
    fn test_ungrouped_labels_are_disambiguated() {
        let parts = collect(
            r#"
parts:
  - instrument: { name: Flute }
  - instrument: { name: Flute }
  - name: "  "
  - instrument: { name: Flute }
"#,
            Ensemble::Ungrouped,
        );
        let labels: Vec<_> = parts.iter().map(|p| p.instrument_label.as_str()).collect();
        assert_eq!(labels, vec!["Flute", "Flute 2", "Instrument 3", "Flute 3"]);
        assert!(parts.iter().all(|p| p.instrument_family == p.instrument_label));
    }

    #[test]
    fn test_grouped_mode_classifies_family() {
        let parts = collect(
            r#"
parts:
  - name: Violin I
  - instrument: { program: 57 }
    name: Trumpet in Bb
  - instrument: { name: Trombone }
"#,
            Ensemble::Orchestra,
        );
        assert_eq!(parts[0].instrument_label, "Violin I");
        assert_eq!(parts[0].instrument_family, "strings");
        assert_eq!(parts[1].instrument_label, "Trumpet in Bb");
        assert_eq!(parts[1].instrument_family, "brass");
        assert_eq!(parts[2].instrument_family, "brass");
    }

    #[test]
    fn test_dynamics_collected_per_part() {
        let parts = collect(
            r#"
parts:
  - measures:
      - number: 1
        bar-duration: 4.0
        elements:
          - { kind: dynamic, offset: 0.0, mark: mf }
          - { kind: note, offset: 0.0, pitch: C4, duration: 4.0 }
      - number: 2
        bar-duration: 4.0
        elements:
          - { kind: dynamic, offset: 2.0, mark: ff }
"#,
            Ensemble::Orchestra,
        );
        let dynamics = &parts[0].dynamics;
        assert_eq!(dynamics.len(), 2);
        assert_eq!(dynamics.resolve(6.0, None).mark.as_deref(), Some("ff"));
        assert_eq!(dynamics.resolve(5.9, None).mark.as_deref(), Some("mf"));
    }

    #[test]
    fn test_rehearsal_marks_first_part_only() {
        let score = Score::from_yaml(
            r#"
parts:
  - measures:
      - { number: 1, bar-duration: 4.0 }
      - number: 2
        bar-duration: 4.0
        elements:
          - { kind: rehearsal, offset: 0.0, label: " B " }
          - { kind: rehearsal, offset: 1.0, label: "" }
  - measures:
      - { number: 1, bar-duration: 2.0 }
      - number: 2
        bar-duration: 2.0
        elements:
          - { kind: rehearsal, offset: 0.0, label: Z }
"#,
        )
        .unwrap();
        let offsets = MeasureOffsetMap::build(&score);
        let marks = collect_rehearsal_marks(&score, &offsets);
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].label, "B");
        assert_eq!(marks[0].start_time, 2.0);
    }
}
