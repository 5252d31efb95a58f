//! Integration tests for the score timeline pipeline
//!
//! Tests full conversion from a YAML score description to the flat event timeline.

use approx::assert_abs_diff_eq;
use score_timeline::events::SliceRange;
use score_timeline::{
    convert, detect_ensembles, ConversionOptions, Ensemble, Score, Timeline, TimelineError,
};

fn run(source: &str, options: &ConversionOptions) -> Result<Timeline, TimelineError> {
    let score = Score::from_yaml(source)?;
    convert(&score, options)
}

fn run_default(source: &str) -> Timeline {
    run(source, &ConversionOptions::default()).unwrap()
}

const THREE_NOTES: &str = r#"
parts:
  - name: Violin
    elements:
      - { kind: note, offset: 0.0, pitch: C4, duration: 1.0 }
      - { kind: note, offset: 1.0, pitch: D4, duration: 1.0 }
      - { kind: note, offset: 2.0, pitch: E4, duration: 1.0 }
"#;

#[test]
fn test_staccato_note_default_factor() {
    let timeline = run_default(
        r#"
parts:
  - instrument: { name: Flute }
    elements:
      - { kind: note, offset: 0.0, pitch: C4, duration: 1.0, articulations: [staccato] }
"#,
    );
    assert_eq!(timeline.events.len(), 1);
    assert_abs_diff_eq!(timeline.events[0].duration, 0.4, epsilon = 1e-9);
    assert_eq!(timeline.events[0].original_duration, 1.0);
}

#[test]
fn test_two_parts_same_pitch_overlap() {
    let timeline = run_default(
        r#"
parts:
  - name: Flute
    elements:
      - { kind: note, offset: 0.0, pitch: 60, duration: 1.0 }
  - name: Oboe
    elements:
      - { kind: note, offset: 0.0, pitch: 60, duration: 1.0 }
"#,
    );
    assert_eq!(timeline.events.len(), 2);
    assert!(timeline.events.iter().all(|e| e.pitch_overlap == 2));
}

#[test]
fn test_tie_across_measures() {
    let timeline = run_default(
        r#"
parts:
  - name: Flute
    measures:
      - number: 1
        bar-duration: 2.0
        elements:
          - { kind: note, offset: 0.0, pitch: A4, duration: 2.0, tie: start }
      - number: 2
        bar-duration: 1.0
        elements:
          - { kind: note, offset: 0.0, pitch: A4, duration: 1.0, tie: stop }
"#,
    );
    assert_eq!(timeline.events.len(), 1);
    assert_eq!(timeline.events[0].pitch_midi, 69.0);
    assert_eq!(timeline.events[0].start_time, 0.0);
    assert_eq!(timeline.events[0].duration, 3.0);
}

#[test]
fn test_tied_chord_merges_every_pitch() {
    let timeline = run_default(
        r#"
parts:
  - name: Piano
    measures:
      - number: 1
        bar-duration: 4.0
        elements:
          - { kind: chord, offset: 2.0, pitches: [C4, E4, G4], duration: 2.0, tie: start }
      - number: 2
        bar-duration: 4.0
        elements:
          - { kind: chord, offset: 0.0, pitches: [C4, E4, G4], duration: 2.0, tie: stop }
"#,
    );
    assert_eq!(timeline.events.len(), 3);
    assert!(timeline
        .events
        .iter()
        .all(|e| e.start_time == 2.0 && e.duration == 4.0));
}

#[test]
fn test_slice_window_in_beats() {
    let options = ConversionOptions::default()
        .with_slice(SliceRange::Beats { start: 2.0, end: 4.0 })
        .unwrap();
    let timeline = run(THREE_NOTES, &options).unwrap();
    let starts: Vec<f64> = timeline.events.iter().map(|e| e.start_time).collect();
    let pitches: Vec<f64> = timeline.events.iter().map(|e| e.pitch_midi).collect();
    assert_eq!(starts, vec![0.0, 1.0]);
    assert_eq!(pitches, vec![62.0, 64.0]);
    assert_eq!(timeline.total_duration, 2.0);
}

#[test]
fn test_beat_slice_is_one_indexed() {
    let source = "slice-unit: beat\nslice-start: 2\nslice-end: 3";
    let options = ConversionOptions::from_yaml(source).unwrap();
    let timeline = run(THREE_NOTES, &options).unwrap();
    assert_eq!(timeline.events.len(), 1);
    assert_eq!(timeline.events[0].pitch_midi, 62.0);
    assert_eq!(timeline.events[0].start_time, 0.0);
    assert_eq!(timeline.events[0].duration, 1.0);
}

#[test]
fn test_empty_score_has_no_notes() {
    let result = run(
        r#"
parts:
  - name: Flute
    measures:
      - number: 1
        bar-duration: 4.0
        elements:
          - { kind: rest, offset: 0.0, duration: 4.0 }
"#,
        &ConversionOptions::default(),
    );
    assert!(matches!(result, Err(TimelineError::NoNotes)));

    let result = run("parts: []", &ConversionOptions::default());
    assert!(matches!(result, Err(TimelineError::NoNotes)));
}

#[test]
fn test_slice_without_notes_has_no_notes() {
    let options = ConversionOptions::default()
        .with_slice(SliceRange::Beats { start: 10.0, end: 12.0 })
        .unwrap();
    assert!(matches!(run(THREE_NOTES, &options), Err(TimelineError::NoNotes)));
}

#[test]
fn test_conversion_is_deterministic() {
    let source = r#"
parts:
  - name: Flute
    elements:
      - { kind: note, offset: 0.0, pitch: 60, duration: 2.0 }
      - { kind: note, offset: 0.5, pitch: 60, duration: 1.0, articulations: [staccato] }
      - { kind: chord, offset: 1.0, pitches: [64, 67], duration: 1.0 }
  - name: Flute
    elements:
      - { kind: note, offset: 1.0, pitch: 60, duration: 2.0 }
      - { kind: dynamic, offset: 0.0, mark: ff }
"#;
    let options = ConversionOptions {
        show_connections: true,
        ..ConversionOptions::default()
    };
    let first = run(source, &options).unwrap();
    let second = run(source, &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_yaml::to_string(&first).unwrap(),
        serde_yaml::to_string(&second).unwrap()
    );
}

#[test]
fn test_duration_never_exceeds_original() {
    let timeline = run_default(
        r#"
parts:
  - name: Violin
    elements:
      - { kind: note, offset: 0.0, pitch: 60, duration: 3.0 }
      - { kind: note, offset: 1.0, pitch: 60, duration: 1.0, articulations: [staccato] }
      - { kind: note, offset: 1.5, pitch: 60, duration: 2.5 }
      - { kind: note, offset: 0.3, pitch: 62, duration: 0.7 }
"#,
    );
    for event in &timeline.events {
        assert!(event.duration > 0.0);
        assert!(event.duration <= event.original_duration);
    }
}

#[test]
fn test_split_and_legacy_overlap_modes() {
    let source = r#"
parts:
  - instrument: { name: Flute }
    elements:
      - { kind: note, offset: 0.0, pitch: 60, duration: 2.0 }
  - instrument: { name: Clarinet }
    elements:
      - { kind: note, offset: 0.0, pitch: 60, duration: 1.0 }
"#;
    let split = run_default(source);
    let flute: Vec<_> = split
        .events
        .iter()
        .filter(|e| e.instrument_label == "Flute")
        .map(|e| (e.start_time, e.duration, e.pitch_overlap))
        .collect();
    assert_eq!(flute, vec![(0.0, 1.0, 2), (1.0, 1.0, 1)]);

    let legacy = run(
        source,
        &ConversionOptions {
            split_overlaps: false,
            ..ConversionOptions::default()
        },
    )
    .unwrap();
    assert_eq!(legacy.events.len(), 2);
    assert!(legacy.events.iter().all(|e| e.pitch_overlap == 2));
    let flute = legacy
        .events
        .iter()
        .find(|e| e.instrument_label == "Flute")
        .unwrap();
    assert_eq!(flute.duration, 2.0);
}

#[test]
fn test_percussion_aligns_with_other_parts() {
    // The timpani part claims 6-beat bars; everyone else plays 4/4
    let timeline = run(
        r#"
parts:
  - name: Flute
    measures:
      - { number: 1, bar-duration: 4.0 }
      - { number: 2, bar-duration: 4.0 }
      - number: 3
        bar-duration: 4.0
        elements:
          - { kind: note, offset: 0.0, pitch: 72, duration: 4.0 }
  - name: Timpani
    measures:
      - { number: 1, bar-duration: 6.0 }
      - { number: 2, bar-duration: 6.0 }
      - number: 3
        bar-duration: 6.0
        elements:
          - { kind: note, offset: 0.0, pitch: 43, duration: 1.0 }
"#,
        &ConversionOptions::from_yaml("ensemble: orchestra").unwrap(),
    )
    .unwrap();
    let timpani = timeline
        .events
        .iter()
        .find(|e| e.instrument_label == "Timpani")
        .unwrap();
    assert_eq!(timpani.start_time, 8.0);
    assert_eq!(timpani.instrument_family, "percussion");
    assert_eq!(timeline.total_duration, 12.0);
}

#[test]
fn test_rehearsal_marks_on_canonical_timeline() {
    let timeline = run_default(
        r#"
parts:
  - name: Flute
    measures:
      - number: 1
        bar-duration: 2.0
        elements:
          - { kind: rehearsal, offset: 0.0, label: A }
          - { kind: note, offset: 0.0, pitch: 60, duration: 2.0 }
      - number: 2
        bar-duration: 2.0
        elements:
          - { kind: rehearsal, offset: 0.0, label: " B " }
  - name: Drums
    measures:
      - { number: 1, bar-duration: 3.0 }
      - { number: 2, bar-duration: 3.0 }
"#,
    );
    let marks: Vec<_> = timeline
        .rehearsal_marks
        .iter()
        .map(|m| (m.label.as_str(), m.start_time))
        .collect();
    assert_eq!(marks, vec![("A", 0.0), ("B", 2.0)]);
}

#[test]
fn test_bar_slice_is_end_exclusive() {
    let source = r#"
parts:
  - name: Violin
    measures:
      - number: 1
        elements: [ { kind: note, offset: 0.0, pitch: C4, duration: 1.0 } ]
      - number: 2
        elements: [ { kind: note, offset: 0.0, pitch: C4, duration: 1.0 } ]
      - number: 3
        elements: [ { kind: note, offset: 0.0, pitch: C4, duration: 1.0 } ]
      - number: 4
        elements: [ { kind: note, offset: 0.0, pitch: C4, duration: 1.0 } ]
"#;
    let options = ConversionOptions::from_yaml("slice-start: 2\nslice-end: 4").unwrap();
    let timeline = run(source, &options).unwrap();

    let ticks: Vec<_> = timeline
        .measure_ticks
        .iter()
        .map(|t| (t.number.as_str(), t.start_time))
        .collect();
    assert_eq!(ticks, vec![("2", 0.0), ("3", 1.0)]);
    let starts: Vec<f64> = timeline.events.iter().map(|e| e.start_time).collect();
    assert_eq!(starts, vec![0.0, 1.0]);
}

#[test]
fn test_bar_slice_ignores_tie_drift_at_boundary() {
    // 0.1 + 0.2 overshoots the 0.3 bar line by float drift only
    let source = r#"
parts:
  - name: Violin
    measures:
      - number: 1
        bar-duration: 0.3
        elements:
          - { kind: note, offset: 0.0, pitch: C4, duration: 0.1, tie: start }
          - { kind: note, offset: 0.1, pitch: C4, duration: 0.2, tie: stop }
      - number: 2
        bar-duration: 1.0
        elements: [ { kind: note, offset: 0.0, pitch: E4, duration: 1.0 } ]
"#;
    let options = ConversionOptions::from_yaml("slice-start: 2\nslice-end: 3").unwrap();
    let timeline = run(source, &options).unwrap();
    assert_eq!(timeline.events.len(), 1);
    assert_eq!(timeline.events[0].pitch_midi, 64.0);
    assert_eq!(timeline.events[0].start_time, 0.0);
}

#[test]
fn test_unknown_start_bar_is_invalid_slice() {
    let options = ConversionOptions::from_yaml("slice-start: 7\nslice-end: 9").unwrap();
    let result = run(
        r#"
parts:
  - measures:
      - number: 1
        bar-duration: 4.0
        elements: [ { kind: note, offset: 0.0, pitch: C4, duration: 1.0 } ]
"#,
        &options,
    );
    assert!(matches!(result, Err(TimelineError::InvalidSlice(_))));
}

#[test]
fn test_connections_follow_melody() {
    let source = r#"
parts:
  - name: Violin
    elements:
      - { kind: note, offset: 0.0, pitch: C4, duration: 1.0, articulations: [staccato] }
      - { kind: note, offset: 1.0, pitch: D4, duration: 1.0 }
      - { kind: note, offset: 3.0, pitch: E4, duration: 1.0 }
"#;
    let timeline = run_default(source);
    assert!(timeline.connections.is_empty());

    let options = ConversionOptions::from_yaml("show-connections: true").unwrap();
    let timeline = run(source, &options).unwrap();
    assert_eq!(timeline.connections.len(), 1);
    let connection = timeline.connections[0];
    assert_eq!(timeline.events[connection.from].pitch_midi, 60.0);
    assert_eq!(timeline.events[connection.to].pitch_midi, 62.0);
}

#[test]
fn test_connection_reaches_repeated_pitch_onset() {
    let options = ConversionOptions::from_yaml("show-connections: true").unwrap();
    let timeline = run(
        r#"
parts:
  - name: Violin
    elements:
      - { kind: note, offset: 0.0, pitch: D4, duration: 2.0 }
      - { kind: note, offset: 0.0, pitch: C4, duration: 4.0 }
      - { kind: note, offset: 2.0, pitch: C4, duration: 2.0 }
"#,
        &options,
    )
    .unwrap();
    assert_eq!(timeline.connections.len(), 1);
    let connection = timeline.connections[0];
    assert_eq!(timeline.events[connection.from].pitch_midi, 62.0);
    assert_eq!(timeline.events[connection.to].pitch_midi, 60.0);
    assert_eq!(timeline.events[connection.to].start_time, 2.0);
}

#[test]
fn test_split_note_connects_once() {
    // The long C4 is split by the second C4; only its last segment connects to D4
    let options = ConversionOptions::from_yaml("show-connections: true").unwrap();
    let timeline = run(
        r#"
parts:
  - name: Violin
    elements:
      - { kind: note, offset: 0.0, pitch: C4, duration: 3.0 }
      - { kind: note, offset: 1.0, pitch: C4, duration: 1.0 }
      - { kind: note, offset: 3.0, pitch: D4, duration: 1.0 }
"#,
        &options,
    )
    .unwrap();
    assert_eq!(timeline.connections.len(), 1);
    let from = &timeline.events[timeline.connections[0].from];
    assert_eq!(from.start_time, 2.0);
    assert_eq!(from.pitch_midi, 60.0);
    assert_eq!(timeline.events[timeline.connections[0].to].pitch_midi, 62.0);
}

#[test]
fn test_dynamics_and_velocity() {
    let timeline = run_default(
        r#"
parts:
  - name: Violin
    measures:
      - number: 1
        bar-duration: 4.0
        elements:
          - { kind: note, offset: 0.0, pitch: C4, duration: 1.0 }
          - { kind: dynamic, offset: 1.0, mark: pp }
          - { kind: note, offset: 1.0, pitch: D4, duration: 1.0 }
          - { kind: note, offset: 2.0, pitch: E4, duration: 1.0, velocity-scalar: 1.0 }
"#,
    );
    let levels: Vec<_> = timeline
        .events
        .iter()
        .map(|e| (e.dynamic_level, e.dynamic_mark.as_deref()))
        .collect();
    assert_eq!(
        levels,
        vec![(0.6, None), (0.3, Some("pp")), (1.2, Some("pp"))]
    );
}

#[test]
fn test_ungrouped_labels_are_families() {
    let timeline = run_default(
        r#"
parts:
  - instrument: { name: Flute }
    elements: [ { kind: note, offset: 0.0, pitch: 72, duration: 1.0 } ]
  - instrument: { name: Flute }
    elements: [ { kind: note, offset: 0.0, pitch: 74, duration: 1.0 } ]
"#,
    );
    let labels: Vec<_> = timeline
        .events
        .iter()
        .map(|e| (e.instrument_label.as_str(), e.instrument_family.as_str()))
        .collect();
    assert_eq!(labels, vec![("Flute", "Flute"), ("Flute 2", "Flute 2")]);
}

#[test]
fn test_ensemble_ranking() {
    let score = Score::from_yaml(
        r#"
parts:
  - { name: Violin I }
  - { name: Violin II }
  - { name: Viola }
  - { name: Cello }
  - { name: Contrabass }
  - { name: Flute }
  - { name: Oboe }
  - { name: Horn in F }
  - { name: Trumpet }
  - { name: Timpani }
"#,
    )
    .unwrap();
    let ranking = detect_ensembles(&score);
    let order: Vec<_> = ranking.iter().map(|s| s.ensemble).collect();
    assert_eq!(
        order,
        vec![Ensemble::Orchestra, Ensemble::Bigband, Ensemble::Ungrouped]
    );
    assert!(ranking[0].confidence > ranking[1].confidence);
    assert_eq!(ranking[2].confidence, 0.0);
}

#[test]
fn test_timeline_serializes() {
    let timeline = run_default(THREE_NOTES);
    let yaml = serde_yaml::to_string(&timeline).unwrap();
    assert!(yaml.contains("pitchMidi: 60.0"));
    assert!(yaml.contains("totalDuration"));
    assert!(!yaml.contains("dynamicMark"));
}
