//! # Score Model
//!
//! This module defines the hierarchical score handed to the pipeline by a score provider.
//!
//! ## Type Hierarchy
//! ```text
//! Score
//!   ├── title, duration (native total, optional)
//!   └── Vec<Part>
//!         ├── id, name
//!         ├── instrument: Option<Instrument> (program 1-128, name)
//!         ├── Vec<Measure>
//!         │     ├── number: String (displayed number, may repeat across parts)
//!         │     ├── bar_duration / duration (nominal length)
//!         │     ├── offset (native offset inside the part)
//!         │     └── Vec<Element>
//!         └── Vec<Element> (unmeasured content, absolute offsets)
//!
//! Element (enum, tagged by `kind`)
//!   ├── Note      { offset, pitch, duration, tie, articulations, velocity }
//!   ├── Chord     { offset, pitches, duration, tie, articulations, velocity }
//!   ├── Rest      { offset, duration }
//!   ├── Dynamic   { offset, mark }
//!   └── Rehearsal { offset, label }
//! ```
//!
//! ## Offsets
//! Element offsets inside a measure are local to that measure. The pipeline never trusts
//! the per-part measure layout for absolute time; it looks the measure number up in the
//! canonical [`MeasureOffsetMap`](crate::measures::MeasureOffsetMap) and only falls back to
//! the part's own [`Part::native_measure_offsets`] when the number is unknown.
//!
//! ## Pitches
//! Pitches are MIDI numbers or scientific pitch names: `C4` = 60, `F#3` = 54, `Bb2` = 46.
//!
//! ## Loading
//! ```rust
//! use score_timeline::Score;
//!
//! let score = Score::from_yaml(r#"
//! parts:
//!   - name: Flute
//!     measures:
//!       - number: 1
//!         bar-duration: 4.0
//!         elements:
//!           - { kind: note, offset: 0.0, pitch: C4, duration: 1.0 }
//!           - { kind: rest, offset: 1.0, duration: 3.0 }
//! "#).unwrap();
//! assert_eq!(score.parts[0].measures[0].number, "1");
//! ```

use serde::{Deserialize, Deserializer};

use crate::error::TimelineError;

/// A parsed multi-part score.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Score {
    #[serde(default)]
    pub title: Option<String>,
    /// Provider's own total duration in beats
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Score {
    /// Deserialize a score description from YAML.
    pub fn from_yaml(source: &str) -> Result<Self, TimelineError> {
        serde_yaml::from_str(source).map_err(|e| TimelineError::ScoreError(e.to_string()))
    }

    /// Total duration according to the provider, used when no measure carries a length.
    pub fn native_duration(&self) -> f64 {
        if let Some(duration) = self.duration {
            return duration;
        }
        self.parts
            .iter()
            .map(Part::native_duration)
            .fold(0.0, f64::max)
    }
}

/// Declared instrument metadata for a part.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Instrument {
    /// General MIDI program, 1-based
    #[serde(default)]
    pub program: Option<u8>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One staff/player of the score.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Part {
    #[serde(default)]
    pub id: Option<String>,
    /// Part name as printed on the score
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instrument: Option<Instrument>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    /// Content not placed in any measure; offsets are absolute
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Part {
    pub fn program(&self) -> Option<u8> {
        self.instrument.as_ref().and_then(|i| i.program)
    }

    pub fn instrument_name(&self) -> Option<&str> {
        self.instrument
            .as_ref()
            .and_then(|i| i.name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }

    /// Native start of each measure within this part, in measure order.
    ///
    /// Uses the measure's own `offset` when present, otherwise the running sum of the
    /// preceding nominal lengths.
    pub fn native_measure_offsets(&self) -> Vec<f64> {
        let mut offsets = Vec::with_capacity(self.measures.len());
        let mut running = 0.0;
        for measure in &self.measures {
            let start = measure.offset.unwrap_or(running);
            offsets.push(start);
            running = start + measure.nominal_length().unwrap_or(0.0);
        }
        offsets
    }

    fn native_duration(&self) -> f64 {
        let measured = self
            .native_measure_offsets()
            .iter()
            .zip(&self.measures)
            .map(|(start, m)| start + m.nominal_length().unwrap_or(0.0))
            .fold(0.0, f64::max);
        let loose = self.elements.iter().map(Element::end).fold(0.0, f64::max);
        measured.max(loose)
    }
}

/// A bar of one part.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Measure {
    /// Displayed measure number; integers and strings are both accepted
    #[serde(deserialize_with = "measure_number")]
    pub number: String,
    /// Length implied by the time signature
    #[serde(default)]
    pub bar_duration: Option<f64>,
    /// Length computed by the provider from the measure contents
    #[serde(default)]
    pub duration: Option<f64>,
    /// Native start of this measure inside its part
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Measure {
    /// Nominal length: explicit bar duration, then computed duration, then the latest end
    /// among notes, chords and rests.
    pub fn nominal_length(&self) -> Option<f64> {
        self.bar_duration.or(self.duration).or_else(|| {
            self.elements
                .iter()
                .filter(|e| e.duration() > 0.0)
                .map(Element::end)
                .reduce(f64::max)
        })
    }
}

fn measure_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Int(i64),
        Text(String),
    }

    Ok(match RawNumber::deserialize(deserializer)? {
        RawNumber::Int(n) => n.to_string(),
        RawNumber::Text(s) => s.trim().to_string(),
    })
}

/// Tie marker on a pitched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tie {
    Start,
    Stop,
}

/// Articulation attached to a pitched element. Only staccato changes the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Articulation {
    Staccato,
    Accent,
    Tenuto,
    Marcato,
    #[serde(other)]
    Other,
}

/// A pitch given either as a MIDI number or a scientific pitch name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Pitch {
    Midi(f64),
    Name(String),
}

impl Pitch {
    /// MIDI number of this pitch, `None` for names that don't parse.
    pub fn midi(&self) -> Option<f64> {
        match self {
            Pitch::Midi(n) => Some(*n),
            Pitch::Name(name) => pitch_name_to_midi(name),
        }
    }
}

/// Convert a name like `C4`, `F#3`, `Bb2` or `C-1` to its MIDI number (middle C = 60).
///
/// Names landing outside the MIDI range 0-127 are rejected.
pub fn pitch_name_to_midi(name: &str) -> Option<f64> {
    let name = name.trim();
    let mut chars = name.chars();
    let step = chars.next()?.to_ascii_uppercase();
    let base: i32 = match step {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let octave_start = rest
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(i, _)| i)?;
    let (accidentals, octave) = rest.split_at(octave_start);

    let mut alter = 0;
    for c in accidentals.chars() {
        match c {
            '#' | 's' => alter += 1,
            'b' | 'f' => alter -= 1,
            _ => return None,
        }
    }

    let octave: i32 = octave.parse().ok()?;
    let midi = (octave + 1) * 12 + base + alter;
    (0..=127).contains(&midi).then_some(midi as f64)
}

/// Playback velocity hint carried by a pitched element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Velocity {
    /// MIDI velocity 0-127
    Midi(u8),
    /// Normalized 0.0-1.0
    Scalar(f64),
}

/// Anything that can appear inside a measure (or loose in a part).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Element {
    Note(Note),
    Chord(Chord),
    Rest(Rest),
    Dynamic(Dynamic),
    Rehearsal(Rehearsal),
}

impl Element {
    pub fn offset(&self) -> f64 {
        match self {
            Element::Note(n) => n.offset,
            Element::Chord(c) => c.offset,
            Element::Rest(r) => r.offset,
            Element::Dynamic(d) => d.offset,
            Element::Rehearsal(r) => r.offset,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            Element::Note(n) => n.duration,
            Element::Chord(c) => c.duration,
            Element::Rest(r) => r.duration,
            Element::Dynamic(_) | Element::Rehearsal(_) => 0.0,
        }
    }

    fn end(&self) -> f64 {
        self.offset() + self.duration()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Note {
    #[serde(default)]
    pub offset: f64,
    pub pitch: Pitch,
    pub duration: f64,
    #[serde(default)]
    pub tie: Option<Tie>,
    #[serde(default)]
    pub articulations: Vec<Articulation>,
    #[serde(default)]
    pub velocity: Option<u8>,
    #[serde(default)]
    pub velocity_scalar: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Chord {
    #[serde(default)]
    pub offset: f64,
    pub pitches: Vec<Pitch>,
    pub duration: f64,
    #[serde(default)]
    pub tie: Option<Tie>,
    #[serde(default)]
    pub articulations: Vec<Articulation>,
    #[serde(default)]
    pub velocity: Option<u8>,
    #[serde(default)]
    pub velocity_scalar: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rest {
    #[serde(default)]
    pub offset: f64,
    pub duration: f64,
}

/// Loudness marking such as `mf` or `sfz`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dynamic {
    #[serde(default)]
    pub offset: f64,
    pub mark: String,
}

/// Rehearsal letter or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rehearsal {
    #[serde(default)]
    pub offset: f64,
    pub label: String,
}

/// Pitched view over notes and chords: one MIDI number per sounding pitch plus the
/// attributes they share.
#[derive(Debug, Clone)]
pub struct Sounding {
    pub pitches: Vec<f64>,
    pub duration: f64,
    pub tie: Option<Tie>,
    pub staccato: bool,
    pub velocity: Option<Velocity>,
}

impl Element {
    /// Pitched content of this element; `None` for rests, dynamics and rehearsal marks.
    ///
    /// Pitch names that don't parse are skipped, like pitches without a MIDI value.
    pub fn sounding(&self) -> Option<Sounding> {
        let (pitches, duration, tie, articulations, velocity, scalar) = match self {
            Element::Note(n) => (
                std::slice::from_ref(&n.pitch),
                n.duration,
                n.tie,
                &n.articulations,
                n.velocity,
                n.velocity_scalar,
            ),
            Element::Chord(c) => (
                c.pitches.as_slice(),
                c.duration,
                c.tie,
                &c.articulations,
                c.velocity,
                c.velocity_scalar,
            ),
            _ => return None,
        };

        Some(Sounding {
            pitches: pitches
                .iter()
                .filter_map(|pitch| {
                    let midi = pitch.midi();
                    if midi.is_none() {
                        tracing::debug!("Skipping unparseable pitch {:?}", pitch);
                    }
                    midi
                })
                .collect(),
            duration,
            tie,
            staccato: articulations.contains(&Articulation::Staccato),
            velocity: velocity
                .map(Velocity::Midi)
                .or(scalar.map(Velocity::Scalar)),
        })
    }
}
