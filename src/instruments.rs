//! Instrument family classification.
//!
//! Static lookup tables behind [`classify`]: a General MIDI program table per ensemble
//! archetype plus keyword lists for instrument names. The tables are plain immutable data;
//! nothing here holds state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// How parts are grouped for coloring and family assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensemble {
    /// Every part is its own family (labels are disambiguated)
    #[default]
    Ungrouped,
    Orchestra,
    #[serde(alias = "big-band", alias = "big_band")]
    Bigband,
}

impl Ensemble {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ensemble::Ungrouped => "ungrouped",
            Ensemble::Orchestra => "orchestra",
            Ensemble::Bigband => "bigband",
        }
    }
}

impl fmt::Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ensemble {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ungrouped" => Ok(Ensemble::Ungrouped),
            "orchestra" => Ok(Ensemble::Orchestra),
            "bigband" | "big-band" | "big_band" => Ok(Ensemble::Bigband),
            other => Err(TimelineError::ConfigError(format!(
                "Unknown ensemble: {}",
                other
            ))),
        }
    }
}

/// Instrument family within an ensemble archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    // Orchestra
    Strings,
    Winds,
    Brass,
    Percussion,
    // Big band
    Trumpets,
    Trombones,
    Saxophones,
    RhythmSection,
    Unknown,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Strings => "strings",
            Family::Winds => "winds",
            Family::Brass => "brass",
            Family::Percussion => "percussion",
            Family::Trumpets => "trumpets",
            Family::Trombones => "trombones",
            Family::Saxophones => "saxophones",
            Family::RhythmSection => "rhythm_section",
            Family::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ORCHESTRA_KEYWORDS: &[(Family, &[&str])] = &[
    (
        Family::Strings,
        &[
            "violin", "viola", "cello", "contrabass", "double bass", "bass", "guitar", "harp",
            "piano", "pianoforte", "harpsichord", "clavichord", "banjo", "mandolin", "ukulele",
            "lute", "sitar", "shamisen", "koto", "strings", "string", "pizzicato", "tremolo",
        ],
    ),
    (
        Family::Winds,
        &[
            "flute", "piccolo", "recorder", "oboe", "english horn", "cor anglais", "clarinet",
            "bassoon", "contrabassoon", "saxophone", "sax", "soprano", "alto", "tenor",
            "baritone", "bass clarinet", "fagotto", "organ", "accordion", "harmonica",
            "pan flute", "whistle", "ocarina", "shakuhachi", "bagpipe", "fiddle",
        ],
    ),
    (
        Family::Brass,
        &[
            "trumpet", "cornet", "trombone", "tuba", "french horn", "horn", "euphonium",
            "baritone", "flugelhorn", "bugle", "brass", "muted",
        ],
    ),
    (
        Family::Percussion,
        &[
            "drum", "timpani", "snare", "bass drum", "cymbal", "triangle", "tambourine",
            "marimba", "xylophone", "vibraphone", "glockenspiel", "celesta", "gong", "bell",
            "chime", "woodblock", "clap", "percussion", "tom", "hi-hat", "crash", "ride",
        ],
    ),
];

const BIGBAND_KEYWORDS: &[(Family, &[&str])] = &[
    (Family::Trumpets, &["trumpet", "cornet", "flugelhorn", "bugle"]),
    (Family::Trombones, &["trombone", "tuba", "euphonium", "baritone horn"]),
    (
        Family::Saxophones,
        &[
            "saxophone", "sax", "soprano sax", "alto sax", "tenor sax", "baritone sax", "flute",
            "piccolo", "clarinet", "oboe", "bassoon", "english horn", "woodwind", "reed",
        ],
    ),
    (
        Family::RhythmSection,
        &[
            "piano", "pianoforte", "keyboard", "organ", "harpsichord", "bass", "double bass",
            "acoustic bass", "electric bass", "upright bass", "drum", "drums", "snare",
            "bass drum", "cymbal", "hi-hat", "crash", "ride", "guitar", "acoustic guitar",
            "electric guitar", "rhythm", "rhythm section", "percussion", "vibraphone",
            "marimba", "xylophone",
        ],
    ),
];

/// General MIDI program (1-based) to orchestral family.
fn orchestra_program_family(program: u8) -> Family {
    match program {
        1..=8 => Family::Strings,      // pianos
        9..=16 => Family::Percussion,  // chromatic percussion
        17..=24 => Family::Winds,      // organs, accordion, harmonica
        25..=52 => Family::Strings,    // guitars, basses, strings, string ensembles
        53..=55 => Family::Winds,      // choir and voices
        56..=64 => Family::Brass,      // orchestra hit, brass
        65..=88 => Family::Winds,      // reeds, pipes, synth leads
        89..=96 => Family::Strings,    // synth pads
        97..=104 => Family::Unknown,   // synth effects
        105 | 111 => Family::Winds,    // sitar, fiddle
        106..=112 => Family::Strings,  // remaining ethnic
        113..=128 => Family::Percussion,
        _ => Family::Unknown,
    }
}

/// General MIDI program (1-based) to big-band section.
fn bigband_program_family(program: u8) -> Family {
    match program {
        1..=40 => Family::RhythmSection, // keys, guitars, basses
        41..=47 => Family::Unknown,      // orchestral strings
        48 => Family::RhythmSection,     // timpani
        49..=56 => Family::Unknown,      // ensembles and voices
        57 | 60 => Family::Trumpets,
        58 | 59 => Family::Trombones,
        61..=64 => Family::Unknown,      // horn, brass section, synth brass
        65..=80 => Family::Saxophones,   // reeds and pipes (woodwind doubles)
        81..=96 => Family::RhythmSection,
        97..=112 => Family::Unknown,
        113..=122 => Family::RhythmSection,
        _ => Family::Unknown,
    }
}

fn keyword_family(name: &str, keywords: &[(Family, &[&str])]) -> Option<Family> {
    let name = name.to_lowercase();

    // Longest keyword first across all families so "bassoon" is tried before "bass"
    let mut pairs: Vec<(&str, Family)> = keywords
        .iter()
        .flat_map(|(family, words)| words.iter().map(move |w| (*w, *family)))
        .collect();
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    pairs
        .into_iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, family)| family)
}

/// Determine the family of an instrument from its MIDI program and/or name.
///
/// A program in `1..=128` wins over the name. Names match case-insensitively. Anything
/// unmatched is [`Family::Unknown`]. Ensembles other than big band use the orchestral
/// tables.
///
/// # Example
/// ```
/// use score_timeline::instruments::{classify, Ensemble, Family};
///
/// assert_eq!(classify(Some(41), None, Ensemble::Orchestra), Family::Strings);
/// assert_eq!(classify(None, Some("Alto Sax"), Ensemble::Bigband), Family::Saxophones);
/// assert_eq!(classify(None, Some("Theremin"), Ensemble::Orchestra), Family::Unknown);
/// ```
pub fn classify(program: Option<u8>, name: Option<&str>, ensemble: Ensemble) -> Family {
    let bigband = ensemble == Ensemble::Bigband;

    if let Some(program) = program.filter(|p| (1..=128).contains(p)) {
        return if bigband {
            bigband_program_family(program)
        } else {
            orchestra_program_family(program)
        };
    }

    let keywords = if bigband { BIGBAND_KEYWORDS } else { ORCHESTRA_KEYWORDS };
    name.and_then(|n| keyword_family(n, keywords))
        .unwrap_or(Family::Unknown)
}
