//! Ensemble suggestion.
//!
//! Scores how well the part roster of a score matches each supported archetype. The result
//! is advisory: it never changes how events are classified.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::instruments::{classify, Ensemble, Family};
use crate::score::{Part, Score};

/// One candidate archetype and its confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnsembleSuggestion {
    pub ensemble: Ensemble,
    pub confidence: f64,
}

/// Per-family part counts under one archetype's classification.
#[derive(Debug, Default)]
struct FamilyCounts {
    counts: BTreeMap<Family, usize>,
    total: usize,
}

impl FamilyCounts {
    fn tally(roster: &[(Option<u8>, Option<&str>)], ensemble: Ensemble) -> Self {
        let mut counts = BTreeMap::new();
        for &(program, name) in roster {
            *counts.entry(classify(program, name, ensemble)).or_insert(0) += 1;
        }
        Self {
            counts,
            total: roster.len().max(1),
        }
    }

    fn get(&self, family: Family) -> usize {
        self.counts.get(&family).copied().unwrap_or(0)
    }

    fn ratio(&self, family: Family) -> f64 {
        self.get(family) as f64 / self.total as f64
    }

    fn present(&self, family: Family) -> bool {
        self.get(family) > 0
    }

    /// Weighted share of the roster; families missing from `weights` count 0.1.
    fn weighted(&self, weights: &[(Family, f64)]) -> f64 {
        let sum: f64 = self
            .counts
            .iter()
            .map(|(family, &count)| {
                let weight = weights
                    .iter()
                    .find(|(f, _)| f == family)
                    .map_or(0.1, |(_, w)| *w);
                count as f64 * weight
            })
            .sum();
        sum / self.total as f64
    }
}

const ORCHESTRA_WEIGHTS: &[(Family, f64)] = &[
    (Family::Strings, 1.0),
    (Family::Winds, 0.9),
    (Family::Brass, 0.9),
    (Family::Percussion, 0.8),
    (Family::Unknown, 0.2),
];

const BIGBAND_WEIGHTS: &[(Family, f64)] = &[
    (Family::Trumpets, 1.0),
    (Family::Trombones, 1.0),
    (Family::Saxophones, 1.0),
    (Family::RhythmSection, 1.0),
    (Family::Unknown, 0.1),
];

fn orchestra_confidence(orchestra: &FamilyCounts, bigband: &FamilyCounts) -> f64 {
    let total = orchestra.total;
    let strings_ratio = orchestra.ratio(Family::Strings);
    let winds = orchestra.present(Family::Winds);
    let brass = orchestra.present(Family::Brass);
    let percussion = orchestra.present(Family::Percussion);
    let families_present = [Family::Strings, Family::Winds, Family::Brass, Family::Percussion]
        .into_iter()
        .filter(|&f| orchestra.present(f))
        .count();

    let mut bonus = 0.0;
    let mut penalty = 0.0;
    if strings_ratio >= 0.3 {
        bonus += 0.25;
    }
    if strings_ratio >= 0.45 {
        bonus += 0.1;
    }
    if strings_ratio >= 0.6 {
        bonus += 0.1;
    }
    if winds && brass {
        bonus += 0.05;
        if percussion {
            bonus += 0.1;
        }
    }
    if families_present <= 1 {
        penalty += 0.25;
    }
    if families_present >= 3 {
        bonus += 0.1;
    }
    if total >= 12 {
        bonus += 0.05;
    }
    if total >= 24 {
        bonus += 0.05;
    }

    let mut score = orchestra.weighted(ORCHESTRA_WEIGHTS) + bonus - penalty;

    if strings_ratio == 0.0 {
        score *= 0.25;
    } else if strings_ratio < 0.1 {
        score *= 0.3;
    } else if strings_ratio < 0.2 {
        score *= 0.35;
    }
    if families_present <= 1 {
        score *= 0.25;
    }

    // Rosters made of big-band sections with hardly any strings
    let bigband_ratio = [
        Family::Saxophones,
        Family::Trumpets,
        Family::Trombones,
        Family::RhythmSection,
    ]
    .into_iter()
    .map(|f| bigband.get(f))
    .sum::<usize>() as f64
        / total as f64;
    if strings_ratio < 0.2 {
        if bigband_ratio > 0.5 {
            score *= 0.6;
        }
        if bigband_ratio > 0.65 {
            score *= 0.5;
        }
    }

    if total > 24 {
        score *= 24.0 / total as f64;
    }

    score
}

fn bigband_confidence(bigband: &FamilyCounts, orchestra: &FamilyCounts) -> f64 {
    let total = bigband.total;
    let saxes = bigband.get(Family::Saxophones);
    let brass = bigband.get(Family::Trumpets) + bigband.get(Family::Trombones);
    let rhythm = bigband.get(Family::RhythmSection);
    let unknown_ratio = bigband.ratio(Family::Unknown);
    let strings_ratio = orchestra.ratio(Family::Strings);

    let sections_present = [saxes, brass, rhythm].iter().filter(|&&n| n > 0).count();
    if sections_present == 0 {
        return 0.0;
    }

    let mut bonus = 0.0;
    let mut penalty = 0.0;
    if saxes > 0 {
        bonus += 0.2;
    }
    if brass > 0 {
        bonus += 0.15;
    }
    if rhythm > 0 {
        bonus += 0.1;
    }
    match sections_present {
        3 => bonus += 0.2,
        2 => penalty += 0.15,
        _ => penalty += 0.35,
    }

    if strings_ratio >= 0.2 {
        penalty += 0.5;
    }
    if strings_ratio >= 0.35 {
        penalty += 0.5;
    }
    if unknown_ratio > 0.35 {
        penalty += 0.1 + 0.4 * (unknown_ratio - 0.35);
    }
    if total > 24 {
        penalty += 0.2;
    }
    if total > 40 {
        penalty += 0.4;
    }

    let mut score = bigband.weighted(BIGBAND_WEIGHTS) + bonus - penalty;
    score *= sections_present as f64 / 3.0;

    let core_ratio = (saxes + brass + rhythm) as f64 / total as f64;
    if core_ratio < 0.6 {
        score *= core_ratio / 0.6;
    }
    if core_ratio < 0.25 {
        score *= core_ratio / 0.25;
    }

    score
}

/// Scale down rosters under five parts, then clamp to `[0, 1]`.
fn small_ensemble_penalty(score: f64, total: usize) -> f64 {
    let score = if total < 5 {
        score * (total as f64 / 5.0).max(0.2)
    } else {
        score
    };
    score.clamp(0.0, 1.0)
}

/// Program and name used to classify a part; the part name stands in only when the
/// instrument declares neither.
fn roster_entry(part: &Part) -> (Option<u8>, Option<&str>) {
    let program = part.program();
    let name = part.instrument_name();
    match (program, name) {
        (None, None) => (None, part.name.as_deref()),
        other => other,
    }
}

/// Rank the supported archetypes for a score, most likely first.
///
/// The list always ends with an `ungrouped` entry at confidence 0.0; a score without parts
/// yields only that entry.
///
/// # Example
/// ```
/// use score_timeline::{detect_ensembles, Ensemble, Score};
///
/// let score = Score::from_yaml(r#"
/// parts:
///   - name: Violin I
///   - name: Violin II
///   - name: Viola
///   - name: Cello
///   - name: Flute
///   - name: Horn
/// "#).unwrap();
///
/// let ranking = detect_ensembles(&score);
/// assert_eq!(ranking[0].ensemble, Ensemble::Orchestra);
/// assert_eq!(ranking.last().unwrap().ensemble, Ensemble::Ungrouped);
/// ```
pub fn detect_ensembles(score: &Score) -> Vec<EnsembleSuggestion> {
    let sentinel = EnsembleSuggestion {
        ensemble: Ensemble::Ungrouped,
        confidence: 0.0,
    };
    if score.parts.is_empty() {
        return vec![sentinel];
    }

    let roster: Vec<_> = score.parts.iter().map(roster_entry).collect();
    let orchestra = FamilyCounts::tally(&roster, Ensemble::Orchestra);
    let bigband = FamilyCounts::tally(&roster, Ensemble::Bigband);

    let mut ranking = vec![
        EnsembleSuggestion {
            ensemble: Ensemble::Bigband,
            confidence: small_ensemble_penalty(
                bigband_confidence(&bigband, &orchestra),
                bigband.total,
            ),
        },
        EnsembleSuggestion {
            ensemble: Ensemble::Orchestra,
            confidence: small_ensemble_penalty(
                orchestra_confidence(&orchestra, &bigband),
                orchestra.total,
            ),
        },
    ];
    ranking.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranking.push(sentinel);

    tracing::debug!(
        "Ensemble ranking: {}",
        ranking
            .iter()
            .map(|s| format!("{}={:.2}", s.ensemble, s.confidence))
            .collect::<Vec<_>>()
            .join(", ")
    );

    ranking
}
