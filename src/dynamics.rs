//! Loudness resolution from dynamics markings and velocities.
//!
//! Levels live in `[MIN_DYNAMIC_LEVEL, MAX_DYNAMIC_LEVEL]`. A marking sets the level for
//! everything after it in the same part; a velocity on the note itself can only raise it.

use crate::score::Velocity;

pub const MIN_DYNAMIC_LEVEL: f64 = 0.2;
pub const MAX_DYNAMIC_LEVEL: f64 = 1.2;
pub const DEFAULT_DYNAMIC_LEVEL: f64 = 0.6;

/// Approximate loudness for a marking, `None` for marks outside the table.
pub fn mark_level(mark: &str) -> Option<f64> {
    let level = match mark {
        "ppp" => 0.2,
        "pp" => 0.3,
        "p" => 0.4,
        "mp" => 0.55,
        "mf" => 0.7,
        "f" => 0.85,
        "ff" => 1.0,
        "fff" => 1.15,
        "sfz" => 1.05,
        "sffz" => 1.1,
        "fp" => 0.65,
        _ => return None,
    };
    Some(level)
}

pub fn clamp_level(level: f64) -> f64 {
    level.clamp(MIN_DYNAMIC_LEVEL, MAX_DYNAMIC_LEVEL)
}

/// Map a velocity linearly onto the dynamic range.
pub fn velocity_level(velocity: Velocity) -> f64 {
    let normalized = match velocity {
        Velocity::Midi(v) => (v as f64 / 127.0).clamp(0.0, 1.0),
        Velocity::Scalar(s) => s.clamp(0.0, 1.0),
    };
    MIN_DYNAMIC_LEVEL + normalized * (MAX_DYNAMIC_LEVEL - MIN_DYNAMIC_LEVEL)
}

#[derive(Debug, Clone, PartialEq)]
struct DynamicEntry {
    offset: f64,
    level: f64,
    mark: String,
}

/// Resolved loudness of a note.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDynamic {
    pub level: f64,
    pub mark: Option<String>,
}

/// Dynamics markings of one part, sorted by offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicsTimeline {
    entries: Vec<DynamicEntry>,
}

impl DynamicsTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a marking; unknown marks keep their text but use the default level.
    pub fn push(&mut self, offset: f64, mark: &str) {
        let mark = mark.trim().to_lowercase();
        let level = clamp_level(mark_level(&mark).unwrap_or(DEFAULT_DYNAMIC_LEVEL));
        let entry = DynamicEntry {
            offset,
            level,
            mark,
        };
        // Stable insertion keeps markings at the same offset in source order
        let at = self.entries.partition_point(|e| e.offset <= offset);
        self.entries.insert(at, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loudness at `offset`: the latest marking at or before it (default level if none),
    /// raised to the velocity level when the note carries a louder velocity.
    ///
    /// # Example
    /// ```
    /// use score_timeline::dynamics::DynamicsTimeline;
    ///
    /// let mut timeline = DynamicsTimeline::new();
    /// timeline.push(0.0, "p");
    /// timeline.push(4.0, "ff");
    ///
    /// let soft = timeline.resolve(2.0, None);
    /// assert_eq!(soft.level, 0.4);
    /// assert_eq!(soft.mark.as_deref(), Some("p"));
    /// assert_eq!(timeline.resolve(4.0, None).level, 1.0);
    /// ```
    pub fn resolve(&self, offset: f64, velocity: Option<Velocity>) -> ResolvedDynamic {
        let idx = self.entries.partition_point(|e| e.offset <= offset);
        let (mut level, mark) = match idx.checked_sub(1).map(|i| &self.entries[i]) {
            Some(entry) => (entry.level, Some(entry.mark.clone())),
            None => (DEFAULT_DYNAMIC_LEVEL, None),
        };

        if let Some(velocity) = velocity {
            level = level.max(velocity_level(velocity));
        }

        ResolvedDynamic {
            level: clamp_level(level),
            mark,
        }
    }
}
