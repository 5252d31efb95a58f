//! Conversion options.
//!
//! Options are built in code or read from YAML with kebab-case keys:
//!
//! ```yaml
//! ensemble: orchestra
//! split-overlaps: true
//! staccato-factor: 0.4
//! slice-unit: bar
//! slice-start: 5
//! slice-end: 9
//! show-connections: true
//! connections:
//!   max-gap: 2.0
//!   fade-start: 4.0
//! ```
//!
//! Slice bounds are validated here, before any score is touched.

use serde::Deserialize;

use crate::error::TimelineError;
use crate::events::{clamp_staccato_factor, ConnectionConfig, SliceRange, DEFAULT_STACCATO_FACTOR};
use crate::instruments::Ensemble;

/// Validated parameters for [`convert`](crate::convert).
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    pub ensemble: Ensemble,
    /// Split same-pitch overlaps into segments instead of counting over whole notes
    pub split_overlaps: bool,
    /// Always within `[MIN_STACCATO_FACTOR, MAX_STACCATO_FACTOR]`
    pub staccato_factor: f64,
    pub slice: Option<SliceRange>,
    pub show_connections: bool,
    pub connections: ConnectionConfig,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            ensemble: Ensemble::Ungrouped,
            split_overlaps: true,
            staccato_factor: DEFAULT_STACCATO_FACTOR,
            slice: None,
            show_connections: false,
            connections: ConnectionConfig::default(),
        }
    }
}

impl ConversionOptions {
    /// Read options from YAML.
    ///
    /// # Example
    /// ```
    /// use score_timeline::{ConversionOptions, Ensemble};
    /// use score_timeline::events::SliceRange;
    ///
    /// let source = "ensemble: big-band\nslice-start: 2\nslice-end: 4";
    /// let options = ConversionOptions::from_yaml(source).unwrap();
    /// assert_eq!(options.ensemble, Ensemble::Bigband);
    /// assert_eq!(options.slice, Some(SliceRange::Bars { start: 2, end: 4 }));
    ///
    /// assert!(ConversionOptions::from_yaml("slice-start: 4\nslice-end: 2").is_err());
    /// ```
    pub fn from_yaml(source: &str) -> Result<Self, TimelineError> {
        let raw: RawOptions = if source.trim().is_empty() {
            RawOptions::default()
        } else {
            serde_yaml::from_str(source).map_err(|e| TimelineError::ConfigError(e.to_string()))?
        };
        Self::try_from(raw)
    }

    /// Set the staccato factor, clamping it into range.
    pub fn with_staccato_factor(mut self, factor: f64) -> Self {
        self.staccato_factor = clamp_staccato_factor(factor);
        self
    }

    /// Set the slice, validating its bounds.
    pub fn with_slice(mut self, slice: SliceRange) -> Result<Self, TimelineError> {
        slice.validate()?;
        self.slice = Some(slice);
        Ok(self)
    }
}

/// Options as written in YAML, before validation.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub struct RawOptions {
    pub ensemble: Option<String>,
    pub split_overlaps: Option<bool>,
    pub staccato_factor: Option<f64>,
    pub slice_unit: Option<String>,
    pub slice_start: Option<f64>,
    pub slice_end: Option<f64>,
    pub show_connections: Option<bool>,
    pub connections: Option<ConnectionConfig>,
}

impl TryFrom<RawOptions> for ConversionOptions {
    type Error = TimelineError;

    fn try_from(raw: RawOptions) -> Result<Self, Self::Error> {
        let ensemble = match &raw.ensemble {
            Some(name) => name.parse()?,
            None => Ensemble::default(),
        };

        let slice = match (raw.slice_start, raw.slice_end) {
            (None, None) => None,
            (Some(start), Some(end)) => {
                let range = slice_range(raw.slice_unit.as_deref(), start, end)?;
                range.validate()?;
                Some(range)
            }
            _ => {
                return Err(TimelineError::InvalidSlice(
                    "slice-start and slice-end must be given together".to_string(),
                ))
            }
        };

        Ok(Self {
            ensemble,
            split_overlaps: raw.split_overlaps.unwrap_or(true),
            staccato_factor: clamp_staccato_factor(
                raw.staccato_factor.unwrap_or(DEFAULT_STACCATO_FACTOR),
            ),
            slice,
            show_connections: raw.show_connections.unwrap_or(false),
            connections: raw.connections.unwrap_or_default(),
        })
    }
}

fn slice_range(unit: Option<&str>, start: f64, end: f64) -> Result<SliceRange, TimelineError> {
    match unit.map(|u| u.trim().to_ascii_lowercase()).as_deref() {
        None | Some("bar") | Some("measure") => Ok(SliceRange::Bars {
            start: bar_number(start)?,
            end: bar_number(end)?,
        }),
        Some("beat") => Ok(SliceRange::Beats { start, end }),
        Some(other) => Err(TimelineError::ConfigError(format!(
            "Unknown slice unit: {}",
            other
        ))),
    }
}

fn bar_number(value: f64) -> Result<u32, TimelineError> {
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(TimelineError::InvalidSlice(format!(
            "bar numbers must be whole, got {}",
            value
        )));
    }
    Ok(value as u32)
}
