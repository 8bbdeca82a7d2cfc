//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the series operations and the report/plot layers
//! - exported to JSON/CSV
//! - parsed directly from CLI flags

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ScadaError;

/// How the samples inside one resample bucket are reduced to a single value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Aggregator {
    #[default]
    Mean,
    Sum,
    Min,
    Max,
    Count,
    Median,
    First,
    Last,
}

impl Aggregator {
    /// Reduce the finite samples of one bucket.
    ///
    /// An empty slice yields NaN for every aggregator, so an empty bucket
    /// never reads as a real zero.
    pub fn reduce(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }

        match self {
            Aggregator::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregator::Sum => values.iter().sum(),
            Aggregator::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregator::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregator::Count => values.len() as f64,
            Aggregator::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            Aggregator::First => values[0],
            Aggregator::Last => values[values.len() - 1],
        }
    }
}

/// A fixed-width resample bucket, in whole seconds.
///
/// Parsed from `30s`, `10min`, `15T`, `1h`, `1H`, `1d`, `1D`, or a bare
/// number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResamplePeriod {
    seconds: i64,
}

impl ResamplePeriod {
    pub fn from_seconds(seconds: i64) -> Result<Self, ScadaError> {
        if seconds <= 0 {
            return Err(ScadaError::InvalidParameter(format!(
                "resample period must be positive, got {seconds}s"
            )));
        }
        Ok(Self { seconds })
    }

    pub fn minutes(minutes: i64) -> Result<Self, ScadaError> {
        Self::from_seconds(minutes.saturating_mul(60))
    }

    pub fn seconds(self) -> i64 {
        self.seconds
    }

    pub fn duration(self) -> Duration {
        Duration::seconds(self.seconds)
    }
}

impl FromStr for ResamplePeriod {
    type Err = ScadaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        let amount: i64 = digits
            .parse()
            .map_err(|_| ScadaError::InvalidParameter(format!("invalid resample period '{s}'")))?;

        let scale = match unit.trim() {
            "" | "s" | "S" | "sec" => 1,
            "m" | "min" | "T" => 60,
            "h" | "H" => 3_600,
            "d" | "D" => 86_400,
            other => {
                return Err(ScadaError::InvalidParameter(format!(
                    "unknown resample unit '{other}' in '{s}' (expected s, min, h or d)"
                )));
            }
        };

        Self::from_seconds(amount.saturating_mul(scale))
    }
}

impl fmt::Display for ResamplePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.seconds;
        if s % 86_400 == 0 {
            write!(f, "{}d", s / 86_400)
        } else if s % 3_600 == 0 {
            write!(f, "{}h", s / 3_600)
        } else if s % 60 == 0 {
            write!(f, "{}min", s / 60)
        } else {
            write!(f, "{s}s")
        }
    }
}

/// Options for `ScadaSeries::output_distribution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionOptions {
    pub resample: Option<ResamplePeriod>,
    /// With `cumulative`, report the running sum instead of `100 - running sum`.
    pub inverse: bool,
    pub cumulative: bool,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            resample: None,
            inverse: false,
            cumulative: true,
        }
    }
}

/// One bin of a value distribution, labeled by the bin's right edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionPoint {
    pub threshold: f64,
    pub percentage: f64,
}

/// A first difference between consecutive samples, keyed by the earlier stamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropEvent {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// A value keyed by signed whole seconds relative to a reference stamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativePoint {
    pub seconds: i64,
    pub value: f64,
}

/// Which sensor columns a load aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceSelection {
    /// Every non-timestamp column.
    #[default]
    All,
    /// Columns containing any of these substrings.
    Columns(Vec<String>),
    /// A named site/substation group.
    Group(String),
}

/// Output format for `--export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Resolved settings for one CLI run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub file: PathBuf,
    pub source: SourceSelection,
    /// Treat a selection that matches no column as an error.
    pub strict: bool,
    pub resample: Option<ResamplePeriod>,
    pub aggregator: Aggregator,
    pub export: Option<PathBuf>,
    pub export_format: ExportFormat,
}
