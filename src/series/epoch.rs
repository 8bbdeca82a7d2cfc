//! Epoch (changepoint) detection and epoch-relative re-indexing.
//!
//! `find_epoch` slides a window of `window_length + 1` samples across the
//! series and scores each window with a derivative function. The default
//! score, `time_weighted_derivative`, averages the per-step rate of change
//! back to the window start assuming a fixed `SAMPLE_PERIOD` between samples.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::RelativePoint;
use crate::error::{Result, ScadaError};

use super::ScadaSeries;

/// Assumed spacing between samples, in time units, for the default derivative.
///
/// This is a fixed constant and is never inferred from the data.
pub const SAMPLE_PERIOD: f64 = 4.0;

/// Default `find_epoch` window length.
pub const DEFAULT_WINDOW_LENGTH: usize = 5;

/// Mean of `(w[0] - w[k]) / (SAMPLE_PERIOD * k)` over `k = 1..w.len()`.
///
/// Positive when values fall across the window. `None` for windows of fewer
/// than two samples.
pub fn time_weighted_derivative(window: &[f64]) -> Option<f64> {
    let (&start, rest) = window.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let total: f64 = rest
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let k = (i + 1) as f64;
            (start - v) / (SAMPLE_PERIOD * k)
        })
        .sum();

    Some(total / rest.len() as f64)
}

/// Result of `epoch_deviation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EpochDeviation {
    /// Keyed by signed seconds relative to the epoch.
    Relative(Vec<RelativePoint>),
    /// Keyed by the original timestamps.
    Absolute(ScadaSeries),
}

impl EpochDeviation {
    pub fn len(&self) -> usize {
        match self {
            EpochDeviation::Relative(points) => points.len(),
            EpochDeviation::Absolute(series) => series.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScadaSeries {
    /// Score every window of `window_length + 1` samples with `derivative`.
    ///
    /// The score of window `v[i..=i + window_length]` is keyed by `t[i]`.
    /// Windows scored `None` or NaN are dropped.
    pub fn find_epoch<F>(&self, window_length: usize, derivative: F) -> ScadaSeries
    where
        F: Fn(&[f64]) -> Option<f64>,
    {
        let points = self.points();
        if points.len() <= window_length {
            return ScadaSeries::empty(self.name());
        }

        let values: Vec<f64> = self.values().collect();
        let out: Vec<(NaiveDateTime, f64)> = values
            .windows(window_length + 1)
            .zip(points)
            .filter_map(|(window, &(t, _))| derivative(window).filter(|d| !d.is_nan()).map(|d| (t, d)))
            .collect();

        debug!(
            "find_epoch on '{}' (window {}): {} scored windows",
            self.name(),
            window_length,
            out.len()
        );

        ScadaSeries::from_sorted(self.name(), out)
    }

    /// `find_epoch` with `time_weighted_derivative`.
    pub fn find_epoch_default(&self, window_length: usize) -> ScadaSeries {
        self.find_epoch(window_length, time_weighted_derivative)
    }

    /// The `count` windows with the steepest time-weighted fall, steepest first.
    pub fn strongest_epochs(&self, window_length: usize, count: usize) -> Vec<(NaiveDateTime, f64)> {
        let mut scored = self.find_epoch_default(window_length).points().to_vec();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(count);
        scored
    }

    /// `v[t] - v[epoch]` for every sample.
    ///
    /// With `from_epoch`, points are keyed by signed whole seconds from
    /// `epoch` (negative before it); otherwise by their timestamps.
    pub fn epoch_deviation(&self, epoch: NaiveDateTime, from_epoch: bool) -> Result<EpochDeviation> {
        let reference = self.get(epoch).ok_or(ScadaError::StampNotFound(epoch))?;

        if from_epoch {
            let points = self
                .points()
                .iter()
                .map(|&(t, v)| RelativePoint {
                    seconds: (t - epoch).num_seconds(),
                    value: v - reference,
                })
                .collect();
            Ok(EpochDeviation::Relative(points))
        } else {
            Ok(EpochDeviation::Absolute(self.offset(-reference)))
        }
    }
}
