//! First differences and the largest drops between consecutive samples.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::domain::{DropEvent, ResamplePeriod};
use crate::error::Result;

use super::ScadaSeries;

impl ScadaSeries {
    /// `out[i] = v[i + 1] - v[i]`, keyed by the earlier timestamp.
    ///
    /// Returns `n - 1` points, or an empty series when `n < 2`. With
    /// `resample`, differences are taken between bucket means.
    pub fn deviation(&self, resample: Option<ResamplePeriod>) -> Result<ScadaSeries> {
        let source = self.maybe_resample(resample)?;
        let out = source
            .points()
            .windows(2)
            .map(|w| (w[0].0, w[1].1 - w[0].1))
            .collect();
        Ok(ScadaSeries::from_sorted(self.name(), out))
    }

    /// The `count` most negative deviations, most negative first.
    ///
    /// This ranks by signed value, not magnitude: a large rise never appears
    /// ahead of a small drop. Ties keep time order and NaN deviations sort
    /// last.
    pub fn largest_drops(&self, resample: Option<ResamplePeriod>, count: usize) -> Result<Vec<DropEvent>> {
        let mut drops: Vec<DropEvent> = self
            .deviation(resample)?
            .points()
            .iter()
            .map(|&(timestamp, value)| DropEvent { timestamp, value })
            .collect();

        drops.sort_by(|a, b| nan_last(a.value, b.value));
        drops.truncate(count);
        Ok(drops)
    }

    /// Timestamps of `largest_drops`, in the same order.
    pub fn largest_drop_stamps(&self, resample: Option<ResamplePeriod>, count: usize) -> Result<Vec<NaiveDateTime>> {
        Ok(self
            .largest_drops(resample, count)?
            .into_iter()
            .map(|d| d.timestamp)
            .collect())
    }
}

fn nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}
