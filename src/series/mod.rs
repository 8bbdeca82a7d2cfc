//! The time-indexed aggregate series and its analysis operations.
//!
//! `ScadaSeries` is a named, ascending, duplicate-free sequence of
//! `(timestamp, value)` pairs. Every operation returns a new series (or a
//! derived result) and leaves the receiver untouched.
//!
//! Operations are grouped by concern:
//! - resampling into fixed-width time buckets (`resample`)
//! - value distributions (`distribution`)
//! - first differences and largest drops (`deviation`)
//! - stamp-relative windows (`window`)
//! - windowed derivative "epoch" detection (`epoch`)

use std::ops::{Add, Sub};

use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};

pub mod deviation;
pub mod distribution;
pub mod epoch;
pub mod resample;
pub mod window;

pub use distribution::MAX_DISTRIBUTION_BINS;
pub use epoch::{DEFAULT_WINDOW_LENGTH, EpochDeviation, SAMPLE_PERIOD, time_weighted_derivative};
pub use resample::MAX_RESAMPLE_BUCKETS;
pub use window::DEFAULT_WINDOW_SECONDS;

/// Summary statistics over the finite values of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub len: usize,
    pub nan_count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// NaN values serialize as JSON `null`. Deserializing reads `null` back as
/// NaN and goes through [`ScadaSeries::new`], so the ordering invariant holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "SeriesRecord")]
pub struct ScadaSeries {
    name: String,
    points: Vec<(NaiveDateTime, f64)>,
}

/// Wire form of a serialized series.
#[derive(Deserialize)]
struct SeriesRecord {
    name: String,
    points: Vec<(NaiveDateTime, Option<f64>)>,
}

impl From<SeriesRecord> for ScadaSeries {
    fn from(record: SeriesRecord) -> Self {
        let points = record
            .points
            .into_iter()
            .map(|(t, v)| (t, v.unwrap_or(f64::NAN)))
            .collect();
        ScadaSeries::new(record.name, points)
    }
}

impl ScadaSeries {
    /// Build a series from unordered points.
    ///
    /// Points are stably sorted by timestamp. When a timestamp repeats, the
    /// last occurrence in input order is kept.
    pub fn new(name: impl Into<String>, mut points: Vec<(NaiveDateTime, f64)>) -> Self {
        let name = name.into();
        points.sort_by_key(|&(t, _)| t);

        let before = points.len();
        let mut deduped: Vec<(NaiveDateTime, f64)> = Vec::with_capacity(before);
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.0 == point.0 => *last = point,
                _ => deduped.push(point),
            }
        }

        let dropped = before - deduped.len();
        if dropped > 0 {
            warn!("series '{name}': dropped {dropped} duplicate timestamp(s), keeping the last value");
        }

        Self { name, points: deduped }
    }

    /// Build from points already known to be strictly ascending.
    pub(crate) fn from_sorted(name: impl Into<String>, points: Vec<(NaiveDateTime, f64)>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].0 < w[1].0));
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::from_sorted(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDateTime, f64)] {
        &self.points
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.points.iter().map(|&(t, _)| t)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(_, v)| v)
    }

    /// Finite values only.
    pub fn finite_values(&self) -> Vec<f64> {
        self.values().filter(|v| v.is_finite()).collect()
    }

    /// Value stored at `stamp`, if the stamp is part of the index.
    pub fn get(&self, stamp: NaiveDateTime) -> Option<f64> {
        self.points
            .binary_search_by_key(&stamp, |&(t, _)| t)
            .ok()
            .map(|idx| self.points[idx].1)
    }

    pub fn first(&self) -> Option<(NaiveDateTime, f64)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(NaiveDateTime, f64)> {
        self.points.last().copied()
    }

    /// Apply `f` to every value, keeping the index.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::from_sorted(
            self.name.clone(),
            self.points.iter().map(|&(t, v)| (t, f(v))).collect(),
        )
    }

    pub fn offset(&self, delta: f64) -> Self {
        self.map_values(|v| v + delta)
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map_values(|v| v * factor)
    }

    /// Combine two series on the timestamps they share.
    pub fn zip_with(&self, other: &ScadaSeries, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut out = Vec::with_capacity(self.len().min(other.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.points.len() && j < other.points.len() {
            let (ta, va) = self.points[i];
            let (tb, vb) = other.points[j];
            match ta.cmp(&tb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push((ta, f(va, vb)));
                    i += 1;
                    j += 1;
                }
            }
        }
        Self::from_sorted(self.name.clone(), out)
    }

    /// Count, range and mean of the finite values; `None` if there are none.
    pub fn stats(&self) -> Option<SeriesStats> {
        let (start, _) = self.first()?;
        let (end, _) = self.last()?;

        let finite = self.finite_values();
        if finite.is_empty() {
            return None;
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = finite.iter().sum::<f64>() / finite.len() as f64;

        Some(SeriesStats {
            len: self.len(),
            nan_count: self.len() - finite.len(),
            min,
            max,
            mean,
            start,
            end,
        })
    }
}

impl Add for &ScadaSeries {
    type Output = ScadaSeries;

    fn add(self, rhs: &ScadaSeries) -> ScadaSeries {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &ScadaSeries {
    type Output = ScadaSeries;

    fn sub(self, rhs: &ScadaSeries) -> ScadaSeries {
        self.zip_with(rhs, |a, b| a - b)
    }
}


#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::test_support::{series_every, t0};
    use super::*;

    #[test]
    fn new_sorts_and_keeps_last_duplicate() {
        let t = t0();
        let s = ScadaSeries::new(
            "x",
            vec![
                (t + Duration::seconds(8), 3.0),
                (t, 1.0),
                (t + Duration::seconds(4), 2.0),
                (t, 9.0),
            ],
        );

        assert_eq!(s.len(), 3);
        assert_eq!(s.get(t), Some(9.0));
        let stamps: Vec<_> = s.timestamps().collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn arithmetic_joins_on_shared_stamps() {
        let a = series_every(4, &[1.0, 2.0, 3.0]);
        let b = ScadaSeries::new(
            "b",
            vec![(t0() + Duration::seconds(4), 10.0), (t0() + Duration::seconds(8), 20.0)],
        );

        let sum = &a + &b;
        assert_eq!(sum.values().collect::<Vec<_>>(), vec![12.0, 23.0]);

        let diff = &b - &a;
        assert_eq!(diff.values().collect::<Vec<_>>(), vec![8.0, 17.0]);

        assert_eq!(a.offset(1.0).values().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(a.scale(2.0).values().collect::<Vec<_>>(), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn stats_ignore_nan() {
        let s = series_every(4, &[1.0, f64::NAN, 5.0]);
        let stats = s.stats().unwrap();
        assert_eq!(stats.len, 3);
        assert_eq!(stats.nan_count, 1);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.mean, 3.0);

        assert!(series_every(4, &[f64::NAN]).stats().is_none());
        assert!(ScadaSeries::empty("e").stats().is_none());
    }

    #[test]
    fn json_read_back_restores_nan_and_order() {
        let s = series_every(4, &[1.0, f64::NAN, 3.0]);
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("null"));

        let back: ScadaSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 3);
        assert!(back.points()[1].1.is_nan());
        assert_eq!(back.points()[2], s.points()[2]);

        let unordered = r#"{"name":"u","points":[["2015-01-01T00:00:08",3.0],["2015-01-01T00:00:00",1.0],["2015-01-01T00:00:00",2.0]]}"#;
        let back: ScadaSeries = serde_json::from_str(unordered).unwrap();
        assert_eq!(back.values().collect::<Vec<_>>(), vec![2.0, 3.0]);
        assert_eq!(back.first().map(|(t, _)| t), Some(t0()));
    }
}
