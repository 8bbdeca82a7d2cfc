//! Fixed-width time bucketing.
//!
//! Buckets start at multiples of the period since the Unix epoch, so a
//! `10min` bucket always starts on `:00`, `:10`, ... regardless of where the
//! data begins. The output covers every bucket from the first occupied one to
//! the last occupied one; a bucket with no finite sample is emitted as NaN for
//! every aggregator.

use chrono::{DateTime, NaiveDateTime};
use log::debug;

use crate::domain::{Aggregator, ResamplePeriod};
use crate::error::{Result, ScadaError};

use super::ScadaSeries;

/// Upper bound on the buckets one resample may emit.
pub const MAX_RESAMPLE_BUCKETS: i64 = 10_000_000;

impl ScadaSeries {
    /// Group values into `period`-wide buckets and reduce each with `aggregator`.
    ///
    /// Fails with `InvalidParameter` when the series spans more than
    /// [`MAX_RESAMPLE_BUCKETS`] buckets of `period`.
    pub fn resample(&self, period: ResamplePeriod, aggregator: Aggregator) -> Result<ScadaSeries> {
        let (Some((first, _)), Some((last, _))) = (self.first(), self.last()) else {
            return Ok(ScadaSeries::empty(self.name()));
        };

        let width = period.seconds();
        let first_bucket = bucket_index(first, width);
        let bucket_count = bucket_index(last, width) - first_bucket + 1;
        if bucket_count > MAX_RESAMPLE_BUCKETS {
            return Err(ScadaError::InvalidParameter(format!(
                "resampling '{}' to {period} would emit {bucket_count} buckets (limit {MAX_RESAMPLE_BUCKETS})",
                self.name()
            )));
        }

        let mut out = Vec::with_capacity(bucket_count as usize);
        let mut current = first_bucket;
        let mut samples: Vec<f64> = Vec::new();

        for &(t, v) in self.points() {
            let idx = bucket_index(t, width);
            while current < idx {
                out.push((bucket_start(current, width), aggregator.reduce(&samples)));
                samples.clear();
                current += 1;
            }
            if v.is_finite() {
                samples.push(v);
            }
        }
        out.push((bucket_start(current, width), aggregator.reduce(&samples)));

        debug!(
            "resampled '{}' to {period} ({aggregator:?}): {} -> {} points",
            self.name(),
            self.len(),
            out.len()
        );

        Ok(ScadaSeries::from_sorted(self.name(), out))
    }

    /// Resample with the mean when a period is given, otherwise clone.
    pub(crate) fn maybe_resample(&self, period: Option<ResamplePeriod>) -> Result<ScadaSeries> {
        match period {
            Some(p) => self.resample(p, Aggregator::Mean),
            None => Ok(self.clone()),
        }
    }
}

fn bucket_index(t: NaiveDateTime, width: i64) -> i64 {
    t.and_utc().timestamp().div_euclid(width)
}

fn bucket_start(index: i64, width: i64) -> NaiveDateTime {
    // Bucket indices come from valid timestamps, so the start is representable.
    DateTime::from_timestamp(index * width, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::series::test_support::{series_every, t0};

    fn period(s: &str) -> ResamplePeriod {
        s.parse().unwrap()
    }

    #[test]
    fn mean_over_aligned_buckets() {
        // 4s samples, 8s buckets starting at midnight.
        let s = series_every(4, &[1.0, 3.0, 5.0, 7.0, 9.0]);
        let r = s.resample(period("8s"), Aggregator::Mean).unwrap();

        assert_eq!(r.len(), 3);
        assert_eq!(r.values().collect::<Vec<_>>(), vec![2.0, 6.0, 9.0]);
        assert_eq!(r.points()[1].0, t0() + Duration::seconds(8));
    }

    #[test]
    fn named_aggregators() {
        let s = series_every(4, &[1.0, 3.0, 5.0, 7.0]);
        let p = period("16s");
        assert_eq!(s.resample(p, Aggregator::Sum).unwrap().values().collect::<Vec<_>>(), vec![16.0]);
        assert_eq!(s.resample(p, Aggregator::Min).unwrap().values().collect::<Vec<_>>(), vec![1.0]);
        assert_eq!(s.resample(p, Aggregator::Max).unwrap().values().collect::<Vec<_>>(), vec![7.0]);
        assert_eq!(s.resample(p, Aggregator::Count).unwrap().values().collect::<Vec<_>>(), vec![4.0]);
    }

    #[test]
    fn empty_buckets_are_emitted() {
        let t = t0();
        let s = ScadaSeries::new("gap", vec![(t, 1.0), (t + Duration::seconds(30), 2.0)]);

        let mean = s.resample(period("10s"), Aggregator::Mean).unwrap();
        assert_eq!(mean.len(), 4);
        let values: Vec<_> = mean.values().collect();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert!(values[2].is_nan());
        assert_eq!(values[3], 2.0);

        let sum = s.resample(period("10s"), Aggregator::Sum).unwrap();
        let values: Vec<_> = sum.values().collect();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan() && values[2].is_nan());
        assert_eq!(values[3], 2.0);
    }

    #[test]
    fn summed_gaps_do_not_read_as_drops() {
        let t = t0();
        let s = ScadaSeries::new("gap", vec![(t, 100.0), (t + Duration::seconds(30), 101.0)]);

        let sum = s.resample(period("10s"), Aggregator::Sum).unwrap();
        let drops = sum.largest_drops(None, 1).unwrap();
        assert_eq!(drops.len(), 1);
        assert!(drops[0].value.is_nan());

        let count = s.resample(period("10s"), Aggregator::Count).unwrap();
        assert!(count.values().nth(1).unwrap().is_nan());
    }

    #[test]
    fn too_many_buckets_is_an_error() {
        let t = t0();
        let s = ScadaSeries::new("sparse", vec![(t, 1.0), (t + Duration::days(365 * 40), 2.0)]);

        let err = s.resample(period("1s"), Aggregator::Mean).unwrap_err();
        assert!(matches!(err, ScadaError::InvalidParameter(_)));
        assert_eq!(s.resample(period("1d"), Aggregator::Mean).unwrap().len(), 14_601);
    }

    #[test]
    fn nan_samples_are_skipped() {
        let s = series_every(4, &[2.0, f64::NAN, 4.0]);
        let r = s.resample(period("1min"), Aggregator::Mean).unwrap();
        assert_eq!(r.values().collect::<Vec<_>>(), vec![3.0]);
    }

    #[test]
    fn empty_in_empty_out() {
        let r = ScadaSeries::empty("e").resample(period("1h"), Aggregator::Mean).unwrap();
        assert!(r.is_empty());
    }
}
