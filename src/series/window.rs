//! Sub-series around a reference stamp.

use chrono::{Duration, NaiveDateTime};

use super::ScadaSeries;

/// Default half-width of `sample_from_stamp`, in seconds.
pub const DEFAULT_WINDOW_SECONDS: i64 = 600;

impl ScadaSeries {
    /// Samples with timestamps in `[stamp - seconds, stamp + seconds]`.
    ///
    /// Negative widths and ranges with no samples give an empty series.
    pub fn sample_from_stamp(&self, stamp: NaiveDateTime, seconds: i64) -> ScadaSeries {
        if seconds < 0 {
            return ScadaSeries::empty(self.name());
        }

        let half = Duration::seconds(seconds);
        let (Some(lo), Some(hi)) = (stamp.checked_sub_signed(half), stamp.checked_add_signed(half)) else {
            return ScadaSeries::empty(self.name());
        };

        self.between(lo, hi)
    }

    /// Samples with timestamps in `[lo, hi]`.
    pub fn between(&self, lo: NaiveDateTime, hi: NaiveDateTime) -> ScadaSeries {
        let points = self.points();
        let start = points.partition_point(|&(t, _)| t < lo);
        let end = points.partition_point(|&(t, _)| t <= hi);
        if start >= end {
            return ScadaSeries::empty(self.name());
        }
        ScadaSeries::from_sorted(self.name(), points[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_support::{series_every, t0};

    #[test]
    fn inclusive_bounds() {
        // Samples every 4s from t0 to t0 + 36s.
        let s = series_every(4, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let stamp = t0() + Duration::seconds(16);

        let w = s.sample_from_stamp(stamp, 8);
        assert_eq!(w.values().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0, 5.0, 6.0]);

        let lo = stamp - Duration::seconds(8);
        let hi = stamp + Duration::seconds(8);
        assert!(w.timestamps().all(|t| t >= lo && t <= hi));
    }

    #[test]
    fn default_width_covers_ten_minutes_each_side() {
        let values: Vec<f64> = (0..400).map(f64::from).collect();
        let s = series_every(4, &values);
        let stamp = t0() + Duration::seconds(800);

        let w = s.sample_from_stamp(stamp, DEFAULT_WINDOW_SECONDS);
        assert_eq!(w.first().unwrap().0, t0() + Duration::seconds(200));
        assert_eq!(w.last().unwrap().0, t0() + Duration::seconds(1_400));
    }

    #[test]
    fn out_of_range_is_empty() {
        let s = series_every(4, &[1.0, 2.0]);
        assert!(s.sample_from_stamp(t0() + Duration::hours(1), 60).is_empty());
        assert!(s.sample_from_stamp(t0(), -1).is_empty());
        assert!(ScadaSeries::empty("e").sample_from_stamp(t0(), 600).is_empty());
    }
}
