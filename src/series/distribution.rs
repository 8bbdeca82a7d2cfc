//! Unit-width value distributions.
//!
//! Values are binned into right-closed unit intervals `(e, e + 1]` whose
//! edges run from `floor(min) - 1` to `ceil(max)`. Each bin is labeled by its
//! right edge, so a threshold `x` reports the samples in `(x - 1, x]`.

use log::debug;

use crate::domain::{DistributionOptions, DistributionPoint};
use crate::error::{Result, ScadaError};

use super::ScadaSeries;

/// Upper bound on the unit bins one distribution may allocate.
pub const MAX_DISTRIBUTION_BINS: usize = 1_000_000;

impl ScadaSeries {
    /// Percentage of samples per unit bin, optionally cumulative.
    ///
    /// - `cumulative && inverse`: running sum, non-decreasing in threshold
    /// - `cumulative && !inverse`: `100 - running sum`, non-increasing
    /// - `!cumulative`: raw per-bin percentages
    ///
    /// Fails with `InvalidParameter` when the value range needs more than
    /// [`MAX_DISTRIBUTION_BINS`] bins.
    pub fn output_distribution(&self, options: &DistributionOptions) -> Result<Vec<DistributionPoint>> {
        let source = self.maybe_resample(options.resample)?;
        let values = source.finite_values();
        if values.is_empty() {
            return Err(ScadaError::EmptyInput(format!(
                "series '{}' has no finite samples to bin",
                self.name()
            )));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let lowest_edge = min.floor() - 1.0;
        let span = max.ceil() - lowest_edge;
        if span > MAX_DISTRIBUTION_BINS as f64 {
            return Err(ScadaError::InvalidParameter(format!(
                "values of '{}' span [{min}, {max}], more than {MAX_DISTRIBUTION_BINS} unit bins",
                self.name()
            )));
        }
        let bin_count = span as usize;

        let mut counts = vec![0usize; bin_count];
        for v in &values {
            // Bin `k` covers (lowest_edge + k, lowest_edge + k + 1].
            let k = (v - lowest_edge).ceil() as usize - 1;
            counts[k.min(bin_count - 1)] += 1;
        }

        let total = values.len() as f64;
        let mut running = 0.0;
        let out: Vec<DistributionPoint> = counts
            .iter()
            .enumerate()
            .map(|(k, &count)| {
                let percentage = 100.0 * count as f64 / total;
                running += percentage;
                let percentage = match (options.cumulative, options.inverse) {
                    (false, _) => percentage,
                    (true, true) => running,
                    (true, false) => 100.0 - running,
                };
                DistributionPoint {
                    threshold: lowest_edge + (k + 1) as f64,
                    percentage,
                }
            })
            .collect();

        debug!(
            "distribution of '{}': {} samples over {} bins",
            self.name(),
            values.len(),
            out.len()
        );

        Ok(out)
    }
}
