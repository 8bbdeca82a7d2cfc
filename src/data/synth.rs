//! Synthetic SCADA export generation.
//!
//! Produces a wind-farm generation log in the same shape as a real SCADA
//! export: a `Timestamp` column followed by one MW column per farm. Output
//! follows a seeded, mean-reverting capacity-factor walk per farm, with an
//! optional fleet-wide ramp-down event and occasional missing cells.

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::info;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::{Result, ScadaError};
use crate::io::ingest::{TIMESTAMP_COLUMN, format_timestamp};

/// Long-run capacity factor the walk reverts to.
const MEAN_CAPACITY_FACTOR: f64 = 0.45;

/// Pull towards the long-run mean per step.
const REVERSION: f64 = 0.02;

/// Capacity factor the fleet settles at after a ramp-down.
const RAMP_FLOOR: f64 = 0.15;

/// One generated column.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthFarm {
    pub column: String,
    pub capacity_mw: f64,
}

impl SynthFarm {
    pub fn new(column: impl Into<String>, capacity_mw: f64) -> Self {
        Self {
            column: column.into(),
            capacity_mw,
        }
    }
}

/// Columns covering every named site group.
pub fn default_farms() -> Vec<SynthFarm> {
    vec![
        SynthFarm::new("TAP_MW", 90.0),
        SynthFarm::new("TWF_MW", 68.0),
        SynthFarm::new("TWC_MW", 93.0),
        SynthFarm::new("TRH_MW", 2.0),
        SynthFarm::new("WWD_MW", 143.0),
        SynthFarm::new("TUK_MW", 55.0),
        SynthFarm::new("MAH_MW", 36.0),
        SynthFarm::new("WHL_MW", 58.0),
    ]
}

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub rows: usize,
    pub start: NaiveDateTime,
    pub step_seconds: i64,
    pub seed: u64,
    pub farms: Vec<SynthFarm>,
    /// Std dev of the per-step capacity-factor shock.
    pub volatility: f64,
    /// Row at which every farm starts ramping down.
    pub ramp_down_at: Option<usize>,
    /// Rows the ramp-down takes to reach its floor.
    pub ramp_rows: usize,
    /// Probability that any one cell is left empty.
    pub missing_prob: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            rows: 900,
            start,
            step_seconds: 4,
            seed: 42,
            farms: default_farms(),
            volatility: 0.01,
            ramp_down_at: Some(600),
            ramp_rows: 30,
            missing_prob: 0.002,
        }
    }
}

/// Generated rows, one value per farm (NaN for a missing cell).
#[derive(Debug, Clone)]
pub struct SynthExport {
    pub columns: Vec<String>,
    pub rows: Vec<(NaiveDateTime, Vec<f64>)>,
}

pub fn generate(config: &SynthConfig) -> Result<SynthExport> {
    if config.rows == 0 {
        return Err(ScadaError::InvalidParameter("row count must be > 0".to_string()));
    }
    if config.step_seconds <= 0 {
        return Err(ScadaError::InvalidParameter("sample step must be > 0 seconds".to_string()));
    }
    if config.farms.is_empty() {
        return Err(ScadaError::InvalidParameter("at least one farm column is required".to_string()));
    }
    if !(0.0..1.0).contains(&config.missing_prob) {
        return Err(ScadaError::InvalidParameter(format!(
            "missing probability must be in [0, 1), got {}",
            config.missing_prob
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let shock = Normal::new(0.0, config.volatility)
        .map_err(|e| ScadaError::InvalidParameter(format!("noise distribution error: {e}")))?;

    let mut factors: Vec<f64> = config
        .farms
        .iter()
        .map(|_| rng.gen_range(0.3..0.6))
        .collect();

    let step = Duration::seconds(config.step_seconds);
    let mut stamp = config.start;
    let mut rows = Vec::with_capacity(config.rows);

    for row in 0..config.rows {
        let ramp = ramp_multiplier(row, config.ramp_down_at, config.ramp_rows);

        let values = config
            .farms
            .iter()
            .zip(factors.iter_mut())
            .map(|(farm, factor)| {
                *factor += REVERSION * (MEAN_CAPACITY_FACTOR - *factor) + shock.sample(&mut rng);
                *factor = factor.clamp(0.0, 1.0);

                if rng.gen_bool(config.missing_prob) {
                    f64::NAN
                } else {
                    round_mw(farm.capacity_mw * *factor * ramp)
                }
            })
            .collect();

        rows.push((stamp, values));
        stamp += step;
    }

    Ok(SynthExport {
        columns: config.farms.iter().map(|f| f.column.clone()).collect(),
        rows,
    })
}

/// Generate and write a SCADA-format CSV. Returns the number of data rows.
pub fn write_synthetic_csv(path: &Path, config: &SynthConfig) -> Result<usize> {
    let export = generate(config)?;

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| ScadaError::Export(format!("failed to create '{}': {e}", path.display())))?;

    let header = std::iter::once(TIMESTAMP_COLUMN.to_string()).chain(export.columns.iter().cloned());
    writer
        .write_record(header)
        .map_err(|e| ScadaError::Export(format!("failed to write CSV header: {e}")))?;

    for (stamp, values) in &export.rows {
        let cells = std::iter::once(format_timestamp(*stamp)).chain(
            values
                .iter()
                .map(|v| if v.is_nan() { String::new() } else { v.to_string() }),
        );
        writer
            .write_record(cells)
            .map_err(|e| ScadaError::Export(format!("failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| ScadaError::Export(format!("failed to flush CSV: {e}")))?;

    info!(
        "wrote {} synthetic rows x {} columns to '{}'",
        export.rows.len(),
        export.columns.len(),
        path.display()
    );
    Ok(export.rows.len())
}

/// Linear fade from 1 to `RAMP_FLOOR` over `ramp_rows`, starting at `start`.
fn ramp_multiplier(row: usize, start: Option<usize>, ramp_rows: usize) -> f64 {
    let Some(start) = start else { return 1.0 };
    if row < start {
        return 1.0;
    }
    let progress = if ramp_rows == 0 {
        1.0
    } else {
        ((row - start) as f64 / ramp_rows as f64).min(1.0)
    };
    1.0 - progress * (1.0 - RAMP_FLOOR)
}

fn round_mw(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::io::ingest::{load, load_named_group, read_columns};

    fn small() -> SynthConfig {
        SynthConfig {
            rows: 120,
            ramp_down_at: Some(60),
            ramp_rows: 10,
            missing_prob: 0.0,
            ..SynthConfig::default()
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate(&small()).unwrap();
        let b = generate(&small()).unwrap();
        assert_eq!(a.rows, b.rows);

        let c = generate(&SynthConfig { seed: 7, ..small() }).unwrap();
        assert_ne!(a.rows, c.rows);
    }

    #[test]
    fn values_stay_within_capacity() {
        let config = small();
        let export = generate(&config).unwrap();
        for (_, values) in &export.rows {
            for (v, farm) in values.iter().zip(&config.farms) {
                assert!(*v >= 0.0 && *v <= farm.capacity_mw + 1e-9);
            }
        }
    }

    #[test]
    fn ramp_multiplier_fades_to_floor() {
        assert_eq!(ramp_multiplier(10, None, 5), 1.0);
        assert_eq!(ramp_multiplier(4, Some(5), 5), 1.0);
        assert_eq!(ramp_multiplier(5, Some(5), 5), 1.0);
        assert!((ramp_multiplier(10, Some(5), 5) - RAMP_FLOOR).abs() < 1e-12);
        assert!((ramp_multiplier(100, Some(5), 0) - RAMP_FLOOR).abs() < 1e-12);
    }

    #[test]
    fn written_export_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("synth.csv");
        let rows = write_synthetic_csv(&path, &small()).unwrap();
        assert_eq!(rows, 120);

        assert_eq!(read_columns(&path).unwrap().len(), default_farms().len());

        let all = load::<&str>(&path, None).unwrap();
        assert_eq!(all.len(), 120);
        assert!(all.values().all(f64::is_finite));

        let tap = load_named_group(&path, "Te Apiti").unwrap();
        let north = load_named_group(&path, "North Island").unwrap();
        assert!(tap.values().zip(north.values()).all(|(a, b)| a <= b + 1e-9));
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(generate(&SynthConfig { rows: 0, ..small() }).is_err());
        assert!(generate(&SynthConfig { farms: vec![], ..small() }).is_err());
        assert!(generate(&SynthConfig { missing_prob: 1.5, ..small() }).is_err());
    }
}
