//! Shared load/export logic used by every subcommand.
//!
//! Each command follows the same shape:
//! load (+ optional strict check) -> optional resample -> analysis -> print -> optional export
//!
//! Commands only differ in the analysis and presentation steps.

use std::path::Path;

use log::{debug, info};
use rayon::prelude::*;

use crate::domain::{DistributionPoint, DropEvent, ExportFormat, RelativePoint, RunConfig, SourceSelection};
use crate::error::{AppError, ScadaError};
use crate::io::export::{write_distribution_csv, write_drops_csv, write_json, write_relative_csv, write_series_csv};
use crate::io::groups::{SITE_GROUPS, group_selectors};
use crate::io::ingest::{LoadReport, load_selection, load_with_report, read_columns, require_match};
use crate::report::GroupSummary;
use crate::series::ScadaSeries;

/// A loaded (and possibly resampled) series plus what the load saw.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub series: ScadaSeries,
    pub report: LoadReport,
}

/// Load the configured selection, then resample with the configured reducer.
pub fn load_source(config: &RunConfig) -> Result<LoadedSource, AppError> {
    if config.strict {
        check_selection(&config.file, &config.source)?;
    }

    let (series, report) = load_selection(&config.file, &config.source)?;

    let series = match config.resample {
        Some(period) => {
            let resampled = series.resample(period, config.aggregator)?;
            info!(
                "resampled {} -> {} points ({period} {:?})",
                series.len(),
                resampled.len(),
                config.aggregator
            );
            resampled
        }
        None => series,
    };

    Ok(LoadedSource { series, report })
}

fn check_selection(path: &Path, source: &SourceSelection) -> Result<(), ScadaError> {
    let columns = read_columns(path)?;
    let matched = match source {
        SourceSelection::All => require_match::<_, &str>(columns.as_slice(), None)?,
        SourceSelection::Columns(selectors) => require_match(columns.as_slice(), Some(selectors.as_slice()))?,
        SourceSelection::Group(group) => {
            let selectors = group_selectors(group)
                .ok_or_else(|| ScadaError::NoMatch(format!("unknown site group '{group}'")))?;
            require_match(columns.as_slice(), Some(selectors))?
        }
    };
    debug!("strict selection matched {matched:?}");
    Ok(())
}

/// One analysis result, ready for export.
#[derive(Debug, Clone, Copy)]
pub enum Export<'a> {
    Series(&'a ScadaSeries),
    Distribution(&'a [DistributionPoint]),
    Drops(&'a [DropEvent]),
    Relative(&'a [RelativePoint]),
}

/// Write `output` to `--export` (if set) in the configured format.
pub fn export(config: &RunConfig, output: Export<'_>) -> Result<(), AppError> {
    let Some(path) = &config.export else {
        return Ok(());
    };

    match (config.export_format, output) {
        (ExportFormat::Csv, Export::Series(s)) => write_series_csv(path, s)?,
        (ExportFormat::Csv, Export::Distribution(p)) => write_distribution_csv(path, p)?,
        (ExportFormat::Csv, Export::Drops(d)) => write_drops_csv(path, d)?,
        (ExportFormat::Csv, Export::Relative(r)) => write_relative_csv(path, r)?,
        (ExportFormat::Json, Export::Series(s)) => write_json(path, s)?,
        (ExportFormat::Json, Export::Distribution(p)) => write_json(path, p)?,
        (ExportFormat::Json, Export::Drops(d)) => write_json(path, d)?,
        (ExportFormat::Json, Export::Relative(r)) => write_json(path, r)?,
    }

    info!("wrote {}", path.display());
    Ok(())
}

/// Load every named site group from `path` in parallel.
pub fn summarize_groups(path: &Path) -> Result<Vec<GroupSummary>, ScadaError> {
    SITE_GROUPS
        .par_iter()
        .map(|&(name, selectors)| {
            let (series, report) = load_with_report(path, Some(selectors))?;
            Ok(GroupSummary {
                name: name.to_string(),
                selectors: selectors.iter().map(|s| s.to_string()).collect(),
                columns: report.selected_columns.len(),
                stats: series.stats(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, tempdir};

    use super::*;
    use crate::domain::{Aggregator, ResamplePeriod};

    const SAMPLE: &str = "\
Timestamp,TAP_MW,TWF_MW,WHL_MW
01-Jan-15 00:00:00,10,20,1
01-Jan-15 00:00:04,12,,2
01-Jan-15 00:00:08,14,22,3
01-Jan-15 00:00:12,16,24,4
";

    fn sample_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    fn config(file: &Path, source: SourceSelection) -> RunConfig {
        RunConfig {
            file: file.to_path_buf(),
            source,
            strict: false,
            resample: None,
            aggregator: Aggregator::Mean,
            export: None,
            export_format: ExportFormat::Csv,
        }
    }

    #[test]
    fn loads_and_resamples_with_reducer() {
        let file = sample_file();
        let mut cfg = config(file.path(), SourceSelection::Columns(vec!["TAP".to_string()]));
        cfg.resample = ResamplePeriod::from_seconds(8).ok();
        cfg.aggregator = Aggregator::Max;

        let loaded = load_source(&cfg).unwrap();
        assert_eq!(loaded.report.rows_read, 4);
        let values: Vec<f64> = loaded.series.values().collect();
        assert_eq!(values, vec![12.0, 16.0]);
    }

    #[test]
    fn strict_rejects_unmatched_selection() {
        let file = sample_file();
        let mut cfg = config(file.path(), SourceSelection::Group("Nowhere".to_string()));

        // Lenient: loads with zero columns.
        let loaded = load_source(&cfg).unwrap();
        assert!(loaded.report.selected_columns.is_empty());

        cfg.strict = true;
        let err = load_source(&cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn summarizes_every_group() {
        let file = sample_file();
        let rows = summarize_groups(file.path()).unwrap();
        assert_eq!(rows.len(), SITE_GROUPS.len());

        let te_apiti = rows.iter().find(|r| r.name == "Te Apiti").unwrap();
        assert_eq!(te_apiti.columns, 1);
        assert_eq!(te_apiti.stats.as_ref().map(|s| s.max), Some(16.0));
    }

    #[test]
    fn export_follows_format() {
        let file = sample_file();
        let dir = tempdir().unwrap();
        let out = dir.path().join("series.json");

        let mut cfg = config(file.path(), SourceSelection::All);
        cfg.export = Some(out.clone());
        cfg.export_format = ExportFormat::Json;

        let loaded = load_source(&cfg).unwrap();
        export(&cfg, Export::Series(&loaded.series)).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let back: ScadaSeries = serde_json::from_str(&text).unwrap();
        assert_eq!(back.len(), 4);
    }
}
