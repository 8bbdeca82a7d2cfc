//! Export derived results to CSV or JSON.
//!
//! CSV exports reuse the SCADA timestamp format so a written series can be
//! loaded back with `io::ingest::load`.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{DistributionPoint, DropEvent, RelativePoint};
use crate::error::{Result, ScadaError};
use crate::io::ingest::{TIMESTAMP_COLUMN, format_timestamp};
use crate::series::ScadaSeries;

/// Write `Timestamp,<series name>` rows.
pub fn write_series_csv(path: &Path, series: &ScadaSeries) -> Result<()> {
    let mut writer = csv_writer(path)?;
    write_row(&mut writer, [TIMESTAMP_COLUMN, series.name()])?;
    for &(t, v) in series.points() {
        write_row(&mut writer, [format_timestamp(t), format_value(v)])?;
    }
    finish(writer)
}

/// Write `threshold,percentage` rows.
pub fn write_distribution_csv(path: &Path, points: &[DistributionPoint]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    write_row(&mut writer, ["threshold", "percentage"])?;
    for p in points {
        write_row(&mut writer, [format_value(p.threshold), format_value(p.percentage)])?;
    }
    finish(writer)
}

/// Write `Timestamp,deviation` rows.
pub fn write_drops_csv(path: &Path, drops: &[DropEvent]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    write_row(&mut writer, [TIMESTAMP_COLUMN, "deviation"])?;
    for d in drops {
        write_row(&mut writer, [format_timestamp(d.timestamp), format_value(d.value)])?;
    }
    finish(writer)
}

/// Write `seconds,value` rows.
pub fn write_relative_csv(path: &Path, points: &[RelativePoint]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    write_row(&mut writer, ["seconds", "value"])?;
    for p in points {
        write_row(&mut writer, [p.seconds.to_string(), format_value(p.value)])?;
    }
    finish(writer)
}

/// Pretty-printed JSON of any serializable result. NaN values are written as `null`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| ScadaError::Export(format!("failed to create '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| ScadaError::Export(format!("failed to write JSON '{}': {e}", path.display())))
}

/// NaN is written as an empty cell, matching how missing values are read.
fn format_value(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>> {
    csv::Writer::from_path(path)
        .map_err(|e| ScadaError::Export(format!("failed to create '{}': {e}", path.display())))
}

fn write_row<I, T>(writer: &mut csv::Writer<File>, row: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(row)
        .map_err(|e| ScadaError::Export(format!("failed to write CSV row: {e}")))
}

fn finish(mut writer: csv::Writer<File>) -> Result<()> {
    writer
        .flush()
        .map_err(|e| ScadaError::Export(format!("failed to flush CSV: {e}")))
}
