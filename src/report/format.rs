//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the series operations stay free of presentation concerns
//! - output changes are localized (important for snapshot tests)

use chrono::NaiveDateTime;

use crate::domain::{DistributionOptions, DistributionPoint, DropEvent, RelativePoint};
use crate::io::ingest::{LoadReport, format_timestamp};
use crate::series::{ScadaSeries, SeriesStats};

/// One row of the `groups` overview.
#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub name: String,
    pub selectors: Vec<String>,
    pub columns: usize,
    pub stats: Option<SeriesStats>,
}

/// Header block: what was loaded and its basic statistics.
pub fn format_summary(series: &ScadaSeries, report: &LoadReport) -> String {
    let mut out = String::new();

    out.push_str("=== scada - SCADA series summary ===\n");
    out.push_str(&format!("Series: {}\n", series.name()));
    out.push_str(&format!(
        "Columns: {}/{} selected\n",
        report.selected_columns.len(),
        report.sensor_columns.len()
    ));
    if !report.selected_columns.is_empty() {
        out.push_str(&format!("  {}\n", report.selected_columns.join(", ")));
    }
    out.push_str(&format!("Rows: {}", report.rows_read));
    if report.malformed_cells > 0 {
        out.push_str(&format!(" ({} malformed cells treated as missing)", report.malformed_cells));
    }
    out.push('\n');

    match series.stats() {
        Some(stats) => out.push_str(&format_stats(&stats)),
        None => out.push_str("No finite samples.\n"),
    }

    out
}

pub fn format_stats(stats: &SeriesStats) -> String {
    format!(
        "Range: {} .. {}\nPoints: n={} (NaN={}) | min={:.2} max={:.2} mean={:.2}\n",
        format_timestamp(stats.start),
        format_timestamp(stats.end),
        stats.len,
        stats.nan_count,
        stats.min,
        stats.max,
        stats.mean,
    )
}

pub fn format_distribution(points: &[DistributionPoint], options: &DistributionOptions) -> String {
    let mut out = String::new();

    let label = match (options.cumulative, options.inverse) {
        (false, _) => "% in bin",
        (true, true) => "% <= threshold",
        (true, false) => "% > threshold",
    };
    if let Some(period) = options.resample {
        out.push_str(&format!("Resampled: {period} mean\n"));
    }
    out.push_str(&format!("{:>12} {:>16}\n", "threshold", label));
    out.push_str(&format!("{:-<12} {:-<16}\n", "", ""));
    for p in points {
        out.push_str(&format!("{:>12.0} {:>16.3}\n", p.threshold, p.percentage));
    }

    out
}

pub fn format_drops(drops: &[DropEvent]) -> String {
    let mut out = String::new();

    out.push_str("Largest drops (most negative first):\n");
    out.push_str(&format!("{:<20} {:>12}\n", "timestamp", "deviation"));
    out.push_str(&format!("{:-<20} {:-<12}\n", "", ""));
    for d in drops {
        out.push_str(&format!("{:<20} {:>12.3}\n", format_timestamp(d.timestamp), d.value));
    }

    out
}

pub fn format_stamps(stamps: &[NaiveDateTime]) -> String {
    let mut out = String::new();
    for t in stamps {
        out.push_str(&format_timestamp(*t));
        out.push('\n');
    }
    out
}

/// Timestamp/value table; `limit` caps the rows printed.
pub fn format_series_table(series: &ScadaSeries, limit: Option<usize>) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<20} {:>12}\n", "timestamp", truncate(series.name(), 12)));
    out.push_str(&format!("{:-<20} {:-<12}\n", "", ""));

    let shown = limit.unwrap_or(usize::MAX);
    for &(t, v) in series.points().iter().take(shown) {
        out.push_str(&format!("{:<20} {:>12}\n", format_timestamp(t), fmt_value(v)));
    }
    if series.len() > shown {
        out.push_str(&format!("... ({} more)\n", series.len() - shown));
    }

    out
}

pub fn format_epochs(candidates: &[(NaiveDateTime, f64)], window_length: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Epoch candidates (window={window_length}, steepest time-weighted fall first):\n"
    ));
    out.push_str(&format!("{:<20} {:>12}\n", "timestamp", "rate"));
    out.push_str(&format!("{:-<20} {:-<12}\n", "", ""));
    for &(t, v) in candidates {
        out.push_str(&format!("{:<20} {:>12.4}\n", format_timestamp(t), v));
    }

    out
}

pub fn format_relative(points: &[RelativePoint], epoch: NaiveDateTime) -> String {
    let mut out = String::new();

    out.push_str(&format!("Relative to epoch {}:\n", format_timestamp(epoch)));
    out.push_str(&format!("{:>10} {:>12}\n", "seconds", "delta"));
    out.push_str(&format!("{:-<10} {:-<12}\n", "", ""));
    for p in points {
        out.push_str(&format!("{:>+10} {:>12}\n", p.seconds, fmt_value(p.value)));
    }

    out
}

pub fn format_groups(rows: &[GroupSummary]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<14} {:<28} {:>4} {:>10} {:>10} {:>10}\n",
        "group", "selectors", "cols", "min", "max", "mean"
    ));
    out.push_str(&format!(
        "{:-<14} {:-<28} {:-<4} {:-<10} {:-<10} {:-<10}\n",
        "", "", "", "", "", ""
    ));
    for row in rows {
        let (min, max, mean) = match &row.stats {
            Some(s) => (fmt_value(s.min), fmt_value(s.max), fmt_value(s.mean)),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        let line = format!(
            "{:<14} {:<28} {:>4} {:>10} {:>10} {:>10}",
            truncate(&row.name, 14),
            truncate(&row.selectors.join(","), 28),
            row.columns,
            min,
            max,
            mean,
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() { "NaN".to_string() } else { format!("{v:.2}") }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
