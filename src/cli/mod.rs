//! Command-line parsing for the SCADA series analyser.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the series operations.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Aggregator, ExportFormat, ResamplePeriod, RunConfig, SourceSelection};
use crate::error::ScadaError;
use crate::io::ingest::parse_timestamp;
use crate::series::{DEFAULT_WINDOW_LENGTH, DEFAULT_WINDOW_SECONDS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "scada", version, about = "SCADA wind-farm generation series analyser")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print what was loaded plus basic statistics.
    Summary(SummaryArgs),
    /// Percentage of samples per unit-width value bin.
    Distribution(DistributionArgs),
    /// First differences between consecutive samples.
    Deviation(TableArgs),
    /// The most negative deviations (largest drops), most negative first.
    Drops(DropsArgs),
    /// Samples within +/- N seconds of a stamp.
    Window(WindowArgs),
    /// Rank windowed time-weighted derivative scores to find epoch candidates.
    Epoch(EpochArgs),
    /// Deviation of every sample from the value at an epoch.
    Offsets(OffsetsArgs),
    /// Render an ASCII plot of the series.
    Plot(PlotArgs),
    /// List the named site groups, or summarise each one for a file.
    Groups(GroupsArgs),
    /// Write a synthetic SCADA export (seeded, for demos and tests).
    Synth(SynthArgs),
}

/// Which file and columns to load, and how to shape the result.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// SCADA CSV export.
    #[arg(short, long, env = "SCADA_FILE", value_name = "CSV")]
    pub file: PathBuf,

    /// Named site group (e.g. "Te Apiti", "North Island").
    #[arg(short, long, conflicts_with = "columns")]
    pub group: Option<String>,

    /// Comma-separated column substrings (e.g. TAP,TWF).
    #[arg(short, long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Fail instead of warning when the selection matches no column.
    #[arg(long)]
    pub strict: bool,

    /// Resample into fixed buckets first (e.g. 30s, 10min, 1h).
    #[arg(short, long, value_name = "PERIOD")]
    pub resample: Option<ResamplePeriod>,

    /// Bucket reducer used with --resample.
    #[arg(long, value_enum, default_value_t = Aggregator::Mean)]
    pub aggregator: Aggregator,

    /// Write the command's result to this file.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Export format.
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
}

impl SourceArgs {
    pub fn to_config(&self) -> RunConfig {
        let source = match (&self.group, &self.columns) {
            (Some(group), _) => SourceSelection::Group(group.clone()),
            (None, Some(columns)) => SourceSelection::Columns(columns.clone()),
            (None, None) => SourceSelection::All,
        };
        RunConfig {
            file: self.file.clone(),
            source,
            strict: self.strict,
            resample: self.resample,
            aggregator: self.aggregator,
            export: self.export.clone(),
            export_format: self.format,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Also print the first N rows.
    #[arg(long, value_name = "N")]
    pub head: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct TableArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print at most N rows.
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub head: usize,
}

#[derive(Debug, Args, Clone)]
pub struct DistributionArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Report the running cumulative percentage (% at or below threshold).
    #[arg(long)]
    pub inverse: bool,

    /// Report raw per-bin percentages instead of cumulative ones.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args, Clone)]
pub struct DropsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// How many drops to report.
    #[arg(short = 'n', long, default_value_t = 5)]
    pub count: usize,

    /// Print only the timestamps.
    #[arg(long)]
    pub timestamps_only: bool,
}

#[derive(Debug, Args, Clone)]
pub struct WindowArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Centre stamp, "DD-Mon-YY HH:MM:SS".
    #[arg(long, value_parser = parse_stamp)]
    pub stamp: NaiveDateTime,

    /// Half-width of the window in seconds.
    #[arg(long, default_value_t = DEFAULT_WINDOW_SECONDS, allow_negative_numbers = true)]
    pub seconds: i64,

    /// Plot the window instead of printing a table.
    #[arg(long)]
    pub plot: bool,
}

#[derive(Debug, Args, Clone)]
pub struct EpochArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Samples per window, minus one.
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_LENGTH)]
    pub window: usize,

    /// How many candidates to print.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[derive(Debug, Args, Clone)]
pub struct OffsetsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Reference stamp, "DD-Mon-YY HH:MM:SS". Must be in the series index.
    #[arg(long, value_parser = parse_stamp)]
    pub epoch: NaiveDateTime,

    /// Keep the original timestamps instead of relative seconds.
    #[arg(long)]
    pub absolute: bool,

    /// Print at most N rows.
    #[arg(long, value_name = "N", default_value_t = 40)]
    pub head: usize,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Draw a vertical marker at this stamp.
    #[arg(long, value_parser = parse_stamp)]
    pub marker: Option<NaiveDateTime>,
}

#[derive(Debug, Args, Clone)]
pub struct GroupsArgs {
    /// Summarise every group against this SCADA export.
    #[arg(short, long, value_name = "CSV")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output CSV path.
    #[arg(short, long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of data rows.
    #[arg(short = 'n', long, default_value_t = 900)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Seconds between samples.
    #[arg(long, default_value_t = 4)]
    pub step: i64,

    /// Row at which the fleet-wide ramp-down starts.
    #[arg(long, default_value_t = 600)]
    pub ramp_at: usize,

    /// Disable the ramp-down event.
    #[arg(long)]
    pub no_ramp: bool,

    /// Probability that a cell is left empty.
    #[arg(long, default_value_t = 0.002)]
    pub missing_prob: f64,
}

fn parse_stamp(s: &str) -> Result<NaiveDateTime, ScadaError> {
    parse_timestamp(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_selection() {
        let cli = Cli::parse_from(["scada", "summary", "--file", "x.csv", "--columns", "TAP,TWF"]);
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(
            args.source.to_config().source,
            SourceSelection::Columns(vec!["TAP".to_string(), "TWF".to_string()])
        );

        let cli = Cli::parse_from(["scada", "drops", "-f", "x.csv", "-g", "Te Apiti", "-r", "10min", "-n", "3"]);
        let Command::Drops(args) = cli.command else {
            panic!("expected drops");
        };
        let config = args.source.to_config();
        assert_eq!(config.source, SourceSelection::Group("Te Apiti".to_string()));
        assert_eq!(config.resample.map(|p| p.seconds()), Some(600));
        assert_eq!(args.count, 3);
    }

    #[test]
    fn group_and_columns_conflict() {
        let res = Cli::try_parse_from(["scada", "summary", "-f", "x.csv", "-g", "Te Uku", "-c", "TUK"]);
        assert!(res.is_err());
    }

    #[test]
    fn parses_scada_stamps() {
        let cli = Cli::parse_from(["scada", "window", "-f", "x.csv", "--stamp", "01-Jan-15 00:10:00"]);
        let Command::Window(args) = cli.command else {
            panic!("expected window");
        };
        assert_eq!(args.seconds, DEFAULT_WINDOW_SECONDS);
        assert_eq!(args.stamp, parse_timestamp("01-Jan-15 00:10:00").unwrap());

        assert!(Cli::try_parse_from(["scada", "window", "-f", "x.csv", "--stamp", "2015-01-01"]).is_err());
    }
}
