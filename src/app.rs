//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - loads and resamples the selected SCADA columns
//! - runs one analysis and prints it
//! - writes optional exports

use clap::Parser;
use log::{debug, info};

use crate::cli::{
    Cli, Command, DistributionArgs, DropsArgs, EpochArgs, GroupsArgs, OffsetsArgs, PlotArgs, SummaryArgs, SynthArgs,
    TableArgs, WindowArgs,
};
use crate::data::{SynthConfig, write_synthetic_csv};
use crate::domain::DistributionOptions;
use crate::error::AppError;
use crate::io::groups::SITE_GROUPS;
use crate::series::EpochDeviation;

pub mod pipeline;

use pipeline::{Export, export, load_source};

/// Entry point for the `scada` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `scada -f farm.csv` behaves like `scada summary -f farm.csv`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Summary(args) => handle_summary(args),
        Command::Distribution(args) => handle_distribution(args),
        Command::Deviation(args) => handle_deviation(args),
        Command::Drops(args) => handle_drops(args),
        Command::Window(args) => handle_window(args),
        Command::Epoch(args) => handle_epoch(args),
        Command::Offsets(args) => handle_offsets(args),
        Command::Plot(args) => handle_plot(args),
        Command::Groups(args) => handle_groups(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the default `warn` level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = args.source.to_config();
    let loaded = load_source(&config)?;

    print!("{}", crate::report::format_summary(&loaded.series, &loaded.report));
    if let Some(head) = args.head {
        println!();
        print!("{}", crate::report::format_series_table(&loaded.series, Some(head)));
    }

    export(&config, Export::Series(&loaded.series))
}

fn handle_distribution(args: DistributionArgs) -> Result<(), AppError> {
    let config = args.source.to_config();
    let loaded = load_source(&config)?;

    // Resampling already happened in `load_source` with the chosen reducer.
    let options = DistributionOptions {
        resample: None,
        inverse: args.inverse,
        cumulative: !args.raw,
    };
    let points = loaded.series.output_distribution(&options)?;
    debug!("{} distribution bins", points.len());

    print!("{}", crate::report::format_distribution(&points, &options));
    export(&config, Export::Distribution(&points))
}

fn handle_deviation(args: TableArgs) -> Result<(), AppError> {
    let config = args.source.to_config();
    let loaded = load_source(&config)?;

    let deviation = loaded.series.deviation(None)?;
    print!("{}", crate::report::format_series_table(&deviation, Some(args.head)));
    export(&config, Export::Series(&deviation))
}

fn handle_drops(args: DropsArgs) -> Result<(), AppError> {
    let config = args.source.to_config();
    let loaded = load_source(&config)?;

    let drops = loaded.series.largest_drops(None, args.count)?;
    if args.timestamps_only {
        let stamps: Vec<_> = drops.iter().map(|d| d.timestamp).collect();
        print!("{}", crate::report::format_stamps(&stamps));
    } else {
        print!("{}", crate::report::format_drops(&drops));
    }

    export(&config, Export::Drops(&drops))
}

fn handle_window(args: WindowArgs) -> Result<(), AppError> {
    let config = args.source.to_config();
    let loaded = load_source(&config)?;

    let window = loaded.series.sample_from_stamp(args.stamp, args.seconds);
    info!("{} samples within {}s of the stamp", window.len(), args.seconds);

    if args.plot {
        println!("{}", crate::plot::render_series_plot(&window, 100, 25, Some(args.stamp)));
    } else {
        print!("{}", crate::report::format_series_table(&window, None));
    }

    export(&config, Export::Series(&window))
}

fn handle_epoch(args: EpochArgs) -> Result<(), AppError> {
    let config = args.source.to_config();
    let loaded = load_source(&config)?;

    let scores = loaded.series.find_epoch_default(args.window);
    let candidates = loaded.series.strongest_epochs(args.window, args.top);
    print!("{}", crate::report::format_epochs(&candidates, args.window));

    export(&config, Export::Series(&scores))
}

fn handle_offsets(args: OffsetsArgs) -> Result<(), AppError> {
    let config = args.source.to_config();
    let loaded = load_source(&config)?;

    match loaded.series.epoch_deviation(args.epoch, !args.absolute)? {
        EpochDeviation::Relative(points) => {
            let shown = &points[..points.len().min(args.head)];
            print!("{}", crate::report::format_relative(shown, args.epoch));
            if points.len() > shown.len() {
                println!("... ({} more)", points.len() - shown.len());
            }
            export(&config, Export::Relative(&points))
        }
        EpochDeviation::Absolute(series) => {
            print!("{}", crate::report::format_series_table(&series, Some(args.head)));
            export(&config, Export::Series(&series))
        }
    }
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let config = args.source.to_config();
    let loaded = load_source(&config)?;

    println!(
        "{}",
        crate::plot::render_series_plot(&loaded.series, args.width, args.height, args.marker)
    );
    export(&config, Export::Series(&loaded.series))
}

fn handle_groups(args: GroupsArgs) -> Result<(), AppError> {
    let Some(file) = args.file else {
        for (name, selectors) in SITE_GROUPS {
            println!("{name:<14} {}", selectors.join(","));
        }
        return Ok(());
    };

    let rows = pipeline::summarize_groups(&file)?;
    print!("{}", crate::report::format_groups(&rows));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(&args);
    let rows = write_synthetic_csv(&args.out, &config)?;
    println!("Wrote {rows} rows to {}", args.out.display());
    Ok(())
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    SynthConfig {
        rows: args.rows,
        step_seconds: args.step,
        seed: args.seed,
        ramp_down_at: (!args.no_ramp).then_some(args.ramp_at),
        missing_prob: args.missing_prob,
        ..SynthConfig::default()
    }
}

/// Rewrite argv so a bare flag list defaults to `summary`.
///
/// Rules:
/// - `scada -f x.csv ...`          -> `scada summary -f x.csv ...`
/// - `scada --help/--version/-h`   -> unchanged (show top-level help/version)
/// - anything else                 -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version");
    if is_top_level_help_or_version {
        return argv;
    }

    // `-v` is global and still needs a subcommand after it.
    let is_verbosity = arg1 == "--verbose" || (arg1.starts_with("-v") && !arg1.starts_with("--"));
    if arg1.starts_with('-') && !is_verbosity {
        argv.insert(1, "summary".to_string());
    }

    argv
}
