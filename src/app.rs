//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the data source
//! - runs the aggregation pipeline
//! - dispatches to the report / export / TUI front-ends

use clap::Parser;

use crate::cli::{Cli, Command, ExportArgs, RunArgs};
use crate::data::DataSource;
use crate::domain::{RunConfig, SparkPolicy};
use crate::error::AppError;
use crate::io::snapshot::SnapshotFile;

pub mod pipeline;

/// Entry point for the `ote` binary.
pub fn run() -> Result<(), AppError> {
    // We want plain `ote` and `ote --sample` to behave like `ote report ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Tui(args) => handle_tui(args),
        Command::Export(args) => handle_export(args),
    }
}

fn handle_report(args: RunArgs) -> Result<(), AppError> {
    let source = source_from_args(&args)?;
    let config = run_config_from_args(&args)?;
    let output = pipeline::run(&source, &config)?;

    println!("{}", crate::report::format_run_summary(&output, &config));
    println!("{}", crate::report::format_monthly_table(&output.derived.monthly, &config));
    println!("{}", crate::report::format_spark_table(&output.derived.spark_monthly, &config));
    println!(
        "{}",
        crate::report::format_regulation_table(&output.derived.regulation_monthly, &config)
    );
    println!("{}", crate::report::format_dam_im_table(&output.derived.dam_vs_im, &config));
    println!("{}", crate::report::format_negative_table(&output.derived.negative_months));
    println!(
        "{}",
        crate::report::format_year_over_year_table(&output.derived.year_over_year, &config)
    );
    println!("{}", crate::report::format_load_report(&output.load_report));

    Ok(())
}

fn handle_tui(args: RunArgs) -> Result<(), AppError> {
    let source = source_from_args(&args)?;
    let config = run_config_from_args(&args)?;
    crate::tui::run(&source, config)
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let source = source_from_args(&args.run)?;
    let config = run_config_from_args(&args.run)?;
    let output = pipeline::run(&source, &config)?;
    let d = &output.derived;

    std::fs::create_dir_all(&args.out_dir).map_err(|e| {
        AppError::runtime(format!(
            "Failed to create export directory '{}': {e}",
            args.out_dir.display()
        ))
    })?;

    crate::io::export::write_daily_csv(&args.out_dir.join("daily_prices.csv"), &d.daily, &d.daily_ma)?;
    crate::io::export::write_monthly_csv(&args.out_dir.join("monthly_prices.csv"), &d.monthly)?;
    crate::io::export::write_spark_csv(&args.out_dir.join("spark_spread.csv"), &d.spark_daily)?;
    crate::io::export::write_regulation_csv(
        &args.out_dir.join("regulation_revenue.csv"),
        &d.regulation_monthly,
    )?;
    crate::io::export::write_dam_im_csv(&args.out_dir.join("dam_vs_im.csv"), &d.dam_vs_im)?;
    crate::io::export::write_weekday_csv(&args.out_dir.join("weekday_profile.csv"), &d.weekday_split)?;
    crate::io::export::write_heatmap_csv(&args.out_dir.join("price_heatmap.csv"), &d.heatmap)?;
    crate::io::export::write_threshold_csv(&args.out_dir.join("threshold_days.csv"), &d.threshold_days)?;
    crate::io::export::write_savings_csv(&args.out_dir.join("cumulative_savings.csv"), &d.savings)?;

    if let Some(path) = &args.snapshot {
        // Overwriting a snapshot taken in a different currency is usually a
        // mistake; warn but carry on.
        if path.exists() {
            let previous = crate::io::snapshot::read_snapshot_header(path)?;
            if previous.currency != config.currency {
                eprintln!(
                    "Warning: overwriting {} snapshot '{}' with {} data.",
                    previous.currency,
                    path.display(),
                    config.currency
                );
            }
        }
        let snapshot = SnapshotFile {
            tool: "ote".to_string(),
            currency: config.currency,
            from: config.from,
            to: config.to,
            threshold: config.threshold,
            policy: config.policy,
            summary: d.summary.clone(),
            monthly_prices: d.monthly.clone(),
            monthly_spark: d.spark_monthly.clone(),
            monthly_regulation: d.regulation_monthly.clone(),
        };
        crate::io::snapshot::write_snapshot_json(path, &snapshot)?;
    }

    println!("Exported derived series to '{}'.", args.out_dir.display());
    Ok(())
}

fn source_from_args(args: &RunArgs) -> Result<DataSource, AppError> {
    DataSource::resolve(args.data_dir.clone(), args.base_url.clone(), args.sample, args.seed)
}

pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    if !args.threshold.is_finite() {
        return Err(AppError::usage("Threshold must be a finite number."));
    }
    if args.ma_window == 0 {
        return Err(AppError::usage("Moving-average window must be >= 1."));
    }
    if args.charging_hours == 0 || args.charging_hours > 24 {
        return Err(AppError::usage("Charging hours must be in [1, 24]."));
    }
    if !(args.boiler_efficiency > 0.0 && args.boiler_efficiency <= 1.0) {
        return Err(AppError::usage("Boiler efficiency must be in (0, 1]."));
    }
    if let (Some(from), Some(to)) = (args.from, args.to) {
        if from > to {
            return Err(AppError::usage("--from must not be after --to."));
        }
    }

    let mut policy = SparkPolicy::for_currency(args.currency);
    policy.charging_hours = args.charging_hours;
    policy.boiler_efficiency = args.boiler_efficiency;
    if let Some(adder) = args.retail_adder {
        policy.retail_adder = adder;
    }

    Ok(RunConfig {
        currency: args.currency,
        from: args.from,
        to: args.to,
        threshold: args.threshold,
        ma_window: args.ma_window,
        policy,
    })
}

/// Rewrite argv so `ote` defaults to `ote report`.
///
/// Rules:
/// - `ote`                     -> `ote report`
/// - `ote --sample ...`        -> `ote report --sample ...`
/// - `ote --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "tui" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "report flags".
    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
