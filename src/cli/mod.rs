//! Command-line parsing for the OTE market dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the aggregation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::Currency;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ote", version, about = "Czech electricity-market analytics (OTE CSV exports)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the datasets and print summary tables to the terminal.
    Report(RunArgs),
    /// Launch the interactive TUI dashboard.
    ///
    /// Uses the same aggregation pipeline as `ote report`, but renders the
    /// derived series as tabbed charts and recomputes on every filter change.
    Tui(RunArgs),
    /// Write derived series to CSV files (and optionally a JSON snapshot).
    Export(ExportArgs),
}

/// Common options for loading and aggregating.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Local directory containing the per-currency CSV sets.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// HTTP(S) base URL serving the per-currency CSV sets.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Use seeded synthetic demo data instead of reading any files.
    #[arg(long)]
    pub sample: bool,

    /// Seed for the synthetic demo data.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Which currency file set to load (also selects the retail-adder default).
    #[arg(short = 'c', long, value_enum, default_value_t = Currency::Eur)]
    pub currency: Currency,

    /// Start of the date window (inclusive, YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// End of the date window (inclusive, YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Price threshold for cheap-hour occupancy metrics.
    #[arg(short = 't', long, default_value_t = 50.0)]
    pub threshold: f64,

    /// Trailing moving-average window (periods).
    #[arg(long, default_value_t = 7)]
    pub ma_window: usize,

    /// Hours per day the flexible load runs in the spark-spread model.
    #[arg(long, default_value_t = 8)]
    pub charging_hours: usize,

    /// Gas boiler efficiency used in the spark-spread model.
    #[arg(long, default_value_t = 0.90)]
    pub boiler_efficiency: f64,

    /// Per-MWh retail adder on the gas price (defaults per currency).
    #[arg(long)]
    pub retail_adder: Option<f64>,
}

/// Options for exporting derived series.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Directory to write the derived-series CSVs into.
    #[arg(long, default_value = "export")]
    pub out_dir: PathBuf,

    /// Also write a JSON snapshot of the run summary.
    #[arg(long, value_name = "JSON")]
    pub snapshot: Option<PathBuf>,
}
