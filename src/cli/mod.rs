//! Command-line parsing for the trend + season decomposition tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! modeling/math code. Handlers in `app` turn these structs into plain
//! library configuration.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "trendfit",
    version,
    about = "Trend + seasonal decomposition and forecast of monthly time series"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `TRENDFIT_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decompose a series, print the fits, and optionally plot/export/forecast.
    Fit(FitArgs),
    /// Evaluate a saved model JSON over a new time range.
    Forecast(ForecastArgs),
    /// Write a synthetic CO2-like series in the NOAA column layout.
    Synth(SynthArgs),
    /// Download the NOAA Mauna Loa monthly record.
    Fetch(FetchArgs),
}

/// Options for `trendfit fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Whitespace-delimited data file. Prompts for one if neither this nor --url is given.
    #[arg(short = 'f', long, value_name = "FILE", conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Download the data from this URL instead of reading a file.
    #[arg(long)]
    pub url: Option<String>,

    /// 0-based column holding the decimal-year time.
    #[arg(long, default_value_t = 2)]
    pub time_col: usize,

    /// 0-based column holding the value.
    #[arg(long, default_value_t = 3)]
    pub value_col: usize,

    /// Trend polynomial degree.
    #[arg(short = 'd', long, default_value_t = 2)]
    pub degree: usize,

    /// Moving-average window in samples (even).
    #[arg(short = 'w', long, default_value_t = 12)]
    pub window: usize,

    /// Seasonal period (time units) used for the automatic sinusoid guess.
    #[arg(long, default_value_t = 1.0)]
    pub period: f64,

    /// Explicit sinusoid guess as `A,f,phase,D`; skips the automatic guess.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub guess: Option<Vec<f64>>,

    /// Maximum Levenberg–Marquardt iterations.
    #[arg(long, default_value_t = 200)]
    pub max_iter: usize,

    /// p-values below this are displayed as "< floor".
    #[arg(long, default_value_t = 0.001)]
    pub p_floor: f64,

    /// Forecast the combined model up to this time.
    #[arg(long, value_name = "TIME")]
    pub forecast_until: Option<f64>,

    /// Forecast step (defaults to the data's sampling interval).
    #[arg(long)]
    pub forecast_step: Option<f64>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-sample decomposition to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fitted model (+ forecast grid) to JSON.
    #[arg(long = "export-model")]
    pub export_model: Option<PathBuf>,

    /// Write a markdown debug bundle into this directory.
    #[arg(long = "debug-bundle", value_name = "DIR")]
    pub debug_bundle: Option<PathBuf>,
}

/// Options for `trendfit forecast`.
#[derive(Debug, Parser)]
pub struct ForecastArgs {
    /// Model JSON produced by `trendfit fit --export-model`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// First forecast time (defaults to one step after the fitted range).
    #[arg(long)]
    pub from: Option<f64>,

    /// Last forecast time.
    #[arg(long)]
    pub until: f64,

    /// Step between forecast times (defaults to the fitted sampling interval).
    #[arg(long)]
    pub step: Option<f64>,

    /// Write the forecast to CSV instead of printing the table.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for `trendfit synth`.
#[derive(Debug, Parser)]
pub struct SynthArgs {
    /// Output file.
    #[arg(short, long)]
    pub out: PathBuf,

    /// Number of monthly samples.
    #[arg(short = 'n', long, default_value_t = 792)]
    pub count: usize,

    /// Noise standard deviation.
    #[arg(long, default_value_t = 0.25)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for `trendfit fetch`.
#[derive(Debug, Parser)]
pub struct FetchArgs {
    /// Output file.
    #[arg(short, long, default_value = "co2_mm_mlo.txt")]
    pub out: PathBuf,

    /// Source URL (defaults to `TRENDFIT_DATA_URL` or the NOAA record).
    #[arg(long)]
    pub url: Option<String>,
}
