//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads data (file, URL, or interactive pick)
//! - runs the decomposition pipeline
//! - prints reports/plots
//! - writes optional exports

use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FetchArgs, FitArgs, ForecastArgs, SynthArgs};
use crate::data::{NoaaClient, SyntheticSpec, generate_series};
use crate::domain::{ColumnSpec, DecompConfig, SeasonalModel};
use crate::error::AppError;
use crate::math::SolverOptions;

pub mod pipeline;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "TRENDFIT_LOG";

/// Forecast rows shown in the terminal table.
const FORECAST_TABLE_ROWS: usize = 24;

/// Entry point for the `trendfit` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `trendfit` and `trendfit -f data.txt` behave like `trendfit fit ...`.
    // Clap requires a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Forecast(args) => handle_forecast(args),
        Command::Synth(args) => handle_synth(args),
        Command::Fetch(args) => handle_fetch(args),
    }
}

/// Install the stderr log subscriber.
///
/// `TRENDFIT_LOG` takes precedence; otherwise `-v` raises the crate level.
fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "trendfit=info",
        1 => "trendfit=debug",
        _ => "trendfit=trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    // A second install (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;

    let source = match (&args.file, &args.url) {
        (Some(path), _) => pipeline::DataSource::File(path.clone()),
        (None, Some(url)) => pipeline::DataSource::Url(url.clone()),
        (None, None) => pipeline::DataSource::File(crate::cli::picker::prompt_for_data_path(config.columns)?),
    };

    let run = pipeline::run_fit(&source, &config)?;
    let d = &run.decomposition;

    println!("{}", crate::report::format_run_summary(&run.ingest, d, &config));

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.ingest.series,
            &d.model,
            &d.forecast,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if config.forecast_until.is_some() {
        println!("{}", crate::report::format_forecast_table(&d.forecast, FORECAST_TABLE_ROWS));
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_decomposition_csv(path, &run.ingest.series, d)?;
        info!(path = %path.display(), "wrote decomposition CSV");
    }
    if let Some(path) = &config.export_model {
        let model = crate::io::model_file::build_model_file(&run.ingest, d);
        crate::io::model_file::write_model_json(path, &model)?;
        info!(path = %path.display(), "wrote model JSON");
    }
    if let Some(dir) = &config.debug_bundle {
        let path = crate::debug::write_debug_bundle(dir, &run.ingest, d, &config)?;
        info!(path = %path.display(), "wrote debug bundle");
    }

    Ok(())
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let model = crate::io::model_file::read_model_json(&args.model)?;

    let step = args
        .step
        .or(model.sampling_interval)
        .ok_or_else(|| AppError::config("The model file has no sampling interval; pass --step."))?;
    let start = args.from.unwrap_or(model.time_range[1] + step);
    let points = model.combined().forecast_range(start, args.until, step)?;
    info!(n = points.len(), start, until = args.until, step, "forecast evaluated");

    match &args.export {
        Some(path) => {
            crate::io::export::write_forecast_csv(path, &points)?;
            info!(path = %path.display(), "wrote forecast CSV");
        }
        None => {
            println!("{}", crate::report::format_model_file(&model));
            println!("{}", crate::report::format_forecast_table(&points, FORECAST_TABLE_ROWS));
        }
    }
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spec = SyntheticSpec {
        count: args.count,
        noise_sd: args.noise,
        seed: args.seed,
        ..SyntheticSpec::default()
    };
    let series = generate_series(&spec)?;
    crate::io::export::write_series_text(&args.out, &series)?;
    info!(path = %args.out.display(), n = series.len(), seed = spec.seed, "wrote synthetic series");
    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let client = match args.url {
        Some(url) => NoaaClient::with_url(url)?,
        None => NoaaClient::from_env()?,
    };
    let text = client.fetch_text()?;

    // Parse once so a broken download is reported before it is saved.
    let ingest = crate::io::ingest::ingest_str(&text, client.url(), ColumnSpec::default())?;
    write_text(&args.out, &text)?;
    info!(
        path = %args.out.display(),
        n = ingest.stats.n_points,
        from = ingest.stats.time_min,
        to = ingest.stats.time_max,
        "saved dataset"
    );
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<(), AppError> {
    std::fs::write(path, text).map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

/// Map CLI flags to library configuration.
pub fn fit_config_from_args(args: &FitArgs) -> Result<DecompConfig, AppError> {
    let seasonal_guess = match &args.guess {
        None => None,
        Some(values) if values.len() == 4 => Some(SeasonalModel::from_params(values)),
        Some(values) => {
            return Err(AppError::config(format!(
                "--guess takes exactly 4 values (A,f,phase,D), got {}.",
                values.len()
            )));
        }
    };
    if !(args.period.is_finite() && args.period > 0.0) {
        return Err(AppError::config(format!("--period must be positive, got {}.", args.period)));
    }
    if !(args.p_floor.is_finite() && args.p_floor >= 0.0) {
        return Err(AppError::config(format!("--p-floor must be >= 0, got {}.", args.p_floor)));
    }

    Ok(DecompConfig {
        columns: ColumnSpec {
            time_column: args.time_col,
            value_column: args.value_col,
        },
        trend_degree: args.degree,
        window: args.window,
        seasonal_period: args.period,
        seasonal_guess,
        solver: SolverOptions {
            max_iterations: args.max_iter,
            ..SolverOptions::default()
        },
        p_value_floor: args.p_floor,
        forecast_until: args.forecast_until,
        forecast_step: args.forecast_step,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_model: args.export_model.clone(),
        debug_bundle: args.debug_bundle.clone(),
    })
}

/// Rewrite argv so `trendfit` defaults to `trendfit fit`.
///
/// Rules:
/// - `trendfit`                            -> `trendfit fit`
/// - `trendfit -f data.txt ...`            -> `trendfit fit -f data.txt ...`
/// - `trendfit --help/--version/-h/help`   -> unchanged
/// - leading `-v` flags are skipped; if a subcommand follows them, unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let first = argv
        .iter()
        .skip(1)
        .position(|a| !is_verbose_flag(a))
        .map(|i| i + 1);
    let Some(first) = first else {
        argv.push("fit".to_string());
        return argv;
    };

    let keep = matches!(
        argv[first].as_str(),
        "-h" | "--help" | "-V" | "--version" | "help" | "fit" | "forecast" | "synth" | "fetch"
    );
    if !keep {
        argv.insert(first, "fit".to_string());
    }
    argv
}

fn is_verbose_flag(arg: &str) -> bool {
    arg == "--verbose" || (arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'))
}
