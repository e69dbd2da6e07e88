//! Debug bundle writer for inspecting each decomposition stage.
//!
//! The bundle is a single markdown file with the run settings, every fitted
//! parameter and per-sample tables, so a surprising fit can be examined
//! without rerunning it under a debugger.

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::Decomposition;
use crate::domain::DecompConfig;
use crate::error::AppError;
use crate::io::ingest::IngestedData;

/// Write the bundle into `dir` and return the file path.
pub fn write_debug_bundle(
    dir: &Path,
    ingest: &IngestedData,
    d: &Decomposition,
    config: &DecompConfig,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::io(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("trendfit_debug_{ts}.md"));
    let file = File::create(&path).map_err(|e| AppError::io(format!("Failed to create debug file: {e}")))?;
    let mut file = BufWriter::new(file);

    write_bundle(&mut file, ingest, d, config)
        .map_err(|e| AppError::io(format!("Failed to write debug bundle: {e}")))?;
    Ok(path)
}

fn write_bundle(
    out: &mut impl Write,
    ingest: &IngestedData,
    d: &Decomposition,
    config: &DecompConfig,
) -> std::io::Result<()> {
    writeln!(out, "# trendfit debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- source: {}", ingest.source)?;
    writeln!(
        out,
        "- columns: time={} value={}",
        ingest.columns.time_column, ingest.columns.value_column
    )?;
    writeln!(
        out,
        "- samples: {} (row errors {}, skipped lines {})",
        ingest.stats.n_points,
        ingest.row_errors.len(),
        ingest.lines_skipped
    )?;
    writeln!(
        out,
        "- settings: degree={} window={} period={} max_iter={} ftol={:e} xtol={:e}",
        config.trend_degree,
        config.window,
        config.seasonal_period,
        config.solver.max_iterations,
        config.solver.ftol,
        config.solver.xtol
    )?;

    if !ingest.row_errors.is_empty() {
        writeln!(out, "\n## Row errors")?;
        for err in &ingest.row_errors {
            writeln!(out, "- line {}: {}", err.line, err.message)?;
        }
    }

    writeln!(out, "\n## Trend fits")?;
    writeln!(out, "| degree | coefficients | sse | rmse | r2 |")?;
    writeln!(out, "| - | - | - | - | - |")?;
    for fit in [&d.linear, &d.trend] {
        writeln!(
            out,
            "| {} | {} | {:.6} | {:.6} | {:.6} |",
            fit.model.degree,
            fmt_vec(&fit.model.coefficients),
            fit.quality.sse,
            fit.quality.rmse,
            fit.quality.r_squared
        )?;
    }
    if let Some(stats) = &d.linear.linear {
        writeln!(
            out,
            "\nLinear: slope={:.6} intercept={:.6} r={:.8} p={:e} se={:e}",
            stats.slope, stats.intercept, stats.r, stats.p_value, stats.slope_stderr
        )?;
    }

    writeln!(out, "\n## Sinusoid")?;
    writeln!(out, "| stage | A | f | phase | D |")?;
    writeln!(out, "| - | - | - | - | - |")?;
    for (label, m) in [("guess", &d.seasonal.initial_guess), ("fit", &d.seasonal.model)] {
        writeln!(
            out,
            "| {label} | {:.6} | {:.6} | {:.6} | {:.6} |",
            m.amplitude, m.frequency, m.phase, m.offset
        )?;
    }
    writeln!(
        out,
        "\niterations={} sse={:.6} rmse={:.6} r2={:.6}",
        d.seasonal.iterations, d.seasonal.quality.sse, d.seasonal.quality.rmse, d.seasonal.quality.r_squared
    )?;

    writeln!(out, "\n## Aligned samples (window {})", d.smoothed.window)?;
    writeln!(out, "| time | raw | smoothed | detrended | sinusoid | residual |")?;
    writeln!(out, "| - | - | - | - | - | - |")?;
    let detrended = d.detrended.values();
    for (j, (t, raw)) in d.smoothed.aligned.iter().enumerate() {
        writeln!(
            out,
            "| {:.4} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} |",
            t,
            raw,
            d.smoothed.values[j],
            detrended[j],
            d.seasonal.model.evaluate(t),
            d.residuals[j]
        )?;
    }

    if !d.forecast.is_empty() {
        writeln!(out, "\n## Forecast")?;
        writeln!(out, "| time | trend | seasonal | value |")?;
        writeln!(out, "| - | - | - | - |")?;
        for p in &d.forecast {
            writeln!(out, "| {:.4} | {:.4} | {:.4} | {:.4} |", p.time, p.trend, p.seasonal, p.value)?;
        }
    }

    out.flush()
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6e}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::decompose;
    use crate::data::{SyntheticSpec, generate_series};
    use crate::io::ingest::compute_stats;

    #[test]
    fn bundle_lists_every_stage() {
        let spec = SyntheticSpec {
            count: 72,
            ..SyntheticSpec::default()
        };
        let series = generate_series(&spec).unwrap();
        let config = DecompConfig {
            forecast_until: Some(spec.start + 7.0),
            ..DecompConfig::default()
        };
        let d = decompose(&series, &config).unwrap();
        let ingest = IngestedData {
            source: "synthetic".to_string(),
            columns: config.columns,
            stats: compute_stats(&series),
            series,
            row_errors: Vec::new(),
            lines_skipped: 0,
        };

        let dir = std::env::temp_dir().join(format!("trendfit-debug-{}", std::process::id()));
        let path = write_debug_bundle(&dir, &ingest, &d, &config).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        for section in ["# trendfit debug bundle", "## Trend fits", "## Sinusoid", "## Aligned samples", "## Forecast"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("| guess |"));
    }
}
