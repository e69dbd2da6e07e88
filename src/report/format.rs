//! Formatted terminal output.
//!
//! Formatting lives in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized
//!
//! The p-value floor is applied here and only here. Numeric results keep the
//! exact p-value.

use chrono::{Datelike, NaiveDate};

use crate::app::pipeline::Decomposition;
use crate::domain::{DecompConfig, ForecastPoint, ModelFile, TrendModel};
use crate::io::ingest::IngestedData;

/// Format a p-value, showing `< floor` when it falls below `floor`.
pub fn format_p_value(p: f64, floor: f64) -> String {
    if p < floor {
        format!("< {floor}")
    } else {
        format!("{p:.4}")
    }
}

/// Format the full run summary (dataset + each stage's diagnostics).
pub fn format_run_summary(ingest: &IngestedData, d: &Decomposition, config: &DecompConfig) -> String {
    let mut out = String::new();

    out.push_str("=== trendfit - trend + seasonal decomposition ===\n");
    out.push_str(&format!("Source: {}\n", ingest.source));
    out.push_str(&format!(
        "Samples: n={} | t=[{:.4}, {:.4}] ({} .. {}) | y=[{:.2}, {:.2}]\n",
        ingest.stats.n_points,
        ingest.stats.time_min,
        ingest.stats.time_max,
        fmt_month(ingest.stats.time_min),
        fmt_month(ingest.stats.time_max),
        ingest.stats.value_min,
        ingest.stats.value_max,
    ));
    if let Some(dt) = ingest.stats.sampling_interval {
        let regular = if ingest.stats.regular { "" } else { " (irregular)" };
        out.push_str(&format!("Sampling interval: {dt:.5}{regular}\n"));
    }
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!("Skipped rows: {}\n", ingest.row_errors.len()));
    }

    out.push_str("\nLinear trend:\n");
    if let Some(stats) = &d.linear.linear {
        out.push_str(&format!("- slope     : {:.6} (se {:.6})\n", stats.slope, stats.slope_stderr));
        out.push_str(&format!("- intercept : {:.6}\n", stats.intercept));
        out.push_str(&format!(
            "- r = {:.6} | p {}\n",
            stats.r,
            format_p_value(stats.p_value, config.p_value_floor)
        ));
    }
    out.push_str(&format!(
        "- R² = {:.6} | RMSE = {:.4}\n",
        d.linear.quality.r_squared, d.linear.quality.rmse
    ));

    if d.trend.model.degree != 1 {
        out.push_str(&format!("\nDegree-{} trend:\n", d.trend.model.degree));
        out.push_str(&format!("- {}\n", format_polynomial(&d.trend.model)));
        out.push_str(&format!(
            "- R² = {:.6} | RMSE = {:.4}\n",
            d.trend.quality.r_squared, d.trend.quality.rmse
        ));
    }

    out.push_str(&format!(
        "\nSmoothing: window={} | smoothed samples={} | trimmed {} start / {} end\n",
        d.smoothed.window,
        d.smoothed.values.len(),
        d.smoothed.window / 2,
        d.smoothed.window / 2 - 1
    ));

    let s = &d.seasonal.model;
    out.push_str("\nSeasonal sinusoid A·sin(f·t + φ) + D:\n");
    out.push_str(&format!(
        "- A = {:.4} | f = {:.6} (period {:.4}) | φ = {:.4} | D = {:.4}\n",
        s.amplitude,
        s.frequency,
        s.period(),
        s.phase,
        s.offset
    ));
    out.push_str(&format!(
        "- iterations = {} | RMSE = {:.4} | R² = {:.4}\n",
        d.seasonal.iterations, d.seasonal.quality.rmse, d.seasonal.quality.r_squared
    ));

    out.push_str("\nResiduals (detrended - sinusoid):\n");
    out.push_str(&format!(
        "- mean = {:.4} | std = {:.4} | max |model residual| = {:.4}\n",
        d.residual_mean(),
        d.residual_std(),
        d.max_abs_model_residual()
    ));
    out.push('\n');

    out
}

/// Format a forecast table, showing at most `max_rows` evenly spread rows.
pub fn format_forecast_table(points: &[ForecastPoint], max_rows: usize) -> String {
    let mut out = String::new();
    if points.is_empty() {
        out.push_str("Forecast: (none)\n");
        return out;
    }

    out.push_str(&format!(
        "{:<10} {:>8} {:>12} {:>10} {:>12}\n",
        "time", "month", "trend", "seasonal", "value"
    ));
    out.push_str(&format!("{:-<10} {:-<8} {:-<12} {:-<10} {:-<12}\n", "", "", "", "", ""));

    for p in thin(points, max_rows) {
        out.push_str(&format!(
            "{:<10.4} {:>8} {:>12.3} {:>10.3} {:>12.3}\n",
            p.time,
            fmt_month(p.time),
            p.trend,
            p.seasonal,
            p.value
        ));
    }

    out
}

/// Short description of a saved model file.
pub fn format_model_file(model: &ModelFile) -> String {
    format!(
        "Model from {} (fitted {:.4}..{:.4}, generated {})\n- trend: {}\n- season: A={:.4} f={:.6} φ={:.4} D={:.4}\n",
        model.source,
        model.time_range[0],
        model.time_range[1],
        model.generated_at.format("%Y-%m-%d %H:%M UTC"),
        format_polynomial(&model.trend),
        model.seasonal.amplitude,
        model.seasonal.frequency,
        model.seasonal.phase,
        model.seasonal.offset,
    )
}

/// `c0·t^d + ... + cd` with the highest power first.
pub fn format_polynomial(model: &TrendModel) -> String {
    let top = model.coefficients.len().saturating_sub(1);
    let terms: Vec<String> = model
        .coefficients
        .iter()
        .enumerate()
        .map(|(i, c)| match top - i {
            0 => format!("{c:.6e}"),
            1 => format!("{c:.6e}·t"),
            p => format!("{c:.6e}·t^{p}"),
        })
        .collect();
    format!("y = {}", terms.join(" + "))
}

/// Calendar month (`YYYY-MM`) of a decimal-year time.
pub fn fmt_month(t: f64) -> String {
    decimal_year_to_date(t)
        .map(|d| format!("{:04}-{:02}", d.year(), d.month()))
        .unwrap_or_else(|| "-".to_string())
}

/// Convert a decimal year (e.g. `1958.2027`) to a calendar date.
pub fn decimal_year_to_date(t: f64) -> Option<NaiveDate> {
    if !t.is_finite() {
        return None;
    }
    let year = t.floor() as i32;
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let next = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
    let days_in_year = (next - start).num_days() as f64;
    let offset = ((t - t.floor()) * days_in_year).floor() as u64;
    start.checked_add_days(chrono::Days::new(offset))
}

fn thin(points: &[ForecastPoint], max_rows: usize) -> Vec<&ForecastPoint> {
    let max_rows = max_rows.max(2);
    if points.len() <= max_rows {
        return points.iter().collect();
    }
    let last = points.len() - 1;
    (0..max_rows)
        .map(|i| &points[i * last / (max_rows - 1)])
        .collect()
}
