//! Polynomial trend fitting.
//!
//! The trend is an ordinary least squares polynomial in raw time units.
//! R² is always recomputed from the fitted values, because the polynomial
//! solve itself does not produce it.

use tracing::info;

use crate::domain::{Series, TrendFit, TrendModel};
use crate::error::AppError;
use crate::math::{fit_quality, linear_regression, polyfit};

/// Highest polynomial degree accepted for the trend.
pub const MAX_TREND_DEGREE: usize = 6;

/// Fit a degree-`degree` polynomial trend to `series`.
///
/// Degree 1 additionally reports slope, intercept, correlation and the
/// slope p-value.
pub fn fit_trend(series: &Series, degree: usize) -> Result<TrendFit, AppError> {
    if degree == 0 || degree > MAX_TREND_DEGREE {
        return Err(AppError::config(format!(
            "Trend degree must be in 1..={MAX_TREND_DEGREE}, got {degree}."
        )));
    }
    series.require_len(degree + 1, &format!("A degree-{degree} trend"))?;

    let coefficients = polyfit(series.times(), series.values(), degree)?;
    let model = TrendModel::new(coefficients)?;

    let fitted: Vec<f64> = series.times().iter().map(|&t| model.evaluate(t)).collect();
    let quality = fit_quality(series.values(), &fitted);

    let linear = if degree == 1 {
        Some(linear_regression(series.times(), series.values())?)
    } else {
        None
    };

    info!(
        degree,
        r_squared = quality.r_squared,
        rmse = quality.rmse,
        "trend fitted"
    );

    Ok(TrendFit {
        model,
        quality,
        linear,
    })
}

/// Observed minus trend at every sample.
pub fn detrend(series: &Series, model: &TrendModel) -> Result<Series, AppError> {
    let values = series.iter().map(|(t, v)| v - model.evaluate(t)).collect();
    series.with_values(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_from(f: impl Fn(f64) -> f64, n: usize, t0: f64, dt: f64) -> Series {
        let times: Vec<f64> = (0..n).map(|i| t0 + i as f64 * dt).collect();
        let values = times.iter().map(|&t| f(t)).collect();
        Series::new(times, values).unwrap()
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let series = series_from(|t| 310.0 + 1.6 * t, 50, 0.0, 1.0 / 12.0);
        let fit = fit_trend(&series, 1).unwrap();
        assert!((fit.model.coefficients[0] - 1.6).abs() < 1e-9);
        assert!((fit.model.coefficients[1] - 310.0).abs() < 1e-9);
        assert!((fit.quality.r_squared - 1.0).abs() < 1e-12);

        let stats = fit.linear.unwrap();
        assert!((stats.slope - 1.6).abs() < 1e-9);
        assert!((stats.intercept - 310.0).abs() < 1e-9);
        assert!((stats.r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_fit_recovers_coefficients_and_r_squared() {
        let series = series_from(|t| 0.0125 * t * t + 0.8 * t + 315.0, 120, 0.0, 0.5);
        let fit = fit_trend(&series, 2).unwrap();
        let c = &fit.model.coefficients;
        assert!((c[0] - 0.0125).abs() < 1e-10, "{c:?}");
        assert!((c[1] - 0.8).abs() < 1e-8, "{c:?}");
        assert!((c[2] - 315.0).abs() < 1e-7, "{c:?}");
        assert!((fit.quality.r_squared - 1.0).abs() < 1e-12);
        assert!(fit.linear.is_none());
    }

    #[test]
    fn quadratic_fit_needs_three_samples() {
        let series = Series::new(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        assert!(matches!(fit_trend(&series, 2), Err(AppError::Input(_))));
    }

    #[test]
    fn degree_zero_is_a_configuration_error() {
        let series = Series::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(fit_trend(&series, 0), Err(AppError::Configuration(_))));
    }

    #[test]
    fn detrend_removes_trend() {
        let series = series_from(|t| 2.0 * t + 1.0, 10, 0.0, 1.0);
        let fit = fit_trend(&series, 1).unwrap();
        let rest = detrend(&series, &fit.model).unwrap();
        assert!(rest.values().iter().all(|v| v.abs() < 1e-9));
    }
}
