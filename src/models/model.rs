//! Model evaluation for the trend + season decomposition.
//!
//! The fitters rely on two primitive operations:
//! - predict `y(t)` for a parameter vector (for residuals/plots/forecasts)
//! - fill a Jacobian row `∂y/∂p` for a given time (for Levenberg–Marquardt)

use serde::{Deserialize, Serialize};

use crate::domain::{ForecastPoint, SeasonalModel, TrendModel};
use crate::error::AppError;

/// Evaluate `A·sin(f·t + φ) + D` for `p = [A, f, φ, D]`.
pub fn sine_predict(t: f64, p: &[f64]) -> f64 {
    p[0] * (p[1] * t + p[2]).sin() + p[3]
}

/// Fill `∂/∂[A, f, φ, D]` of the sinusoid at `t`.
///
/// # Panics
/// Panics if `p` or `out` is shorter than 4.
pub fn fill_sine_jacobian(t: f64, p: &[f64], out: &mut [f64]) {
    let arg = p[1] * t + p[2];
    let (s, c) = arg.sin_cos();
    out[0] = s;
    out[1] = p[0] * t * c;
    out[2] = p[0] * c;
    out[3] = 1.0;
}

/// Trend plus season: the full model prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedModel {
    pub trend: TrendModel,
    pub seasonal: SeasonalModel,
}

impl CombinedModel {
    pub fn new(trend: TrendModel, seasonal: SeasonalModel) -> Self {
        Self { trend, seasonal }
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        self.trend.evaluate(t) + self.seasonal.evaluate(t)
    }

    pub fn point(&self, t: f64) -> ForecastPoint {
        let trend = self.trend.evaluate(t);
        let seasonal = self.seasonal.evaluate(t);
        ForecastPoint {
            time: t,
            trend,
            seasonal,
            value: trend + seasonal,
        }
    }

    /// Evaluate at arbitrary times.
    ///
    /// This is unconstrained extrapolation: it assumes the fitted trend and
    /// seasonal shape hold outside the fitted range.
    pub fn forecast_at(&self, times: &[f64]) -> Vec<ForecastPoint> {
        times.iter().map(|&t| self.point(t)).collect()
    }

    /// Evaluate on `start, start + step, ...` up to and including `end`.
    pub fn forecast_range(&self, start: f64, end: f64, step: f64) -> Result<Vec<ForecastPoint>, AppError> {
        Ok(self.forecast_at(&time_grid(start, end, step)?))
    }
}

/// Largest forecast grid `time_grid` will build.
pub const MAX_FORECAST_POINTS: usize = 1_000_000;

/// Regular grid `start..=end` (with a small tolerance on the last point).
pub fn time_grid(start: f64, end: f64, step: f64) -> Result<Vec<f64>, AppError> {
    if !(step.is_finite() && step > 0.0) {
        return Err(AppError::config(format!("Forecast step must be positive, got {step}.")));
    }
    if !(start.is_finite() && end.is_finite()) {
        return Err(AppError::config("Forecast range must be finite."));
    }
    if end < start {
        return Ok(Vec::new());
    }
    let intervals = ((end - start) / step + 1e-9).floor();
    if !intervals.is_finite() || intervals >= MAX_FORECAST_POINTS as f64 {
        return Err(AppError::config(format!(
            "Forecast range {start}..{end} with step {step} exceeds {MAX_FORECAST_POINTS} points."
        )));
    }
    let count = intervals as usize + 1;
    Ok((0..count).map(|i| start + i as f64 * step).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_jacobian_matches_finite_differences() {
        let p = [2.0, 3.0, 0.4, -1.0];
        let t = 0.7;
        let mut analytic = [0.0; 4];
        fill_sine_jacobian(t, &p, &mut analytic);
        let h = 1e-6;
        for j in 0..4 {
            let mut hi = p;
            let mut lo = p;
            hi[j] += h;
            lo[j] -= h;
            let numeric = (sine_predict(t, &hi) - sine_predict(t, &lo)) / (2.0 * h);
            assert!((numeric - analytic[j]).abs() < 1e-6, "param {j}: {numeric} vs {}", analytic[j]);
        }
    }

    #[test]
    fn combined_model_adds_components() {
        let model = CombinedModel::new(
            TrendModel::new(vec![1.0, 10.0]).unwrap(),
            SeasonalModel {
                amplitude: 2.0,
                frequency: std::f64::consts::TAU,
                phase: 0.0,
                offset: 0.0,
            },
        );
        let p = model.point(0.25);
        assert!((p.trend - 10.25).abs() < 1e-12);
        assert!((p.seasonal - 2.0).abs() < 1e-12);
        assert!((p.value - 12.25).abs() < 1e-12);
    }

    #[test]
    fn time_grid_includes_end_and_handles_empty() {
        let grid = time_grid(0.0, 1.0, 0.25).unwrap();
        assert_eq!(grid.len(), 5);
        assert!((grid[4] - 1.0).abs() < 1e-12);
        assert!(time_grid(2.0, 1.0, 0.5).unwrap().is_empty());
        assert!(time_grid(0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn time_grid_rejects_oversized_ranges() {
        let err = time_grid(0.0, 1e300, 1e-300).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)), "{err:?}");
        assert!(time_grid(0.0, f64::MAX, f64::MIN_POSITIVE).is_err());
        let n = MAX_FORECAST_POINTS as f64;
        assert!(time_grid(0.0, n, 1.0).is_err());
        assert_eq!(time_grid(0.0, n - 1.0, 1.0).unwrap().len(), MAX_FORECAST_POINTS);
    }
}
