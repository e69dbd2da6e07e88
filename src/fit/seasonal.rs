//! Sinusoid fitting for the seasonal component.
//!
//! The model `A·sin(f·t + φ) + D` is fitted by Levenberg–Marquardt with no
//! bounds on any parameter. Convergence is local: the caller supplies a
//! starting point (or lets `estimate_guess` derive one for a known period),
//! and a starting point far from the optimum may not converge. Failures
//! surface as `AppError::Fit`; no fallback guess is tried.
//!
//! Decimal-year times are large (~2000) next to one seasonal cycle, which
//! couples `f` and `φ` badly. The solver therefore works in shifted time
//! `u = t - t0` (`t0` = mean sample time) and the phase is mapped back with
//! `φ = φ_u - f·t0`. The returned model is expressed in raw time.

use std::f64::consts::TAU;

use nalgebra::DVector;
use tracing::{info, warn};

use crate::domain::{SeasonalFit, SeasonalModel, Series};
use crate::error::AppError;
use crate::math::{SolverOptions, design_matrix, fit_quality, levenberg_marquardt, mean, solve_least_squares};
use crate::models::{fill_sine_jacobian, sine_predict};

/// Samples needed to determine the four sinusoid parameters.
pub const MIN_SEASONAL_SAMPLES: usize = 4;

/// Fit a sinusoid to `series` starting from `guess`.
pub fn fit_sinusoid(series: &Series, guess: &SeasonalModel, options: &SolverOptions) -> Result<SeasonalFit, AppError> {
    series.require_len(MIN_SEASONAL_SAMPLES, "A sinusoid fit")?;

    let t0 = mean(series.times());
    let shifted: Vec<f64> = series.times().iter().map(|t| t - t0).collect();
    let start = to_shifted(guess, t0).params();

    let solved = levenberg_marquardt(
        &shifted,
        series.values(),
        &start,
        options,
        sine_predict,
        fill_sine_jacobian,
    )
    .map_err(|err| match err {
        // Report the last estimate in raw time, like a successful fit.
        AppError::Fit {
            message,
            last_params,
            iterations,
        } => AppError::Fit {
            message,
            last_params: from_shifted(&SeasonalModel::from_params(&last_params), t0)
                .params()
                .to_vec(),
            iterations,
        },
        other => other,
    })?;

    let model = from_shifted(&SeasonalModel::from_params(&solved.params), t0);
    if model.params().iter().any(|p| !p.is_finite()) {
        return Err(AppError::Fit {
            message: "solver produced non-finite parameters".to_string(),
            last_params: model.params().to_vec(),
            iterations: solved.iterations,
        });
    }

    let fitted: Vec<f64> = series.times().iter().map(|&t| model.evaluate(t)).collect();
    let quality = fit_quality(series.values(), &fitted);

    info!(
        amplitude = model.amplitude,
        period = model.period(),
        iterations = solved.iterations,
        rmse = quality.rmse,
        "sinusoid fitted"
    );

    Ok(SeasonalFit {
        model,
        quality,
        initial_guess: *guess,
        iterations: solved.iterations,
    })
}

/// Derive a starting point for a sinusoid with known `period`.
///
/// With the frequency fixed, `a·sin(f·u) + b·cos(f·u) + D` is linear in
/// `(a, b, D)`, so one OLS solve gives amplitude `√(a² + b²)` and phase
/// `atan2(b, a)`. The result is only a starting point for `fit_sinusoid`.
pub fn estimate_guess(series: &Series, period: f64) -> Result<SeasonalModel, AppError> {
    if !(period.is_finite() && period > 0.0) {
        return Err(AppError::config(format!("Seasonal period must be positive, got {period}.")));
    }
    series.require_len(MIN_SEASONAL_SAMPLES, "A seasonal guess")?;

    let frequency = TAU / period;
    let t0 = mean(series.times());
    let times = series.times();

    let design = design_matrix(series.len(), 3, |i, row| {
        let (s, c) = (frequency * (times[i] - t0)).sin_cos();
        row[0] = s;
        row[1] = c;
        row[2] = 1.0;
    });
    let rhs = DVector::from_column_slice(series.values());
    let beta = solve_least_squares(&design, &rhs)
        .ok_or_else(|| AppError::numerical("Seasonal guess system is singular."))?;

    let (a, b, offset) = (beta[0], beta[1], beta[2]);
    let amplitude = a.hypot(b);
    if amplitude == 0.0 {
        warn!(period, "no seasonal signal at the requested period");
    }

    let shifted = SeasonalModel {
        amplitude,
        frequency,
        phase: b.atan2(a),
        offset,
    };
    Ok(from_shifted(&shifted, t0))
}

fn to_shifted(model: &SeasonalModel, t0: f64) -> SeasonalModel {
    SeasonalModel {
        phase: model.phase + model.frequency * t0,
        ..*model
    }
}

fn from_shifted(model: &SeasonalModel, t0: f64) -> SeasonalModel {
    SeasonalModel {
        phase: model.phase - model.frequency * t0,
        ..*model
    }
}
