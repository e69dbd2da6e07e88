//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `Σ (y_i - f(t_i; p))²` for a model with an analytic Jacobian.
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr
//! ```
//!
//! accepting the step when the SSE does not increase (then λ shrinks) and
//! retrying with a larger λ otherwise. The `diag(JᵀJ)` scaling keeps the
//! damping meaningful when parameters live on very different scales.
//!
//! Convergence is local: a poor starting point can end in a different
//! minimum or exhaust the iteration budget, which is reported as
//! `AppError::Fit` with the last estimate.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::AppError;

/// Largest damping factor tried before the current point is accepted as a
/// minimum.
const LAMBDA_MAX: f64 = 1e16;
const LAMBDA_MIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub max_iterations: usize,
    /// Relative SSE reduction below which the fit counts as converged.
    pub ftol: f64,
    /// Relative step length below which the fit counts as converged.
    pub xtol: f64,
    pub initial_lambda: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-12,
            xtol: 1e-10,
            initial_lambda: 1e-3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub params: Vec<f64>,
    pub sse: f64,
    pub iterations: usize,
}

/// Run Levenberg–Marquardt from `initial`.
///
/// - `model(t, p)` evaluates the model
/// - `jacobian(t, p, out)` writes `∂f/∂p_j` into `out[j]`
pub fn levenberg_marquardt<F, J>(
    t: &[f64],
    y: &[f64],
    initial: &[f64],
    options: &SolverOptions,
    model: F,
    jacobian: J,
) -> Result<SolverOutcome, AppError>
where
    F: Fn(f64, &[f64]) -> f64,
    J: Fn(f64, &[f64], &mut [f64]),
{
    let n = t.len();
    let m = initial.len();
    if y.len() != n {
        return Err(AppError::input("Solver inputs differ in length."));
    }
    if n < m {
        return Err(AppError::input(format!(
            "Nonlinear fit with {m} parameters needs at least {m} samples, got {n}."
        )));
    }
    if options.max_iterations == 0 {
        return Err(AppError::config("Solver max_iterations must be > 0."));
    }
    if initial.iter().any(|p| !p.is_finite()) {
        return Err(AppError::config(format!("Initial guess {initial:?} is not finite.")));
    }

    let sse_at = |p: &[f64]| -> f64 { t.iter().zip(y).map(|(&ti, &yi)| (yi - model(ti, p)).powi(2)).sum() };

    let mut params = DVector::from_column_slice(initial);
    let mut sse = sse_at(params.as_slice());
    if !sse.is_finite() {
        return Err(AppError::numerical("Model is not finite at the initial guess."));
    }

    let mut lambda = options.initial_lambda;
    let mut jac = DMatrix::<f64>::zeros(n, m);
    let mut resid = DVector::<f64>::zeros(n);
    let mut row = vec![0.0; m];

    for iteration in 1..=options.max_iterations {
        if sse == 0.0 {
            return Ok(outcome(&params, sse, iteration - 1));
        }

        for i in 0..n {
            resid[i] = y[i] - model(t[i], params.as_slice());
            jacobian(t[i], params.as_slice(), &mut row);
            for (j, &v) in row.iter().enumerate() {
                jac[(i, j)] = v;
            }
        }
        let jtj = jac.transpose() * &jac;
        let grad = jac.transpose() * &resid;

        let mut accepted = None;
        while lambda <= LAMBDA_MAX {
            let mut damped = jtj.clone();
            for j in 0..m {
                damped[(j, j)] += lambda * jtj[(j, j)].max(1e-12);
            }
            let Some(step) = damped.cholesky().map(|c| c.solve(&grad)) else {
                lambda *= 10.0;
                continue;
            };

            let candidate = &params + &step;
            let candidate_sse = sse_at(candidate.as_slice());
            if candidate_sse.is_finite() && candidate_sse <= sse {
                lambda = (lambda / 10.0).max(LAMBDA_MIN);
                accepted = Some((candidate, candidate_sse, step));
                break;
            }
            lambda *= 10.0;
        }

        let Some((candidate, candidate_sse, step)) = accepted else {
            // No damped step improves the SSE: the current point is a minimum
            // to working precision.
            debug!(iteration, sse, "solver stalled at minimum");
            return Ok(outcome(&params, sse, iteration));
        };

        let reduction = (sse - candidate_sse) / sse;
        let step_norm = step.norm();
        let scale = params.norm() + options.xtol;
        params = candidate;
        sse = candidate_sse;
        debug!(iteration, sse, lambda, step_norm, "solver step accepted");

        if reduction <= options.ftol || step_norm <= options.xtol * scale {
            return Ok(outcome(&params, sse, iteration));
        }
    }

    Err(AppError::Fit {
        message: format!("did not converge within {} iterations (SSE {sse:.6e})", options.max_iterations),
        last_params: params.iter().copied().collect(),
        iterations: options.max_iterations,
    })
}

fn outcome(params: &DVector<f64>, sse: f64, iterations: usize) -> SolverOutcome {
    SolverOutcome {
        params: params.iter().copied().collect(),
        sse,
        iterations,
    }
}
