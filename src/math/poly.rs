//! Polynomial least squares.
//!
//! Decimal-year times sit around 2000, so a raw Vandermonde matrix has
//! columns `1, t, t²` that are almost collinear. We fit in the affine variable
//! `u = (t - center) / scale` and expand the result back to coefficients in
//! `t`, which is what callers evaluate.

use nalgebra::DVector;

use crate::error::AppError;
use crate::math::ols::{design_matrix, solve_least_squares};

/// Fit a degree-`degree` polynomial to `(x, y)`.
///
/// Returns coefficients ordered highest degree first.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>, AppError> {
    if x.len() != y.len() {
        return Err(AppError::input("polyfit: x and y lengths differ."));
    }
    let n_coef = degree + 1;
    if x.len() < n_coef {
        return Err(AppError::input(format!(
            "A degree-{degree} polynomial needs at least {n_coef} samples, got {}.",
            x.len()
        )));
    }

    let (center, scale) = affine_normalization(x);

    // Columns in increasing power of u.
    let design = design_matrix(x.len(), n_coef, |i, row| {
        let u = (x[i] - center) / scale;
        let mut p = 1.0;
        for v in row.iter_mut() {
            *v = p;
            p *= u;
        }
    });
    let rhs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &rhs)
        .ok_or_else(|| AppError::numerical(format!("Degree-{degree} trend system is singular.")))?;

    let mut low_first = expand_affine(beta.as_slice(), 1.0 / scale, -center / scale);
    low_first.reverse();
    Ok(low_first)
}

/// Center and half-range used to map `x` onto roughly `[-1, 1]`.
fn affine_normalization(x: &[f64]) -> (f64, f64) {
    let min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let center = 0.5 * (min + max);
    let half = 0.5 * (max - min);
    let scale = if half > 0.0 && half.is_finite() { half } else { 1.0 };
    (center, scale)
}

/// Rewrite `Σ b_k u^k` with `u = alpha·t + beta` as a polynomial in `t`.
///
/// Input and output are ordered lowest degree first.
fn expand_affine(b: &[f64], alpha: f64, beta: f64) -> Vec<f64> {
    let mut acc: Vec<f64> = vec![0.0; b.len()];
    // Horner over polynomials: acc = acc·(alpha t + beta) + b_k
    for &bk in b.iter().rev() {
        let mut next = vec![0.0; b.len()];
        for (k, &a) in acc.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            next[k] += a * beta;
            if k + 1 < next.len() {
                next[k + 1] += a * alpha;
            }
        }
        next[0] += bk;
        acc = next;
    }
    acc
}
