//! Ordinary least squares solver.
//!
//! Both fitting stages end in a small linear least-squares problem:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! - the polynomial trend, where `x_i` is a (scaled) Vandermonde row
//! - the automatic sinusoid guess, where `x_i = [sin(f t_i), cos(f t_i), 1]`
//!
//! We solve through SVD so tall design matrices work (nalgebra's `QR::solve`
//! only handles square systems). Parameter dimension is tiny, so SVD cost
//! does not matter.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() < x.ncols() {
        return None;
    }

    let svd = x.clone().svd(true, true);

    // Singular values below the tolerance are treated as zero; try stricter
    // cutoffs first so well-posed problems keep full precision.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build a dense design matrix from a row generator.
pub fn design_matrix(n_rows: usize, n_cols: usize, mut fill_row: impl FnMut(usize, &mut [f64])) -> DMatrix<f64> {
    let mut x = DMatrix::<f64>::zeros(n_rows, n_cols);
    let mut row = vec![0.0; n_cols];
    for i in 0..n_rows {
        fill_row(i, &mut row);
        for (j, &v) in row.iter().enumerate() {
            x[(i, j)] = v;
        }
    }
    x
}
