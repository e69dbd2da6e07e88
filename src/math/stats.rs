//! Descriptive statistics and regression diagnostics.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::domain::{FitQuality, LinearStats};
use crate::error::AppError;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Sum of squared differences between observations and fitted values.
pub fn sse(observed: &[f64], fitted: &[f64]) -> f64 {
    observed
        .iter()
        .zip(fitted.iter())
        .map(|(o, f)| (o - f).powi(2))
        .sum()
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant series has `SS_tot = 0`; it scores 1.0 when fitted exactly and
/// 0.0 otherwise.
pub fn r_squared(observed: &[f64], fitted: &[f64]) -> f64 {
    let m = mean(observed);
    let ss_tot: f64 = observed.iter().map(|o| (o - m).powi(2)).sum();
    let ss_res = sse(observed, fitted);
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn fit_quality(observed: &[f64], fitted: &[f64]) -> FitQuality {
    let n = observed.len();
    let sse = sse(observed, fitted);
    FitQuality {
        sse,
        rmse: (sse / n.max(1) as f64).sqrt(),
        r_squared: r_squared(observed, fitted),
        n,
    }
}

/// Straight-line regression with correlation and slope significance.
///
/// The p-value is two-tailed against H0: slope = 0 using Student's t with
/// `n - 2` degrees of freedom.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<LinearStats, AppError> {
    if x.len() != y.len() {
        return Err(AppError::input("Regression inputs differ in length."));
    }
    let n = x.len();
    if n < 2 {
        return Err(AppError::input(format!(
            "Linear regression needs at least 2 samples, got {n}."
        )));
    }

    let x_mean = mean(x);
    let y_mean = mean(y);
    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ssxm += dx * dx;
        ssym += dy * dy;
        ssxym += dx * dy;
    }
    if ssxm == 0.0 {
        return Err(AppError::numerical("All x values are identical; slope is undefined."));
    }

    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;
    let r = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };

    if n == 2 {
        let p_value = if ssym == 0.0 { 1.0 } else { 0.0 };
        return Ok(LinearStats {
            slope,
            intercept,
            r,
            p_value,
            slope_stderr: 0.0,
        });
    }

    let df = (n - 2) as f64;
    let one_minus_r2 = ((1.0 - r) * (1.0 + r)).max(0.0);
    let slope_stderr = (one_minus_r2 * ssym / ssxm / df).sqrt();

    let p_value = if one_minus_r2 == 0.0 {
        0.0
    } else {
        let t = r * (df / one_minus_r2).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| AppError::numerical(format!("Student's t distribution error: {e}")))?;
        (2.0 * dist.sf(t.abs())).min(1.0)
    };

    Ok(LinearStats {
        slope,
        intercept,
        r,
        p_value,
        slope_stderr,
    })
}
