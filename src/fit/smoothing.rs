//! Fixed-window running mean used as a trend-free filter.
//!
//! For a window of `N` samples the filtered value at output index `i` is
//!
//! ```text
//! (cumsum[i + N] - cumsum[i]) / N
//! ```
//!
//! where `cumsum` is the prefix sum with a leading zero. There are
//! `n - N + 1` outputs and no edge padding.
//!
//! Aligning the output with the raw series: with an even window the output
//! at index `i` lines up with raw sample `i + N/2`, so the raw subrange drops
//! `N/2` samples from the start and `N/2 - 1` from the end. Getting this off
//! by one shifts every seasonal residual by one sample.

use tracing::info;

use crate::domain::Series;
use crate::error::AppError;

/// Smoothed values together with the raw subrange they line up with.
#[derive(Debug, Clone, PartialEq)]
pub struct Smoothed {
    pub window: usize,
    /// Raw samples at the positions the filter output refers to.
    pub aligned: Series,
    /// Filter output, same length as `aligned`.
    pub values: Vec<f64>,
}

impl Smoothed {
    /// Raw minus running mean over the aligned subrange.
    pub fn detrended(&self) -> Result<Series, AppError> {
        let values = self
            .aligned
            .values()
            .iter()
            .zip(self.values.iter())
            .map(|(raw, smooth)| raw - smooth)
            .collect();
        self.aligned.with_values(values)
    }

    /// Index of the first aligned sample in the original series.
    pub fn start_offset(&self) -> usize {
        self.window / 2
    }
}

/// Check that `window` is even, at least 2, and shorter than the series.
pub fn validate_window(window: usize, len: usize) -> Result<(), AppError> {
    if window < 2 || window % 2 != 0 {
        return Err(AppError::config(format!(
            "Moving-average window must be even and >= 2, got {window}."
        )));
    }
    if window >= len {
        return Err(AppError::config(format!(
            "Moving-average window {window} must be shorter than the series ({len} samples)."
        )));
    }
    Ok(())
}

/// Prefix-sum running mean with window `window`.
pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<f64>, AppError> {
    validate_window(window, values.len())?;

    let mut cumsum = Vec::with_capacity(values.len() + 1);
    cumsum.push(0.0);
    let mut acc = 0.0;
    for &v in values {
        acc += v;
        cumsum.push(acc);
    }

    let n_out = values.len() - window + 1;
    let denom = window as f64;
    Ok((0..n_out).map(|i| (cumsum[i + window] - cumsum[i]) / denom).collect())
}

/// Raw subrange matching `moving_average(series.values(), window)`.
pub fn align_to_moving_average(series: &Series, window: usize) -> Result<Series, AppError> {
    validate_window(window, series.len())?;
    let start = window / 2;
    let end = series.len() - (window / 2 - 1);
    series.slice(start, end)
}

/// Smooth `series` and return the filter output with its aligned raw samples.
pub fn smooth(series: &Series, window: usize) -> Result<Smoothed, AppError> {
    let values = moving_average(series.values(), window)?;
    let aligned = align_to_moving_average(series, window)?;
    debug_assert_eq!(values.len(), aligned.len());

    info!(window, n_out = values.len(), "moving average computed");

    Ok(Smoothed {
        window,
        aligned,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Series {
        let times: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let values = times.clone();
        Series::new(times, values).unwrap()
    }

    #[test]
    fn constant_series_stays_constant() {
        let values = vec![7.5; 40];
        for window in [2, 4, 12, 24] {
            let out = moving_average(&values, window).unwrap();
            assert!(out.iter().all(|v| (v - 7.5).abs() < 1e-12), "window {window}");
        }
    }

    #[test]
    fn output_and_aligned_lengths_match() {
        let series = ramp(30);
        for window in [2, 4, 6, 12] {
            let s = smooth(&series, window).unwrap();
            assert_eq!(s.values.len(), 30 - window + 1);
            assert_eq!(s.aligned.len(), s.values.len());
        }
    }

    #[test]
    fn alignment_trims_asymmetrically() {
        // n = 10, N = 4: drop 2 from the start and 1 from the end.
        let series = ramp(10);
        let aligned = align_to_moving_average(&series, 4).unwrap();
        assert_eq!(aligned.first_time(), 2.0);
        assert_eq!(aligned.last_time(), 8.0);
        assert_eq!(aligned.len(), 7);
    }

    #[test]
    fn prefix_sum_values() {
        let out = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 2).unwrap();
        assert_eq!(out, vec![1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn ramp_detrends_to_half_step() {
        // Even window on a unit ramp: mean of [i-N/2, i+N/2-1] is i - 0.5.
        let s = smooth(&ramp(20), 4).unwrap();
        let d = s.detrended().unwrap();
        assert!(d.values().iter().all(|v| (v - 0.5).abs() < 1e-12));
    }

    #[test]
    fn invalid_windows_are_configuration_errors() {
        for window in [0, 1, 3, 7] {
            assert!(matches!(moving_average(&[1.0; 10], window), Err(AppError::Configuration(_))));
        }
        assert!(matches!(moving_average(&[1.0; 10], 10), Err(AppError::Configuration(_))));
        assert!(matches!(moving_average(&[1.0; 10], 12), Err(AppError::Configuration(_))));
    }
}
