//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - used in-memory while the pipeline runs
//! - exported to JSON/CSV
//! - reloaded later for forecasting without the original data

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::SolverOptions;

/// Relative spacing tolerance used when checking for regular sampling.
///
/// Monthly decimal-year stamps drift by a few days from month to month, so
/// the check only catches real gaps (dropped rows), not calendar jitter.
pub const SPACING_REL_TOL: f64 = 0.25;

/// An ordered, strictly increasing sequence of `(time, value)` samples.
///
/// Construction validates the invariants once; every derived series is built
/// through the same checks, so consumers can rely on them.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Series {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, AppError> {
        if times.len() != values.len() {
            return Err(AppError::input(format!(
                "Series has {} times but {} values.",
                times.len(),
                values.len()
            )));
        }
        if times.is_empty() {
            return Err(AppError::input("Series has no samples."));
        }
        if let Some(i) = times
            .iter()
            .zip(values.iter())
            .position(|(t, v)| !(t.is_finite() && v.is_finite()))
        {
            return Err(AppError::input(format!("Non-finite sample at index {i}.")));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AppError::input(format!(
                "Times must be strictly increasing (index {} -> {}: {} -> {}).",
                i,
                i + 1,
                times[i],
                times[i + 1]
            )));
        }
        Ok(Self { times, values })
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, AppError> {
        let (times, values) = pairs.iter().copied().unzip();
        Self::new(times, values)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    pub fn first_time(&self) -> f64 {
        self.times[0]
    }

    pub fn last_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Fail with an input error unless the series has at least `min` samples.
    pub fn require_len(&self, min: usize, purpose: &str) -> Result<(), AppError> {
        if self.len() < min {
            return Err(AppError::input(format!(
                "{purpose} needs at least {min} samples, got {}.",
                self.len()
            )));
        }
        Ok(())
    }

    /// Sub-range `[start, end)` as a new series.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self, AppError> {
        if start >= end || end > self.len() {
            return Err(AppError::input(format!(
                "Invalid slice {start}..{end} of a series with {} samples.",
                self.len()
            )));
        }
        Ok(Self {
            times: self.times[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Same sample times with new values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self, AppError> {
        Self::new(self.times.clone(), values)
    }

    /// Average sampling interval, `None` for a single sample.
    pub fn sampling_interval(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        Some((self.last_time() - self.first_time()) / (self.len() - 1) as f64)
    }

    /// Whether every gap is within `rel_tol` of the average interval.
    pub fn is_regular(&self, rel_tol: f64) -> bool {
        let Some(dt) = self.sampling_interval() else {
            return true;
        };
        self.times
            .windows(2)
            .all(|w| ((w[1] - w[0]) - dt).abs() <= rel_tol * dt)
    }
}

/// Polynomial trend with coefficients ordered highest degree first.
///
/// Deserialization goes through `TrendModel::new`, so a loaded model has the
/// same invariants as a fitted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTrend")]
pub struct TrendModel {
    pub degree: usize,
    pub coefficients: Vec<f64>,
}

impl TrendModel {
    pub fn new(coefficients: Vec<f64>) -> Result<Self, AppError> {
        if coefficients.is_empty() {
            return Err(AppError::input("Trend polynomial needs at least one coefficient."));
        }
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AppError::numerical("Trend polynomial has non-finite coefficients."));
        }
        Ok(Self {
            degree: coefficients.len() - 1,
            coefficients,
        })
    }

    /// Evaluate with Horner's scheme. Valid for any `t`, including extrapolation.
    pub fn evaluate(&self, t: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, &c| acc * t + c)
    }
}

#[derive(Deserialize)]
struct StoredTrend {
    degree: Option<usize>,
    coefficients: Vec<f64>,
}

impl TryFrom<StoredTrend> for TrendModel {
    type Error = AppError;

    fn try_from(stored: StoredTrend) -> Result<Self, Self::Error> {
        let model = TrendModel::new(stored.coefficients)?;
        match stored.degree {
            Some(degree) if degree != model.degree => Err(AppError::input(format!(
                "Trend degree {degree} does not match {} coefficients.",
                model.coefficients.len()
            ))),
            _ => Ok(model),
        }
    }
}

/// Sinusoid `amplitude · sin(frequency · t + phase) + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalModel {
    pub amplitude: f64,
    /// Angular frequency (radians per time unit).
    pub frequency: f64,
    pub phase: f64,
    pub offset: f64,
}

impl SeasonalModel {
    pub fn from_params(p: &[f64]) -> Self {
        Self {
            amplitude: p[0],
            frequency: p[1],
            phase: p[2],
            offset: p[3],
        }
    }

    pub fn params(&self) -> [f64; 4] {
        [self.amplitude, self.frequency, self.phase, self.offset]
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        self.amplitude * (self.frequency * t + self.phase).sin() + self.offset
    }

    /// Period `2π / frequency` in time units.
    pub fn period(&self) -> f64 {
        std::f64::consts::TAU / self.frequency
    }
}

/// Goodness-of-fit diagnostics shared by every fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub n: usize,
}

/// Extra statistics reported for a straight-line fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearStats {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
    /// Two-tailed p-value for H0: slope = 0. Never clamped.
    pub p_value: f64,
    pub slope_stderr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub model: TrendModel,
    pub quality: FitQuality,
    /// Only present for degree-1 fits.
    pub linear: Option<LinearStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalFit {
    pub model: SeasonalModel,
    pub quality: FitQuality,
    pub initial_guess: SeasonalModel,
    pub iterations: usize,
}

/// One evaluated point of the combined model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: f64,
    pub trend: f64,
    pub seasonal: f64,
    pub value: f64,
}

/// Which whitespace-separated columns hold time and value (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub time_column: usize,
    pub value_column: usize,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            time_column: 2,
            value_column: 3,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags (plus defaults); library callers build it directly.
#[derive(Debug, Clone)]
pub struct DecompConfig {
    pub columns: ColumnSpec,

    pub trend_degree: usize,
    /// Moving-average window (even, >= 2).
    pub window: usize,

    /// Period used to derive the automatic sinusoid guess.
    pub seasonal_period: f64,
    /// Explicit sinusoid starting point; overrides the automatic guess.
    pub seasonal_guess: Option<SeasonalModel>,
    pub solver: SolverOptions,

    /// Display floor for p-values (presentation only).
    pub p_value_floor: f64,

    /// Last time to forecast to; `None` disables the forecast.
    pub forecast_until: Option<f64>,
    /// Forecast step; defaults to the series sampling interval.
    pub forecast_step: Option<f64>,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
    pub debug_bundle: Option<PathBuf>,
}

impl Default for DecompConfig {
    fn default() -> Self {
        Self {
            columns: ColumnSpec::default(),
            trend_degree: 2,
            window: 12,
            seasonal_period: 1.0,
            seasonal_guess: None,
            solver: SolverOptions::default(),
            p_value_floor: 0.001,
            forecast_until: None,
            forecast_step: None,
            plot: true,
            plot_width: 100,
            plot_height: 25,
            export_results: None,
            export_model: None,
            debug_bundle: None,
        }
    }
}

/// A saved model file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub time_range: [f64; 2],
    pub sampling_interval: Option<f64>,
    pub window: usize,
    pub trend: TrendModel,
    pub trend_quality: FitQuality,
    pub seasonal: SeasonalModel,
    pub seasonal_quality: FitQuality,
    pub forecast: Vec<ForecastPoint>,
}
