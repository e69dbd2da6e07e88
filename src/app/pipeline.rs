//! Shared decomposition pipeline used by the CLI and library callers.
//!
//! Fixed stage order, each stage taking the previous stage's output:
//!
//! trend fit -> moving-average detrend -> sinusoid fit -> residual -> forecast
//!
//! No state is kept between stages or runs.

use tracing::{info, warn};

use crate::data::NoaaClient;
use crate::domain::{DecompConfig, ForecastPoint, SeasonalFit, Series, TrendFit};
use crate::error::AppError;
use crate::fit::{MIN_SEASONAL_SAMPLES, Smoothed, estimate_guess, fit_sinusoid, fit_trend, smooth, validate_window};
use crate::io::ingest::{IngestedData, ingest_file, ingest_str};
use crate::math::{mean, std_dev};
use crate::models::CombinedModel;

/// Where `trendfit fit` reads its data from.
#[derive(Debug, Clone)]
pub enum DataSource {
    File(std::path::PathBuf),
    Url(String),
}

/// Every derived series and fitted model of one decomposition.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Straight-line fit (always computed, for the slope/r/p report).
    pub linear: TrendFit,
    /// Trend at the configured degree; this is the trend used by the model.
    pub trend: TrendFit,
    pub smoothed: Smoothed,
    /// Raw minus running mean over the aligned subrange.
    pub detrended: Series,
    pub seasonal: SeasonalFit,
    /// Detrended minus fitted sinusoid.
    pub residuals: Vec<f64>,
    pub model: CombinedModel,
    /// Observed minus combined model at every input sample.
    pub model_residuals: Vec<f64>,
    pub forecast: Vec<ForecastPoint>,
}

impl Decomposition {
    /// Largest absolute model residual over the input samples.
    pub fn max_abs_model_residual(&self) -> f64 {
        self.model_residuals.iter().fold(0.0, |acc, r| acc.max(r.abs()))
    }

    pub fn residual_mean(&self) -> f64 {
        mean(&self.residuals)
    }

    pub fn residual_std(&self) -> f64 {
        std_dev(&self.residuals)
    }
}

/// All computed outputs of a single `trendfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub decomposition: Decomposition,
}

/// Load the data and run the decomposition.
pub fn run_fit(source: &DataSource, config: &DecompConfig) -> Result<RunOutput, AppError> {
    let ingest = match source {
        DataSource::File(path) => ingest_file(path, config.columns)?,
        DataSource::Url(url) => {
            let text = NoaaClient::with_url(url.as_str())?.fetch_text()?;
            ingest_str(&text, url, config.columns)?
        }
    };
    let decomposition = decompose(&ingest.series, config)?;
    Ok(RunOutput { ingest, decomposition })
}

/// Decompose `series` into trend, season and residual, then forecast.
pub fn decompose(series: &Series, config: &DecompConfig) -> Result<Decomposition, AppError> {
    // Validate everything up front so no fit runs on input that cannot finish.
    series.require_len(config.trend_degree.max(1) + 1, "The trend fit")?;
    series.require_len(MIN_SEASONAL_SAMPLES, "The decomposition")?;
    validate_window(config.window, series.len())?;
    let n_smoothed = series.len() - config.window + 1;
    if n_smoothed < MIN_SEASONAL_SAMPLES {
        return Err(AppError::input(format!(
            "Window {} leaves {n_smoothed} smoothed samples; the sinusoid fit needs {MIN_SEASONAL_SAMPLES}.",
            config.window
        )));
    }

    let linear = fit_trend(series, 1)?;
    let trend = if config.trend_degree == 1 {
        linear.clone()
    } else {
        fit_trend(series, config.trend_degree)?
    };

    let smoothed = smooth(series, config.window)?;
    let detrended = smoothed.detrended()?;

    let guess = match config.seasonal_guess {
        Some(guess) => guess,
        None => estimate_guess(&detrended, config.seasonal_period)?,
    };
    let seasonal = fit_sinusoid(&detrended, &guess, &config.solver)?;

    let residuals: Vec<f64> = detrended
        .iter()
        .map(|(t, v)| v - seasonal.model.evaluate(t))
        .collect();

    let model = CombinedModel::new(trend.model.clone(), seasonal.model);
    let model_residuals: Vec<f64> = series.iter().map(|(t, v)| v - model.evaluate(t)).collect();

    let forecast = match config.forecast_until {
        Some(until) => {
            let step = match config.forecast_step {
                Some(step) => step,
                None => series
                    .sampling_interval()
                    .ok_or_else(|| AppError::config("Cannot infer a forecast step from one sample."))?,
            };
            let start = series.last_time() + step;
            if until < start {
                warn!(until, last = series.last_time(), "forecast end is not after the data; no forecast");
            }
            model.forecast_range(start, until, step)?
        }
        None => Vec::new(),
    };

    let decomposition = Decomposition {
        linear,
        trend,
        smoothed,
        detrended,
        seasonal,
        residuals,
        model,
        model_residuals,
        forecast,
    };

    info!(
        residual_std = decomposition.residual_std(),
        max_abs_model_residual = decomposition.max_abs_model_residual(),
        forecast_points = decomposition.forecast.len(),
        "decomposition complete"
    );

    Ok(decomposition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticSpec, generate_series};

    fn noise_free() -> SyntheticSpec {
        SyntheticSpec {
            noise_sd: 0.0,
            count: 240,
            ..SyntheticSpec::default()
        }
    }

    #[test]
    fn decomposition_recovers_synthetic_components() {
        let spec = SyntheticSpec {
            noise_sd: 0.1,
            ..SyntheticSpec::default()
        };
        let series = generate_series(&spec).unwrap();
        let out = decompose(&series, &DecompConfig::default()).unwrap();

        assert_eq!(out.trend.model.degree, 2);
        assert!(out.trend.quality.r_squared > 0.99);
        assert!(out.linear.linear.as_ref().unwrap().p_value < 1e-3);

        let s = out.seasonal.model;
        assert!((s.amplitude.abs() - 3.0).abs() < 0.1, "{s:?}");
        assert!((s.period() - 1.0).abs() < 0.01, "{s:?}");
    }

    #[test]
    fn combined_model_reproduces_series_within_residuals() {
        let series = generate_series(&noise_free()).unwrap();
        let out = decompose(&series, &DecompConfig::default()).unwrap();

        // Noise-free input: only the small smoothing bias remains.
        assert!(out.max_abs_model_residual() < 0.2, "{}", out.max_abs_model_residual());
        for ((t, v), r) in series.iter().zip(out.model_residuals.iter()) {
            assert!((v - out.model.evaluate(t) - r).abs() < 1e-9);
        }
    }

    #[test]
    fn smoothing_alignment_lengths() {
        let series = generate_series(&noise_free()).unwrap();
        let config = DecompConfig {
            window: 12,
            ..DecompConfig::default()
        };
        let out = decompose(&series, &config).unwrap();
        assert_eq!(out.smoothed.values.len(), 240 - 12 + 1);
        assert_eq!(out.detrended.len(), out.smoothed.values.len());
        assert_eq!(out.residuals.len(), out.detrended.len());
        assert_eq!(out.detrended.first_time(), series.times()[6]);
        assert_eq!(out.detrended.last_time(), series.times()[240 - 6]);
    }

    #[test]
    fn forecast_extends_past_data() {
        let series = generate_series(&noise_free()).unwrap();
        let config = DecompConfig {
            forecast_until: Some(series.last_time() + 2.0),
            ..DecompConfig::default()
        };
        let out = decompose(&series, &config).unwrap();
        assert_eq!(out.forecast.len(), 24);
        assert!(out.forecast[0].time > series.last_time());
        for p in &out.forecast {
            assert!((p.value - out.model.evaluate(p.time)).abs() < 1e-12);
        }
    }

    #[test]
    fn invalid_window_fails_before_fitting() {
        let series = generate_series(&noise_free()).unwrap();
        let config = DecompConfig {
            window: 13,
            ..DecompConfig::default()
        };
        assert!(matches!(decompose(&series, &config), Err(AppError::Configuration(_))));
    }

    #[test]
    fn too_short_series_is_an_input_error() {
        let series = Series::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]).unwrap();
        let config = DecompConfig {
            window: 2,
            ..DecompConfig::default()
        };
        assert!(matches!(decompose(&series, &config), Err(AppError::Input(_))));
    }

    #[test]
    fn window_leaving_too_few_samples_is_an_input_error() {
        let series = generate_series(&SyntheticSpec {
            count: 14,
            ..noise_free()
        })
        .unwrap();
        assert!(matches!(
            decompose(&series, &DecompConfig::default()),
            Err(AppError::Input(_))
        ));
    }
}
