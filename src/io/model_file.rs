//! Read/write model JSON files.
//!
//! A model file is the portable form of a fitted decomposition:
//! - trend polynomial coefficients + sinusoid parameters
//! - fit quality of each stage
//! - run metadata (source, fitted time range, sampling interval)
//! - the forecast grid computed at fit time, if any
//!
//! `trendfit forecast --model` reloads it and evaluates new times without the
//! original data. The schema is defined by `domain::ModelFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::Utc;

use crate::app::pipeline::Decomposition;
use crate::domain::ModelFile;
use crate::error::AppError;
use crate::io::ingest::IngestedData;
use crate::models::CombinedModel;

/// Assemble the model file for a finished run.
pub fn build_model_file(ingest: &IngestedData, d: &Decomposition) -> ModelFile {
    ModelFile {
        tool: "trendfit".to_string(),
        generated_at: Utc::now(),
        source: ingest.source.clone(),
        time_range: [ingest.stats.time_min, ingest.stats.time_max],
        sampling_interval: ingest.stats.sampling_interval,
        window: d.smoothed.window,
        trend: d.trend.model.clone(),
        trend_quality: d.trend.quality.clone(),
        seasonal: d.seasonal.model,
        seasonal_quality: d.seasonal.quality.clone(),
        forecast: d.forecast.clone(),
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create model JSON '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, model)
        .map_err(|e| AppError::Serialization(format!("Failed to write model JSON: {e}")))?;
    out.flush()
        .map_err(|e| AppError::io(format!("Failed to write model JSON '{}': {e}", path.display())))?;
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::Serialization(format!("Invalid model JSON '{}': {e}", path.display())))?;
    let s = &model.seasonal;
    if s.params().iter().any(|p| !p.is_finite()) || s.frequency == 0.0 {
        return Err(AppError::input(format!(
            "Model JSON '{}' has an invalid sinusoid {:?}.",
            path.display(),
            s.params()
        )));
    }
    Ok(model)
}

impl ModelFile {
    /// The combined trend + season model stored in this file.
    pub fn combined(&self) -> CombinedModel {
        CombinedModel::new(self.trend.clone(), self.seasonal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, SeasonalModel, TrendModel};

    fn sample_model() -> ModelFile {
        let quality = FitQuality {
            sse: 1.0,
            rmse: 0.1,
            r_squared: 0.99,
            n: 100,
        };
        ModelFile {
            tool: "trendfit".to_string(),
            generated_at: Utc::now(),
            source: "unit-test".to_string(),
            time_range: [1958.2, 2024.9],
            sampling_interval: Some(1.0 / 12.0),
            window: 12,
            trend: TrendModel::new(vec![0.0125, -47.0, 44_500.0]).unwrap(),
            trend_quality: quality.clone(),
            seasonal: SeasonalModel {
                amplitude: 3.0,
                frequency: std::f64::consts::TAU,
                phase: 0.5,
                offset: 0.0,
            },
            seasonal_quality: quality,
            forecast: Vec::new(),
        }
    }

    #[test]
    fn saved_model_reproduces_predictions() {
        let path = std::env::temp_dir().join(format!("trendfit-model-{}.json", std::process::id()));
        let model = sample_model();
        write_model_json(&path, &model).unwrap();
        let loaded = read_model_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let before = model.combined();
        let after = loaded.combined();
        for t in [2030.0, 2040.5, 2050.25] {
            assert!((before.evaluate(t) - after.evaluate(t)).abs() < 1e-9);
        }
        assert_eq!(loaded.window, 12);
        assert_eq!(loaded.source, "unit-test");
    }

    #[test]
    fn invalid_json_is_a_serialization_error() {
        let path = std::env::temp_dir().join(format!("trendfit-bad-model-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_model_json(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, AppError::Serialization(_)), "{err:?}");
    }

    #[test]
    fn inconsistent_trend_is_rejected_on_load() {
        let model = sample_model();
        let mut json = serde_json::to_value(&model).unwrap();
        json["trend"] = serde_json::json!({ "degree": 1, "coefficients": [1.0, 2.0, 3.0] });
        let path = std::env::temp_dir().join(format!("trendfit-degree-model-{}.json", std::process::id()));
        std::fs::write(&path, json.to_string()).unwrap();
        let err = read_model_json(&path).unwrap_err();

        json["trend"] = serde_json::json!({ "degree": 0, "coefficients": [] });
        std::fs::write(&path, json.to_string()).unwrap();
        let empty = read_model_json(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, AppError::Serialization(_)), "{err:?}");
        assert!(err.to_string().contains("does not match"), "{err}");
        assert!(matches!(empty, AppError::Serialization(_)), "{empty:?}");
    }

    #[test]
    fn zero_frequency_is_rejected_on_load() {
        let mut model = sample_model();
        model.seasonal.frequency = 0.0;
        let path = std::env::temp_dir().join(format!("trendfit-freq-model-{}.json", std::process::id()));
        write_model_json(&path, &model).unwrap();
        let err = read_model_json(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, AppError::Input(_)), "{err:?}");
    }

    #[test]
    fn written_file_is_complete_json() {
        let path = std::env::temp_dir().join(format!("trendfit-flush-model-{}.json", std::process::id()));
        write_model_json(&path, &sample_model()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(text.trim_end().ends_with('}'));
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_model_json(Path::new("no/such/model.json")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
