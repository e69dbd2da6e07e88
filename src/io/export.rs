//! Export decomposition results, forecasts and series to text files.
//!
//! The CSV exports are meant to be easy to consume in spreadsheets or
//! downstream scripts. Cells that a stage does not cover (the edges trimmed
//! by the moving average) are left blank.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::app::pipeline::Decomposition;
use crate::domain::{ForecastPoint, Series};
use crate::error::AppError;

/// Write one CSV row per input sample with every stage's value.
pub fn write_decomposition_csv(path: &Path, series: &Series, d: &Decomposition) -> Result<(), AppError> {
    let mut file = create(path, "export CSV")?;

    writeln!(file, "time,value,trend,smoothed,detrended,seasonal,residual,model")
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    let offset = d.smoothed.start_offset();
    let aligned = d.smoothed.values.len();
    let detrended = d.detrended.values();

    for (i, (t, v)) in series.iter().enumerate() {
        let stage = i
            .checked_sub(offset)
            .filter(|&j| j < aligned)
            .map(|j| {
                format!(
                    "{:.6},{:.6},{:.6},{:.6}",
                    d.smoothed.values[j],
                    detrended[j],
                    d.seasonal.model.evaluate(t),
                    d.residuals[j]
                )
            })
            .unwrap_or_else(|| ",,,".to_string());

        writeln!(
            file,
            "{:.6},{:.6},{:.6},{},{:.6}",
            t,
            v,
            d.trend.model.evaluate(t),
            stage,
            d.model.evaluate(t),
        )
        .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    file.flush()
        .map_err(|e| AppError::io(format!("Failed to write export CSV: {e}")))?;
    Ok(())
}

/// Write forecast points as CSV.
pub fn write_forecast_csv(path: &Path, points: &[ForecastPoint]) -> Result<(), AppError> {
    let mut file = create(path, "forecast CSV")?;

    writeln!(file, "time,trend,seasonal,value")
        .map_err(|e| AppError::io(format!("Failed to write forecast CSV header: {e}")))?;
    for p in points {
        writeln!(file, "{:.6},{:.6},{:.6},{:.6}", p.time, p.trend, p.seasonal, p.value)
            .map_err(|e| AppError::io(format!("Failed to write forecast CSV row: {e}")))?;
    }

    file.flush()
        .map_err(|e| AppError::io(format!("Failed to write forecast CSV: {e}")))?;
    Ok(())
}

/// Write a series in the NOAA monthly layout: `year month decimal value`.
///
/// The output reads back with the default columns (time 2, value 3).
pub fn write_series_text(path: &Path, series: &Series) -> Result<(), AppError> {
    let mut file = create(path, "series file")?;

    writeln!(file, "# trendfit synthetic series")
        .map_err(|e| AppError::io(format!("Failed to write series header: {e}")))?;
    writeln!(file, "# year month decimal value")
        .map_err(|e| AppError::io(format!("Failed to write series header: {e}")))?;
    for (t, v) in series.iter() {
        let year = t.floor();
        let month = (((t - year) * 12.0).floor() as u32 + 1).min(12);
        writeln!(file, "{:4} {:>3} {:>10.4} {:>8.2}", year as i64, month, t, v)
            .map_err(|e| AppError::io(format!("Failed to write series row: {e}")))?;
    }

    file.flush()
        .map_err(|e| AppError::io(format!("Failed to write series file: {e}")))?;
    Ok(())
}

fn create(path: &Path, what: &str) -> Result<BufWriter<File>, AppError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AppError::io(format!("Failed to create {what} '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::decompose;
    use crate::data::{SyntheticSpec, generate_series};
    use crate::domain::{ColumnSpec, DecompConfig};
    use crate::io::ingest::ingest_str;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("trendfit-{name}-{}", std::process::id()))
    }

    #[test]
    fn decomposition_csv_leaves_trimmed_edges_blank() {
        let spec = SyntheticSpec {
            count: 60,
            ..SyntheticSpec::default()
        };
        let series = generate_series(&spec).unwrap();
        let d = decompose(&series, &DecompConfig::default()).unwrap();

        let path = temp_path("decomp.csv");
        write_decomposition_csv(&path, &series, &d).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 61);
        assert_eq!(lines[0], "time,value,trend,smoothed,detrended,seasonal,residual,model");

        // window 12 trims 6 samples at the start and 5 at the end
        let blank = |line: &str| line.split(',').nth(3) == Some("");
        assert!(lines[1..7].iter().all(|l| blank(l)));
        assert!(!blank(lines[7]));
        assert!(!blank(lines[55]));
        assert!(lines[56..].iter().all(|l| blank(l)));
        assert!(lines.iter().all(|l| l.split(',').count() == 8));
    }

    #[test]
    fn series_text_reads_back_with_default_columns() {
        let series = Series::new(vec![1958.2027, 1958.2877, 1958.3699], vec![315.7, 317.45, 317.51]).unwrap();
        let path = temp_path("series.txt");
        write_series_text(&path, &series).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(text.contains("1958   3  1958.2027   315.70"), "{text}");
        let ingest = ingest_str(&text, "roundtrip", ColumnSpec::default()).unwrap();
        assert_eq!(ingest.series.len(), 3);
        assert!((ingest.series.values()[1] - 317.45).abs() < 1e-9);
    }

    #[test]
    fn forecast_csv_has_one_row_per_point() {
        let points = vec![
            ForecastPoint {
                time: 2030.0,
                trend: 440.0,
                seasonal: 1.5,
                value: 441.5,
            },
            ForecastPoint {
                time: 2030.5,
                trend: 441.0,
                seasonal: -1.5,
                value: 439.5,
            },
        ];
        let path = temp_path("forecast.csv");
        write_forecast_csv(&path, &points).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2030.000000,440.000000,1.500000,441.500000");
    }
}
