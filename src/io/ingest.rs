//! Text ingest and validation.
//!
//! Turns a whitespace-delimited data file (NOAA `co2_mm_mlo.txt` layout or
//! anything with numeric columns) into a validated `Series`.
//!
//! Rules:
//! - blank lines and `#` comments are skipped
//! - lines that do not start with a number are headers and are skipped
//! - data-looking lines that are short, non-numeric in the selected columns,
//!   or carry a missing-value sentinel (negative value) are skipped and
//!   reported as row errors
//! - times must be strictly increasing; a violation fails the whole ingest
//! - no fitting logic here

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{ColumnSpec, SPACING_REL_TOL, Series};
use crate::error::AppError;

/// Summary stats about the samples actually loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_points: usize,
    pub time_min: f64,
    pub time_max: f64,
    pub value_min: f64,
    pub value_max: f64,
    pub sampling_interval: Option<f64>,
    pub regular: bool,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated series + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub source: String,
    pub columns: ColumnSpec,
    pub series: Series,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub lines_skipped: usize,
}

/// Read and parse a data file.
pub fn ingest_file(path: &Path, columns: ColumnSpec) -> Result<IngestedData, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read data file '{}': {e}", path.display())))?;
    ingest_str(&text, &path.display().to_string(), columns)
}

/// Parse data already in memory (downloaded text, tests).
pub fn ingest_str(text: &str, source: &str, columns: ColumnSpec) -> Result<IngestedData, AppError> {
    if columns.time_column == columns.value_column {
        return Err(AppError::config(format!(
            "Time and value columns must differ (both are {}).",
            columns.time_column
        )));
    }
    let needed = columns.time_column.max(columns.value_column) + 1;

    let mut times = Vec::new();
    let mut values = Vec::new();
    let mut row_errors = Vec::new();
    let mut lines_skipped = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            lines_skipped += 1;
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let looks_like_data = fields.first().is_some_and(|f| f.parse::<f64>().is_ok());
        if !looks_like_data {
            lines_skipped += 1;
            continue;
        }

        match parse_row(&fields, columns, needed) {
            Ok((t, v)) => {
                if let Some(&prev) = times.last() {
                    if t <= prev {
                        return Err(AppError::input(format!(
                            "{source}:{line}: time {t} does not increase (previous {prev})."
                        )));
                    }
                }
                times.push(t);
                values.push(v);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        warn!(line = err.line, "skipped row: {}", err.message);
    }

    if times.is_empty() {
        return Err(AppError::input(format!("No data rows found in {source}.")));
    }

    let series = Series::new(times, values)?;
    let stats = compute_stats(&series);
    if !stats.regular {
        warn!(source, "samples are not evenly spaced; smoothing assumes a fixed interval");
    }
    info!(
        source,
        n = stats.n_points,
        time_min = stats.time_min,
        time_max = stats.time_max,
        skipped_rows = row_errors.len(),
        "data loaded"
    );

    Ok(IngestedData {
        source: source.to_string(),
        columns,
        series,
        stats,
        row_errors,
        lines_skipped,
    })
}

fn parse_row(fields: &[&str], columns: ColumnSpec, needed: usize) -> Result<(f64, f64), String> {
    if fields.len() < needed {
        return Err(format!("expected at least {needed} columns, found {}", fields.len()));
    }
    let t = parse_f64(fields[columns.time_column], "time")?;
    let v = parse_f64(fields[columns.value_column], "value")?;
    if v < 0.0 {
        return Err(format!("missing value sentinel {v}"));
    }
    Ok((t, v))
}

fn parse_f64(s: &str, what: &str) -> Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|_| format!("{what} column is not numeric: '{s}'"))?;
    if !v.is_finite() {
        return Err(format!("{what} column is not finite: '{s}'"));
    }
    Ok(v)
}

pub fn compute_stats(series: &Series) -> DatasetStats {
    let values = series.values();
    DatasetStats {
        n_points: series.len(),
        time_min: series.first_time(),
        time_max: series.last_time(),
        value_min: values.iter().copied().fold(f64::INFINITY, f64::min),
        value_max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        sampling_interval: series.sampling_interval(),
        regular: series.is_regular(SPACING_REL_TOL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# --------------------------------------------------------------
# Monthly mean CO2 mole fraction
#
#            decimal       monthly    de-season  #days  st.dev
#             date         average     alized          of days
year month  date    average  interp  trend  days
1958   3   1958.2027      315.70      314.43     -1   -9.99   -0.99
1958   4   1958.2877      317.45      315.16     -1   -9.99   -0.99
1958   5   1958.3699      317.51      314.71     -1   -9.99   -0.99
1958   6   1958.4548      -99.99      315.14     -1   -9.99   -0.99
1958   7   1958.5370      315.86      315.18     -1   -9.99   -0.99
1958   8   1958.6219      314.93      316.18     -1   -9.99   -0.99
";

    #[test]
    fn parses_noaa_layout_and_skips_headers() {
        let data = ingest_str(SAMPLE, "sample", ColumnSpec::default()).unwrap();
        assert_eq!(data.series.len(), 5);
        assert!((data.series.first_time() - 1958.2027).abs() < 1e-12);
        assert!((data.series.values()[0] - 315.70).abs() < 1e-12);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 10);
        assert!(data.row_errors[0].message.contains("sentinel"));
        // Gap left by the missing month.
        assert!(!data.stats.regular);
    }

    #[test]
    fn custom_columns() {
        let text = "1 10.0\n2 11.0\n3 12.5\n";
        let cols = ColumnSpec {
            time_column: 0,
            value_column: 1,
        };
        let data = ingest_str(text, "inline", cols).unwrap();
        assert_eq!(data.series.values(), &[10.0, 11.0, 12.5]);
        assert!(data.stats.regular);
        assert_eq!(data.stats.sampling_interval, Some(1.0));
    }

    #[test]
    fn short_rows_are_row_errors() {
        let text = "1958 3 1958.2 315.7\n1958 4\n1958 5 1958.4 317.5\n";
        let data = ingest_str(text, "inline", ColumnSpec::default()).unwrap();
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 2);
    }

    #[test]
    fn decreasing_times_fail() {
        let text = "0 0 2.0 1.0\n0 0 1.0 1.0\n";
        let err = ingest_str(text, "inline", ColumnSpec::default()).unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }

    #[test]
    fn empty_input_fails() {
        let err = ingest_str("# only comments\n\n", "inline", ColumnSpec::default()).unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }
}
