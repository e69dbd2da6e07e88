//! Data-file chooser for `trendfit fit` without `--file`/`--url`.
//!
//! Only files in the working directory that ingest cleanly with the selected
//! columns are offered, each shown with its sample count and time span.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::ColumnSpec;
use crate::error::AppError;
use crate::io::ingest::{DatasetStats, ingest_file};

const DATA_EXTENSIONS: [&str; 2] = ["txt", "dat"];

/// A file that parsed as a series.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub stats: DatasetStats,
}

/// List the parseable data files in the working directory and read a choice
/// from stdin.
pub fn prompt_for_data_path(columns: ColumnSpec) -> Result<PathBuf, AppError> {
    let candidates = candidate_files(Path::new("."), columns);
    if candidates.is_empty() {
        return Err(AppError::input(
            "No readable .txt/.dat series in this directory. Pass `--file`, `--url`, or run `trendfit fetch`.",
        ));
    }

    println!("{}", format_candidates(&candidates));
    print!("Choose 1-{} (q to quit): ", candidates.len());
    io::stdout()
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write prompt: {e}")))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::io(format!("Failed to read choice: {e}")))?;
    choose(&candidates, &line).map(|c| c.path.clone())
}

/// Data files directly under `dir` that ingest with `columns`, sorted by name.
pub fn candidate_files(dir: &Path, columns: ColumnSpec) -> Vec<Candidate> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut out: Vec<Candidate> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_data_extension(path))
        .filter_map(|path| match ingest_file(&path, columns) {
            Ok(data) => Some(Candidate { path, stats: data.stats }),
            Err(err) => {
                debug!(path = %path.display(), %err, "not offered");
                None
            }
        })
        .collect();
    out.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    out
}

fn format_candidates(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let name = c.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            format!(
                "{:>3}) {name}  n={} t=[{:.3}, {:.3}]",
                i + 1,
                c.stats.n_points,
                c.stats.time_min,
                c.stats.time_max
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve a typed answer to one of the candidates.
fn choose<'a>(candidates: &'a [Candidate], answer: &str) -> Result<&'a Candidate, AppError> {
    let answer = answer.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
        return Err(AppError::input("No data file chosen."));
    }
    answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| candidates.get(i))
        .ok_or_else(|| AppError::input(format!("'{answer}' is not one of 1-{}.", candidates.len())))
}

fn has_data_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DATA_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: &str = "# year month decimal value\n\
                        1958 3 1958.2027 315.70\n\
                        1958 4 1958.2877 317.45\n\
                        1958 5 1958.3699 317.51\n";

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trendfit-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn only_parseable_data_files_are_offered() {
        let dir = temp_dir("candidates");
        fs::write(dir.join("mlo.txt"), ROWS).unwrap();
        fs::write(dir.join("b.DAT"), ROWS).unwrap();
        fs::write(dir.join("notes.txt"), "just some prose\n").unwrap();
        fs::write(dir.join("model.json"), "{}").unwrap();

        let found = candidate_files(&dir, ColumnSpec::default());
        fs::remove_dir_all(&dir).unwrap();

        let names: Vec<String> = found
            .iter()
            .filter_map(|c| c.path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["b.DAT".to_string(), "mlo.txt".to_string()]);
        assert_eq!(found[1].stats.n_points, 3);
    }

    #[test]
    fn wrong_columns_exclude_the_file() {
        let dir = temp_dir("candidates-cols");
        fs::write(dir.join("mlo.txt"), ROWS).unwrap();
        let columns = ColumnSpec {
            time_column: 2,
            value_column: 7,
        };
        let found = candidate_files(&dir, columns);
        fs::remove_dir_all(&dir).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn answers_map_to_candidates() {
        let stats = DatasetStats {
            n_points: 3,
            time_min: 1958.2,
            time_max: 1958.4,
            value_min: 315.7,
            value_max: 317.5,
            sampling_interval: Some(0.083),
            regular: true,
        };
        let candidates = vec![
            Candidate {
                path: PathBuf::from("a.txt"),
                stats: stats.clone(),
            },
            Candidate {
                path: PathBuf::from("b.txt"),
                stats,
            },
        ];
        assert_eq!(choose(&candidates, "2\n").unwrap().path, PathBuf::from("b.txt"));
        assert!(choose(&candidates, "0").is_err());
        assert!(choose(&candidates, "3").is_err());
        assert!(choose(&candidates, "q").is_err());
        assert!(choose(&candidates, "").is_err());
        assert!(format_candidates(&candidates).starts_with("  1) a.txt  n=3 t=[1958.200, 1958.400]"));
    }
}
