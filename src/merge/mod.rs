// src/merge/mod.rs

use glob::glob;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::extract::{ExtractOptions, Fragment};
use crate::output::{write_versioned, WriteError};
use crate::process::process_file;
use crate::report::{ProcessingStats, RunSummary};

pub const TEACHER_COLUMN: &str = "Teacher";
pub const SET_COLUMN: &str = "Set";

/// Explicit run configuration. Defaults match the conventional export layout
/// (an `uploads` directory next to the working directory, output beside it);
/// every path can be overridden, nothing is read from ambient state.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub base_name: String,
    pub strict_teacher: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("output"),
            base_name: "merged_sets".to_string(),
            strict_teacher: false,
        }
    }
}

/// Hard, run-fatal failures. Per-file and per-sheet problems never surface
/// here; they are collected into the run summary instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("input directory {0} does not exist or is not a directory")]
    Directory(PathBuf),
    #[error("no .xlsx files found in {0}")]
    NoInput(PathBuf),
    #[error("no worksheet produced any usable data")]
    NoValidData { summary: RunSummary },
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// The consolidated flat table: the union of all fragment columns in
/// first-seen order, with `Teacher` and `Set` appended last.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A successful run: where the output landed, plus the full summary.
#[derive(Debug)]
pub struct RunOutput {
    pub path: PathBuf,
    pub summary: RunSummary,
}

/// Candidate workbooks in `input_dir`, lexicographic by name so reruns visit
/// files in the same order.
fn discover_files(input_dir: &Path) -> Result<Vec<PathBuf>, RunError> {
    if !input_dir.is_dir() {
        return Err(RunError::Directory(input_dir.to_path_buf()));
    }
    let pattern = format!("{}/*.xlsx", input_dir.display());
    let mut files: Vec<PathBuf> = glob(&pattern)
        .map_err(|_| RunError::Directory(input_dir.to_path_buf()))?
        .filter_map(Result::ok)
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(RunError::NoInput(input_dir.to_path_buf()));
    }
    Ok(files)
}

/// Concatenate fragments into one table, outer-joining on column names:
/// a row whose source fragment lacks some column gets an empty cell there.
pub fn concat(fragments: &[Fragment]) -> Dataset {
    let mut data_columns: Vec<String> = Vec::new();
    for fragment in fragments {
        for column in &fragment.columns {
            if !data_columns.contains(column) {
                data_columns.push(column.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(fragments.iter().map(|f| f.rows.len()).sum());
    for fragment in fragments {
        // Position of each output column within this fragment, if present.
        let positions: Vec<Option<usize>> = data_columns
            .iter()
            .map(|c| fragment.columns.iter().position(|fc| fc == c))
            .collect();
        for row in &fragment.rows {
            let mut out: Vec<String> = positions
                .iter()
                .map(|p| p.map(|i| row[i].clone()).unwrap_or_default())
                .collect();
            out.push(fragment.teacher.clone());
            out.push(fragment.set.clone());
            rows.push(out);
        }
    }

    let mut columns = data_columns;
    columns.push(TEACHER_COLUMN.to_string());
    columns.push(SET_COLUMN.to_string());
    Dataset { columns, rows }
}

/// Run the whole pipeline: discover workbooks, extract every worksheet,
/// concatenate, and write one versioned output file.
///
/// One unreadable file or rejected sheet only shows up in the summary; the
/// run fails only when there is nothing to process or nothing to write.
#[tracing::instrument(level = "info", skip(config), fields(input = %config.input_dir.display()))]
pub fn run(config: &RunConfig) -> Result<RunOutput, RunError> {
    let files = discover_files(&config.input_dir)?;
    info!(count = files.len(), "found candidate workbooks");

    let options = ExtractOptions {
        strict_teacher: config.strict_teacher,
    };
    let mut stats = ProcessingStats {
        files_found: files.len(),
        ..Default::default()
    };
    let mut fragments: Vec<Fragment> = Vec::new();
    let mut errors = Vec::new();

    for path in &files {
        let outcome = process_file(path, options);
        if outcome.any_data() {
            stats.files_processed += 1;
        } else {
            stats.files_failed += 1;
        }
        stats.sheets_processed += outcome.sheets_processed;
        stats.sheets_skipped += outcome.sheets_skipped;
        fragments.extend(outcome.fragments);
        errors.extend(outcome.errors);
    }

    if fragments.is_empty() {
        return Err(RunError::NoValidData {
            summary: RunSummary {
                stats,
                errors,
                output_path: None,
            },
        });
    }

    let dataset = concat(&fragments);
    stats.rows_merged = dataset.rows.len();
    info!(
        rows = stats.rows_merged,
        columns = dataset.columns.len(),
        "merged {} fragments",
        fragments.len()
    );

    let path = write_versioned(&dataset, &config.output_dir, &config.base_name)?;

    Ok(RunOutput {
        summary: RunSummary {
            stats,
            errors,
            output_path: Some(path.clone()),
        },
        path,
    })
}
