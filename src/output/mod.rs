// src/output/mod.rs

use rust_xlsxwriter::{Workbook, XlsxError};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::merge::Dataset;

/// Hard failure while writing the consolidated workbook. These halt the run.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("could not create output directory {dir}: {source}")]
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Save {
        path: PathBuf,
        source: XlsxError,
    },
}

impl WriteError {
    /// True when the target file appears to be locked, typically because it
    /// is open in Excel.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            WriteError::Save {
                source: XlsxError::IoError(e),
                ..
            } if e.kind() == IoErrorKind::PermissionDenied
        )
    }
}

/// Smallest unused `{base_name}_{n}.xlsx` in `dir`, counting up from 1.
/// Existing files are never reused, so earlier runs are never overwritten.
pub fn next_versioned_path(dir: &Path, base_name: &str) -> PathBuf {
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{base_name}_{n}.xlsx"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn build_workbook(dataset: &Dataset) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in dataset.columns.iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }
    for (r, row) in dataset.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string((r + 1) as u32, c as u16, cell)?;
            }
        }
    }
    Ok(workbook)
}

/// Write `dataset` as a single flat sheet under the next free versioned name.
/// Creates `output_dir` if needed; never touches existing files.
pub fn write_versioned(
    dataset: &Dataset,
    output_dir: &Path,
    base_name: &str,
) -> Result<PathBuf, WriteError> {
    fs::create_dir_all(output_dir).map_err(|source| WriteError::CreateDir {
        dir: output_dir.to_path_buf(),
        source,
    })?;

    let path = next_versioned_path(output_dir, base_name);
    let mut workbook = build_workbook(dataset).map_err(|source| WriteError::Save {
        path: path.clone(),
        source,
    })?;
    workbook.save(&path).map_err(|source| WriteError::Save {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), rows = dataset.rows.len(), "wrote consolidated workbook");
    Ok(path)
}
