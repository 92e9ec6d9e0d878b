// src/process/mod.rs

use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;
use tracing::{info, warn};

use crate::extract::{extract_sheet, ExtractOptions, Fragment, SheetError};
use crate::report::{ErrorKind, ProcessingError};

/// Everything one workbook produced: extracted fragments plus every problem
/// encountered along the way. Returned unconditionally; a bad sheet or an
/// unreadable file never aborts the caller's loop.
#[derive(Debug, Default)]
pub struct FileOutcome {
    pub fragments: Vec<Fragment>,
    pub errors: Vec<ProcessingError>,
    pub sheets_processed: usize,
    pub sheets_skipped: usize,
}

impl FileOutcome {
    /// A file counts as processed once at least one sheet yielded data.
    pub fn any_data(&self) -> bool {
        !self.fragments.is_empty()
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        // Integral floats are what Excel stores most counts and scores as;
        // render them without the trailing ".0".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn sheet_error_kind(err: &SheetError) -> ErrorKind {
    match err {
        SheetError::EmptySheet => ErrorKind::EmptySheet,
        SheetError::InsufficientData { .. } => ErrorKind::InsufficientData,
        SheetError::InvalidTeacherCode { .. } => ErrorKind::InvalidTeacherCode,
    }
}

/// Open one workbook and run the extractor over each of its worksheets, in
/// workbook order. The workbook handle is dropped before returning on every
/// path, so a problem file never affects its siblings.
#[tracing::instrument(level = "info", skip(path, options), fields(file = %path.as_ref().display()))]
pub fn process_file<P: AsRef<Path>>(path: P, options: ExtractOptions) -> FileOutcome {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut outcome = FileOutcome::default();

    let mut workbook: Xlsx<_> = match open_workbook(path) {
        Ok(wb) => wb,
        Err(e) => {
            warn!(file = %file_name, "failed to open workbook: {e}");
            outcome.errors.push(ProcessingError::file_level(
                file_name,
                ErrorKind::UnreadableFile,
                e.to_string(),
            ));
            return outcome;
        }
    };

    for sheet_name in workbook.sheet_names().to_owned() {
        let range = match workbook.worksheet_range(&sheet_name) {
            Ok(range) => range,
            Err(e) => {
                warn!(file = %file_name, sheet = %sheet_name, "failed to read sheet: {e}");
                outcome.errors.push(ProcessingError::sheet_level(
                    &file_name,
                    &sheet_name,
                    ErrorKind::UnreadableFile,
                    e.to_string(),
                ));
                outcome.sheets_skipped += 1;
                continue;
            }
        };

        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        match extract_sheet(&sheet_name, &grid, options) {
            Ok(extraction) => {
                if let Some(msg) = extraction.teacher_warning {
                    outcome.errors.push(ProcessingError::sheet_level(
                        &file_name,
                        &sheet_name,
                        ErrorKind::InvalidTeacherCode,
                        msg,
                    ));
                }
                info!(
                    file = %file_name,
                    sheet = %sheet_name,
                    rows = extraction.fragment.row_count(),
                    "extracted sheet"
                );
                outcome.fragments.push(extraction.fragment);
                outcome.sheets_processed += 1;
            }
            Err(e) => {
                warn!(file = %file_name, sheet = %sheet_name, "skipping sheet: {e}");
                outcome.errors.push(ProcessingError::sheet_level(
                    &file_name,
                    &sheet_name,
                    sheet_error_kind(&e),
                    e.to_string(),
                ));
                outcome.sheets_skipped += 1;
            }
        }
    }

    outcome
}
