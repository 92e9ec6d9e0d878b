// src/report/mod.rs

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Category for a per-file or per-sheet problem. None of these abort the run;
/// they are accumulated and surfaced in the final summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Workbook could not be opened (corrupt, locked, not an xlsx).
    UnreadableFile,
    /// Worksheet contained no cells at all.
    EmptySheet,
    /// Worksheet too short to hold metadata, header, data and footer rows.
    InsufficientData,
    /// Teacher cell missing or shorter than the expected code length.
    InvalidTeacherCode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::UnreadableFile => "unreadable file",
            ErrorKind::EmptySheet => "empty sheet",
            ErrorKind::InsufficientData => "insufficient data",
            ErrorKind::InvalidTeacherCode => "invalid teacher code",
        };
        f.write_str(s)
    }
}

/// One recorded problem, attributed to its source file (and sheet, when the
/// problem is sheet-scoped).
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingError {
    pub file: String,
    pub sheet: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl ProcessingError {
    pub fn file_level(file: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            sheet: None,
            kind,
            message: message.into(),
        }
    }

    pub fn sheet_level(
        file: impl Into<String>,
        sheet: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            sheet: Some(sheet.into()),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{} [{} / {}]: {}", self.kind, self.file, sheet, self.message),
            None => write!(f, "{} [{}]: {}", self.kind, self.file, self.message),
        }
    }
}

/// Counters accumulated across one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingStats {
    pub files_found: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub sheets_processed: usize,
    pub sheets_skipped: usize,
    pub rows_merged: usize,
}

/// Everything externally observable about one run: counters, the full ordered
/// error list, and the output path when one was written.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub stats: ProcessingStats,
    pub errors: Vec<ProcessingError>,
    pub output_path: Option<PathBuf>,
}

impl RunSummary {
    /// Soft problems only, i.e. sheets that still contributed data.
    pub fn warning_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.kind == ErrorKind::InvalidTeacherCode)
            .count()
    }
}
