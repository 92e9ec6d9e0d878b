// src/extract/mod.rs

use thiserror::Error;
use tracing::warn;

/// Number of trailing characters of the metadata cell that form the teacher code.
pub const TEACHER_CODE_LEN: usize = 5;
/// Sentinel used when the metadata cell carries no teacher text at all.
pub const UNKNOWN_TEACHER: &str = "UNKNOWN";

/// Minimum grid height: metadata row, header row, one data row, two footer rows
/// would need 5, but the boundary is checked in two steps so a 4-row sheet is
/// rejected by the empty-slice check rather than here.
const MIN_ROWS: usize = 4;
const FOOTER_ROWS: usize = 2;

/// Why one worksheet was rejected. Sheet-scoped only; callers convert these
/// into report records and keep going.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("sheet has no cells")]
    EmptySheet,
    #[error("sheet has {rows} rows; not enough for metadata, header, data and footer")]
    InsufficientData { rows: usize },
    #[error("teacher cell {cell:?} is missing or shorter than {TEACHER_CODE_LEN} characters")]
    InvalidTeacherCode { cell: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Reject a sheet outright when its teacher cell is missing or too short,
    /// instead of tagging rows with a sentinel and carrying on.
    pub strict_teacher: bool,
}

/// The cleaned, tagged data extracted from one worksheet.
///
/// Every row has exactly `columns.len()` cells; the metadata row, header row
/// and the two footer rows are gone. `teacher` and `set` apply to every row.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub set: String,
    pub teacher: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Fragment {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A successful extraction, possibly carrying a soft teacher-code warning.
#[derive(Debug)]
pub struct Extraction {
    pub fragment: Fragment,
    pub teacher_warning: Option<String>,
}

/// Derive the teacher code from the raw metadata cell text.
///
/// Empty text yields the `UNKNOWN` sentinel; text shorter than the code
/// length is used as-is; otherwise the last [`TEACHER_CODE_LEN`] characters
/// are taken, on character boundaries. The second element is a warning
/// message for the two degraded cases.
pub fn teacher_code(cell: &str) -> (String, Option<String>) {
    if cell.is_empty() {
        return (
            UNKNOWN_TEACHER.to_string(),
            Some("no teacher data in first cell".to_string()),
        );
    }
    let mut tail = cell.char_indices().rev();
    match tail.nth(TEACHER_CODE_LEN - 1) {
        Some((start, _)) => (cell[start..].to_string(), None),
        None => (
            cell.to_string(),
            Some(format!("teacher text too short: {cell:?}")),
        ),
    }
}

/// Validate one worksheet grid and extract its tagged data rows.
///
/// The grid follows the fixed export convention: row 1 holds the teacher
/// metadata cell, row 2 the column headers, the last two rows are footer,
/// everything in between is data. Checks run in order and the first hard
/// failure wins. The grid itself is never modified.
pub fn extract_sheet(
    sheet_name: &str,
    grid: &[Vec<String>],
    options: ExtractOptions,
) -> Result<Extraction, SheetError> {
    if grid.is_empty() || grid.iter().all(|row| row.is_empty()) {
        return Err(SheetError::EmptySheet);
    }
    if grid.len() < MIN_ROWS {
        return Err(SheetError::InsufficientData { rows: grid.len() });
    }

    let teacher_cell = grid[0].first().map(String::as_str).unwrap_or_default();
    let (teacher, teacher_warning) = teacher_code(teacher_cell);
    if let Some(msg) = &teacher_warning {
        if options.strict_teacher {
            return Err(SheetError::InvalidTeacherCode {
                cell: teacher_cell.to_string(),
            });
        }
        warn!(sheet = sheet_name, "{msg}");
    }

    let columns: Vec<String> = grid[1]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if name.trim().is_empty() {
                format!("column_{}", i + 1)
            } else {
                name.clone()
            }
        })
        .collect();

    let data = &grid[2..grid.len() - FOOTER_ROWS];
    if data.is_empty() {
        return Err(SheetError::InsufficientData { rows: grid.len() });
    }

    let width = columns.len();
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().take(width).cloned().collect();
            cells.resize(width, String::new());
            cells
        })
        .collect();

    Ok(Extraction {
        fragment: Fragment {
            set: sheet_name.to_string(),
            teacher,
            columns,
            rows,
        },
        teacher_warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    /// Metadata row, header row, `data` rows, two footer rows.
    fn sheet_with_data(data: &[&[&str]]) -> Vec<Vec<String>> {
        let mut g = grid(&[
            &["CLASS-MSMITH", "", ""],
            &["Name", "Score", "Grade"],
        ]);
        g.extend(grid(data));
        g.extend(grid(&[&["Total", "", ""], &["Generated by ISAMS", "", ""]]));
        g
    }

    #[test]
    fn empty_grid_is_rejected() {
        let err = extract_sheet("7A", &[], ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::EmptySheet));

        let blank = grid(&[&[], &[], &[]]);
        let err = extract_sheet("7A", &blank, ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::EmptySheet));
    }

    #[test]
    fn undersized_grid_is_rejected() {
        for n in 1..4 {
            let g: Vec<Vec<String>> = (0..n).map(|_| vec!["x".to_string()]).collect();
            let err = extract_sheet("7A", &g, ExtractOptions::default()).unwrap_err();
            assert!(matches!(err, SheetError::InsufficientData { rows } if rows == n));
        }
    }

    #[test]
    fn minimum_boundary_has_no_data_rows() {
        // 4 rows: metadata, header, then the two footer rows leave nothing.
        let g = grid(&[
            &["CLASS-MSMITH"],
            &["Name", "Score"],
            &["Total"],
            &["Generated"],
        ]);
        let err = extract_sheet("7A", &g, ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::InsufficientData { rows: 4 }));
    }

    #[test]
    fn data_rows_exclude_metadata_header_and_footer() {
        let g = sheet_with_data(&[
            &["Alice", "91", "A"],
            &["Bob", "74", "B"],
            &["Cara", "66", "C"],
        ]);
        assert_eq!(g.len(), 7);
        let ex = extract_sheet("7A-Ma", &g, ExtractOptions::default()).unwrap();
        // N rows in, N - 4 data rows out.
        assert_eq!(ex.fragment.row_count(), 3);
        assert_eq!(ex.fragment.columns, vec!["Name", "Score", "Grade"]);
        assert_eq!(ex.fragment.rows[0], vec!["Alice", "91", "A"]);
        assert_eq!(ex.fragment.rows[2], vec!["Cara", "66", "C"]);
        assert_eq!(ex.fragment.set, "7A-Ma");
        assert_eq!(ex.fragment.teacher, "SMITH");
        assert!(ex.teacher_warning.is_none());
    }

    #[test]
    fn teacher_code_takes_last_five_characters() {
        assert_eq!(teacher_code("CLASS-MSMITH").0, "SMITH");
        assert_eq!(teacher_code("ABCDE").0, "ABCDE");
    }

    #[test]
    fn teacher_code_short_text_is_kept_with_warning() {
        let (code, warning) = teacher_code("AB");
        assert_eq!(code, "AB");
        assert!(warning.is_some());
    }

    #[test]
    fn teacher_code_empty_cell_is_unknown() {
        let (code, warning) = teacher_code("");
        assert_eq!(code, UNKNOWN_TEACHER);
        assert!(warning.is_some());
    }

    #[test]
    fn teacher_code_slices_on_character_boundaries() {
        let (code, warning) = teacher_code("KLASSE-MÜLLER");
        assert_eq!(code, "ÜLLER");
        assert!(warning.is_none());

        let (code, warning) = teacher_code("ÅÄÖ");
        assert_eq!(code, "ÅÄÖ");
        assert!(warning.is_some());
    }

    #[test]
    fn strict_mode_rejects_bad_teacher_cell() {
        let mut g = sheet_with_data(&[&["Alice", "91", "A"]]);
        g[0][0] = "AB".to_string();
        let opts = ExtractOptions {
            strict_teacher: true,
        };
        let err = extract_sheet("7A", &g, opts).unwrap_err();
        assert!(matches!(err, SheetError::InvalidTeacherCode { .. }));

        // Same sheet passes in the default soft mode.
        let ex = extract_sheet("7A", &g, ExtractOptions::default()).unwrap();
        assert_eq!(ex.fragment.teacher, "AB");
        assert!(ex.teacher_warning.is_some());
    }

    #[test]
    fn blank_header_names_get_positional_placeholders() {
        let g = grid(&[
            &["CLASS-MSMITH", "", ""],
            &["Name", "", "  "],
            &["Alice", "91", "A"],
            &["Total", "", ""],
            &["Generated", "", ""],
        ]);
        let ex = extract_sheet("7A", &g, ExtractOptions::default()).unwrap();
        assert_eq!(ex.fragment.columns, vec!["Name", "column_2", "column_3"]);
    }

    #[test]
    fn ragged_rows_are_padded_to_header_width() {
        let g = grid(&[
            &["CLASS-MSMITH"],
            &["Name", "Score", "Grade"],
            &["Alice", "91"],
            &["Bob", "74", "B", "extra"],
            &["Total"],
            &["Generated"],
        ]);
        let ex = extract_sheet("7A", &g, ExtractOptions::default()).unwrap();
        assert_eq!(ex.fragment.rows[0], vec!["Alice", "91", ""]);
        assert_eq!(ex.fragment.rows[1], vec!["Bob", "74", "B"]);
    }
}
