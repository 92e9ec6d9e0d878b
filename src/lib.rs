//! Merge multi-sheet ISAMS-style spreadsheet exports into one consolidated
//! workbook, tagging every row with the worksheet it came from (`Set`) and the
//! teacher code parsed from the sheet's metadata row (`Teacher`).
//!
//! The pipeline is strictly sequential: [`merge::run`] discovers `.xlsx`
//! files, [`process::process_file`] opens each workbook, and
//! [`extract::extract_sheet`] validates and slices each worksheet grid. The
//! merged table is written under a versioned filename by
//! [`output::write_versioned`], so reruns never overwrite earlier output.

pub mod extract;
pub mod merge;
pub mod output;
pub mod process;
pub mod report;
