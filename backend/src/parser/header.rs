//! Header row detection.
//!
//! Vendor exports often start with title, client and date-range banners. The
//! header row is the first row, within [`HEADER_SCAN_LIMIT`] rows, whose
//! normalized cells include every name in [`REQUIRED_COLUMNS`]. When no row
//! qualifies, row 0 is used and the required-columns rule reports what is
//! missing.

use std::collections::HashSet;

use crate::models::{normalize_key, RawCell, RawTable, REQUIRED_COLUMNS};

/// Number of leading rows searched for the header.
pub const HEADER_SCAN_LIMIT: usize = 50;

/// True if the row contains all required column names.
pub fn row_has_required_columns(row: &[RawCell]) -> bool {
    let cells: HashSet<String> = row
        .iter()
        .filter_map(RawCell::as_header)
        .map(|cell| normalize_key(&cell))
        .collect();
    REQUIRED_COLUMNS.iter().all(|col| cells.contains(*col))
}

/// Index of the first row within the scan window holding every required
/// column, if any.
pub fn find_header_row(table: &RawTable) -> Option<usize> {
    table
        .iter()
        .take(HEADER_SCAN_LIMIT)
        .position(|row| row_has_required_columns(row))
}

/// Index of the header row. First match wins; falls back to 0.
pub fn locate_header_row(table: &RawTable) -> usize {
    find_header_row(table).unwrap_or(0)
}
