//! Workbook reader (xlsx, xlsm, xlsb, xls, ods).
//!
//! Only the first sheet in workbook definition order is read. The grid is
//! re-anchored at A1 so blank leading rows and columns survive as empty
//! cells, keeping column positions stable for header detection.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::debug;

use crate::error::{ParseError, ParseResult};
use crate::models::{RawCell, RawTable};

/// Read the first worksheet of a workbook held in memory.
pub fn read_spreadsheet(bytes: &[u8]) -> ParseResult<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook.sheet_names().first().cloned();
    let range = workbook.worksheet_range_at(0).ok_or(ParseError::NoSheets)??;

    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    debug!(
        sheet = sheet_name.as_deref().unwrap_or(""),
        rows = range.height(),
        columns = range.width(),
        "reading first worksheet"
    );

    let mut table: RawTable = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![RawCell::Empty; col_offset];
        cells.extend(row.iter().map(raw_cell));
        table.push(cells);
    }
    Ok(table)
}

/// Map a workbook cell to a raw cell.
///
/// Dates keep their serial number; booleans become `"true"` / `"false"`.
fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::from(s.as_str()),
        Data::Error(e) => RawCell::Text(e.to_string()),
        #[allow(unreachable_patterns)]
        other => RawCell::Text(other.to_string()),
    }
}
