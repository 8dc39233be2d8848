//! Inventory file parsing.
//!
//! Turns uploaded bytes into a [`ParsedFile`]:
//!
//! ```text
//! bytes + MIME ──▶ reader (CSV | workbook) ──▶ RawTable
//!                                                 │
//!              header locator (first row with status/cost/price)
//!                                                 │
//!                         row normalizer ──▶ ParsedFile { headers, rows }
//! ```
//!
//! Routing: `text/csv`, `application/csv`, or a UTF-8 BOM select the CSV
//! reader; everything else is read as a workbook.

pub mod csv_reader;
pub mod encoding;
pub mod header;
pub mod normalize;
pub mod spreadsheet;

use std::path::Path;
use tracing::debug;

use crate::error::ParseResult;
use crate::models::{FileKind, ParsedFile, RawTable};

pub use csv_reader::{read_csv, read_csv_str};
pub use encoding::{
    decode_content, delimiter_candidates, detect_delimiter, detect_encoding, has_bom,
    DEFAULT_DELIMITER, UTF8_BOM,
};
pub use header::{
    find_header_row, locate_header_row, row_has_required_columns, HEADER_SCAN_LIMIT,
};
pub use normalize::{header_keys, normalize_rows};
pub use spreadsheet::read_spreadsheet;

/// MIME types routed to the CSV reader.
pub const CSV_MIME_TYPES: [&str; 2] = ["text/csv", "application/csv"];

/// MIME type of an Office Open XML workbook.
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// True for a CSV MIME type. Parameters such as `; charset=utf-8` are ignored.
pub fn is_csv_mime(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    CSV_MIME_TYPES
        .iter()
        .any(|csv| essence.eq_ignore_ascii_case(csv))
}

/// Decide which reader handles the upload.
pub fn detect_kind(bytes: &[u8], mime_type: &str) -> FileKind {
    if is_csv_mime(mime_type) || has_bom(bytes) {
        FileKind::Csv
    } else {
        FileKind::Spreadsheet
    }
}

/// Read the raw cell grid with the reader chosen by [`detect_kind`].
pub fn read_table(bytes: &[u8], mime_type: &str) -> ParseResult<RawTable> {
    match detect_kind(bytes, mime_type) {
        FileKind::Csv => read_csv(bytes),
        FileKind::Spreadsheet => read_spreadsheet(bytes),
    }
}

/// Locate the header and normalize the rows of an already-read table.
pub fn table_to_parsed(table: RawTable) -> ParsedFile {
    if table.is_empty() {
        return ParsedFile::empty();
    }

    let header_index = locate_header_row(&table);
    let parsed = normalize_rows(&table, header_index);

    debug!(
        header_row = header_index,
        raw_rows = table.len(),
        data_rows = parsed.rows.len(),
        "normalized table"
    );
    parsed
}

/// Parse uploaded bytes.
///
/// # Example
/// ```
/// use stockcheck::parser::parse_file;
///
/// let csv = b"Inventory Report\n\nstatus,cost,price\nMISSING,5,10\n";
/// let parsed = parse_file(csv, "text/csv").unwrap();
///
/// assert_eq!(parsed.headers, vec!["status", "cost", "price"]);
/// assert_eq!(parsed.rows.len(), 1);
/// ```
pub fn parse_file(bytes: &[u8], mime_type: &str) -> ParseResult<ParsedFile> {
    let table = read_table(bytes, mime_type)?;
    Ok(table_to_parsed(table))
}

/// MIME type implied by a file name's extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => CSV_MIME_TYPES[0],
        _ => XLSX_MIME_TYPE,
    }
}

/// Read and parse a file from disk, inferring the MIME type from its extension.
pub fn parse_file_path<P: AsRef<Path>>(path: P) -> ParseResult<ParsedFile> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    parse_file(&bytes, mime_for_path(path))
}
