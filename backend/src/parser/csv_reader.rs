//! Delimited-text reader.
//!
//! Produces a [`RawTable`] without assuming a fixed row width: short rows stay
//! short and are padded later by the normalizer. Every field is trimmed.
//! Blank lines are kept as empty rows so row indexes match the file's lines.

use tracing::debug;

use super::encoding::{
    decode_content, delimiter_candidates, detect_encoding, DEFAULT_DELIMITER,
};
use super::header::find_header_row;
use crate::error::ParseResult;
use crate::models::{RawCell, RawTable};

/// Decode, detect the delimiter and read all records.
///
/// When the best-ranked delimiter yields no header row, the remaining
/// candidates are tried in order and the first one that does is used.
pub fn read_csv(bytes: &[u8]) -> ParseResult<RawTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let candidates = delimiter_candidates(&content);
    let primary = candidates.first().copied().unwrap_or(DEFAULT_DELIMITER);

    debug!(
        encoding = %encoding,
        delimiter = %(primary as char).escape_default(),
        "decoded delimited text"
    );

    let table = read_csv_str(&content, primary)?;
    if find_header_row(&table).is_some() {
        return Ok(table);
    }

    for &delimiter in candidates.iter().skip(1) {
        if let Ok(alternative) = read_csv_str(&content, delimiter) {
            if find_header_row(&alternative).is_some() {
                debug!(
                    delimiter = %(delimiter as char).escape_default(),
                    "header found with alternative delimiter"
                );
                return Ok(alternative);
            }
        }
    }
    Ok(table)
}

/// Read already-decoded text with an explicit delimiter.
pub fn read_csv_str(content: &str, delimiter: u8) -> ParseResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let bytes = content.as_bytes();
    let mut table = RawTable::new();
    let mut record = csv::StringRecord::new();
    loop {
        let start = reader.position().byte() as usize;
        if !reader.read_record(&mut record)? {
            break;
        }
        let end = reader.position().byte() as usize;

        for _ in 0..blank_lines_before(bytes, start, end) {
            table.push(Vec::new());
        }
        table.push(record.iter().map(RawCell::from).collect());
    }
    Ok(table)
}

/// Blank lines the reader skipped between the previous record and the one
/// read from `bytes[start..end]`.
fn blank_lines_before(bytes: &[u8], start: usize, end: usize) -> usize {
    let mut span = bytes.get(start..end).unwrap_or_default();
    // A CRLF terminator leaves its LF to the next read.
    if start > 0 && bytes.get(start - 1) == Some(&b'\r') && span.first() == Some(&b'\n') {
        span = &span[1..];
    }
    span.iter()
        .take_while(|&&b| b == b'\r' || b == b'\n')
        .filter(|&&b| b == b'\n')
        .count()
}
