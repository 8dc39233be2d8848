//! Row normalization.
//!
//! Zips every row below the header positionally against the header cells,
//! drops fully blank rows, and lower-cases/trims the column names.

use crate::models::{
    normalize_key, CellValue, NormalizedRow, ParsedFile, RawCell, RawTable, EMPTY_HEADER_PREFIX,
};

/// A record before key normalization: raw header text to value, in header order.
type Record = Vec<(String, CellValue)>;

/// Header keys for the located header row.
///
/// Blank header cells get `_empty_<column index>`.
pub fn header_keys(header_row: &[RawCell]) -> Vec<String> {
    header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            cell.as_header()
                .unwrap_or_else(|| format!("{}{}", EMPTY_HEADER_PREFIX, i))
        })
        .collect()
}

/// Build [`ParsedFile`] from the table and the header row index.
///
/// Files whose data rows are all blank collapse to [`ParsedFile::empty`].
/// `headers` comes from the first surviving record so that it always agrees
/// with the row keys.
pub fn normalize_rows(table: &RawTable, header_index: usize) -> ParsedFile {
    let header_row = table.get(header_index).map(Vec::as_slice).unwrap_or(&[]);
    let keys = header_keys(header_row);

    let records: Vec<Record> = table
        .iter()
        .skip(header_index + 1)
        .map(|row| build_record(&keys, row))
        .filter(|record| record.iter().any(|(_, value)| !value.is_blank()))
        .collect();

    let Some(first) = records.first() else {
        return ParsedFile::empty();
    };

    let headers = first.iter().map(|(key, _)| normalize_key(key)).collect();
    let rows = records.into_iter().map(normalize_record).collect();

    ParsedFile { headers, rows }
}

/// Positional zip of header keys and cells. Missing cells become `""`;
/// cells past the last header are dropped. A repeated header keeps its
/// first position and takes the last value.
fn build_record(keys: &[String], row: &[RawCell]) -> Record {
    let mut record: Record = Vec::with_capacity(keys.len());

    for (i, key) in keys.iter().enumerate() {
        let value = row.get(i).cloned().map(CellValue::from).unwrap_or_default();
        match record.iter_mut().find(|(existing, _)| existing == key) {
            Some(slot) => slot.1 = value,
            None => record.push((key.clone(), value)),
        }
    }
    record
}

fn normalize_record(record: Record) -> NormalizedRow {
    record
        .into_iter()
        .map(|(key, value)| (normalize_key(&key), value))
        .collect()
}
