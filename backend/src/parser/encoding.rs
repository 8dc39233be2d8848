//! Charset and delimiter detection for delimited text exports.

use std::collections::HashMap;

use crate::error::{ParseError, ParseResult};

/// UTF-8 byte-order mark.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Records inspected when guessing the delimiter.
const DELIMITER_SAMPLE_LINES: usize = 50;

/// True when `bytes` starts with a UTF-8 BOM.
pub fn has_bom(bytes: &[u8]) -> bool {
    bytes.starts_with(&UTF8_BOM)
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if has_bom(bytes) {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// A leading BOM is stripped and pins the content to strict UTF-8. Without a
/// BOM, undecodable UTF-8 falls back to a lossy conversion.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ParseResult<String> {
    if let Some(body) = bytes.strip_prefix(&UTF8_BOM) {
        return String::from_utf8(body.to_vec())
            .map_err(|e| ParseError::Encoding(format!("invalid UTF-8 after BOM: {}", e)));
    }

    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };
    Ok(decoded)
}

/// Delimiter used when no candidate occurs outside quotes.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Unquoted delimiter counts for each of the leading non-blank records.
///
/// Quotes are tracked across line breaks, so a newline inside a quoted field
/// does not end the record.
fn sample_counts(content: &str) -> Vec<[usize; DELIMITERS.len()]> {
    let mut records = Vec::new();
    let mut current = [0usize; DELIMITERS.len()];
    let mut in_quotes = false;
    let mut has_content = false;

    for byte in content.bytes() {
        match byte {
            b'"' => {
                in_quotes = !in_quotes;
                has_content = true;
            }
            b'\n' if !in_quotes => {
                if has_content {
                    records.push(current);
                    if records.len() == DELIMITER_SAMPLE_LINES {
                        return records;
                    }
                }
                current = [0; DELIMITERS.len()];
                has_content = false;
            }
            _ => {
                if !in_quotes {
                    if let Some(pos) = DELIMITERS.iter().position(|&d| d == byte) {
                        current[pos] += 1;
                    }
                }
                if !byte.is_ascii_whitespace() {
                    has_content = true;
                }
            }
        }
    }
    if has_content {
        records.push(current);
    }
    records
}

/// `(lines sharing the most common nonzero count, total count)`.
fn score(records: &[[usize; DELIMITERS.len()]], candidate: usize) -> (usize, usize) {
    let mut lines_per_count: HashMap<usize, usize> = HashMap::new();
    let mut total = 0;
    for record in records {
        let count = record[candidate];
        total += count;
        if count > 0 {
            *lines_per_count.entry(count).or_default() += 1;
        }
    }
    (lines_per_count.values().copied().max().unwrap_or(0), total)
}

/// Delimiters that occur outside quotes, best first.
///
/// A candidate ranks by how many of the leading records split into the same
/// number of fields, then by its total count. Title rows above the real
/// header carry no delimiter and do not count. Ties keep the `, ; TAB |`
/// order. Falls back to `[DEFAULT_DELIMITER]`.
pub fn delimiter_candidates(content: &str) -> Vec<u8> {
    let records = sample_counts(content);

    let mut scored: Vec<(u8, (usize, usize))> = DELIMITERS
        .iter()
        .enumerate()
        .map(|(i, &d)| (d, score(&records, i)))
        .filter(|(_, (lines, _))| *lines > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    if scored.is_empty() {
        return vec![DEFAULT_DELIMITER];
    }
    scored.into_iter().map(|(d, _)| d).collect()
}

/// The best-ranked delimiter from [`delimiter_candidates`].
pub fn detect_delimiter(content: &str) -> u8 {
    delimiter_candidates(content)
        .first()
        .copied()
        .unwrap_or(DEFAULT_DELIMITER)
}
