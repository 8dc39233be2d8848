//! Domain models shared by the parser, the rule engine and the store.
//!
//! - [`CellValue`] - a normalized cell: number or string, never null
//! - [`NormalizedRow`] - column name to cell value, one per data record
//! - [`RawTable`] - reader output before header detection
//! - [`ParsedFile`] - headers + normalized rows
//! - [`FileKind`] - which reader a file was routed to

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Column vocabulary
// =============================================================================

/// Columns every inventory file must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 3] = ["status", "cost", "price"];

/// Prefix used for header cells that were blank in the source.
pub const EMPTY_HEADER_PREFIX: &str = "_empty_";

/// Lower-case and trim a column name.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

// =============================================================================
// Cells
// =============================================================================

/// A raw cell as produced by one of the readers.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// Absent or blank cell.
    Empty,
    /// Textual cell (already trimmed for CSV).
    Text(String),
    /// Numeric spreadsheet cell.
    Number(f64),
}

impl RawCell {
    /// True when the cell carries no visible content.
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) => false,
        }
    }

    /// Text used when the cell acts as a header name.
    pub fn as_header(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) if s.trim().is_empty() => None,
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        RawCell::Number(n)
    }
}

/// Reader output: rows of cells, ragged rows allowed.
pub type RawTable = Vec<Vec<RawCell>>;

/// A normalized cell value. Blank cells become the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Numeric reading of the cell.
    ///
    /// Numbers pass through; text is trimmed and parsed. Blank or
    /// non-numeric text and non-finite values (NaN, infinities) yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
        };
        if n.is_finite() {
            Some(n)
        } else {
            None
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<RawCell> for CellValue {
    fn from(cell: RawCell) -> Self {
        match cell {
            RawCell::Empty => CellValue::Text(String::new()),
            RawCell::Text(s) => CellValue::Text(s),
            RawCell::Number(n) => CellValue::Number(n),
        }
    }
}

// =============================================================================
// Rows and files
// =============================================================================

/// Normalized column name to value.
pub type NormalizedRow = HashMap<String, CellValue>;

/// Result of parsing one uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    /// Normalized column names, in source order. Duplicates are kept.
    pub headers: Vec<String>,
    /// Data rows in source order.
    pub rows: Vec<NormalizedRow>,
}

impl ParsedFile {
    /// The canonical empty file.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

// =============================================================================
// File kind
// =============================================================================

/// Reader a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Spreadsheet,
}
