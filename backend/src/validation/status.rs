//! Shared state for rules that flag rows by their `status` cell.

use serde::{Deserialize, Serialize};

use super::{find_column, reported_row, ValidationResult};
use crate::models::NormalizedRow;

const STATUS_COLUMN: &str = "status";
const NO_STATUS_MESSAGE: &str = "No status column - skipping check";

/// A row whose status matched the rule's vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusViolation {
    pub row: usize,
    /// Status as written in the file.
    pub status: String,
}

#[derive(Serialize)]
struct StatusDetails {
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<StatusViolation>>,
}

#[derive(Debug)]
pub struct StatusScan {
    column: Option<String>,
    violations: Vec<StatusViolation>,
}

impl StatusScan {
    pub fn new(headers: &[String]) -> Self {
        Self {
            column: find_column(headers, STATUS_COLUMN),
            violations: Vec::new(),
        }
    }

    /// Record the row if `matches` accepts its trimmed, upper-cased status.
    pub fn scan(&mut self, row: &NormalizedRow, row_index: usize, matches: fn(&str) -> bool) {
        let Some(column) = &self.column else {
            return;
        };
        let original = row.get(column).map(ToString::to_string).unwrap_or_default();
        let status = original.trim().to_uppercase();

        if matches(&status) {
            self.violations.push(StatusViolation {
                row: reported_row(row_index),
                status: original,
            });
        }
    }

    pub fn finish(self, rule: &str) -> ValidationResult {
        if self.column.is_none() {
            return ValidationResult::skipped(rule, NO_STATUS_MESSAGE);
        }

        let count = self.violations.len();
        let details = StatusDetails {
            count,
            items: (count > 0).then_some(self.violations),
        };
        ValidationResult::new(rule, count == 0, serde_json::json!(details))
    }
}
