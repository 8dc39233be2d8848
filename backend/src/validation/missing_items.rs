//! Items reported missing fail the upload.

use super::status::StatusScan;
use super::{Rule, ValidationResult, RULE_MISSING_ITEMS};
use crate::models::NormalizedRow;

/// Accepted spellings, compared after trim + upper-case. Exact match only.
pub const MISSING_STATUSES: [&str; 2] = ["MISSING", "MISSING INV"];

/// `status` must already be trimmed and upper-cased.
pub fn is_missing_status(status: &str) -> bool {
    MISSING_STATUSES.contains(&status)
}

/// Flags rows whose status marks the item as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingItems;

impl Rule for MissingItems {
    type State = StatusScan;

    fn name(&self) -> &'static str {
        RULE_MISSING_ITEMS
    }

    fn init(&self, headers: &[String]) -> StatusScan {
        StatusScan::new(headers)
    }

    fn process_row(
        &self,
        state: &mut StatusScan,
        row: &NormalizedRow,
        row_index: usize,
        _: &[String],
    ) {
        state.scan(row, row_index, is_missing_status);
    }

    fn finalize(&self, state: StatusScan) -> ValidationResult {
        state.finish(RULE_MISSING_ITEMS)
    }
}
