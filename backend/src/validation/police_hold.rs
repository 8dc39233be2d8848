//! Rows held by police must not be reported as sellable inventory.

use once_cell::sync::Lazy;
use regex::Regex;

use super::status::StatusScan;
use super::{Rule, ValidationResult, RULE_POLICE_HOLD};
use crate::models::NormalizedRow;

/// Accepted spellings, compared after trim + upper-case.
pub const POLICE_HOLD_STATUSES: [&str; 2] = ["POLICE_HOLD", "POLICE INVENTORY HOLD"];

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// `status` must already be trimmed and upper-cased.
///
/// Besides the exact spellings, any whitespace variant of `POLICE HOLD`
/// matches once whitespace runs are collapsed to `_`.
pub fn is_police_hold_status(status: &str) -> bool {
    POLICE_HOLD_STATUSES.contains(&status)
        || WHITESPACE_RUN.replace_all(status, "_") == "POLICE_HOLD"
}

/// Flags rows whose status is a police hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoliceHold;

impl Rule for PoliceHold {
    type State = StatusScan;

    fn name(&self) -> &'static str {
        RULE_POLICE_HOLD
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
        state.scan(row, row_index, is_police_hold_status);
    }

    fn finalize(&self, state: StatusScan) -> ValidationResult {
        state.finish(RULE_POLICE_HOLD)
    }
}
