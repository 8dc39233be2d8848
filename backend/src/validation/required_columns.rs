//! Every file must carry the `status`, `cost` and `price` columns.

use serde::Serialize;

use super::{Rule, ValidationResult, RULE_REQUIRED_COLUMNS};
use crate::models::{NormalizedRow, REQUIRED_COLUMNS};

#[derive(Serialize)]
struct ColumnDetails {
    required: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<&'static str>>,
    found: Vec<String>,
}

/// Reports required columns absent from the header list.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredColumns;

impl Rule for RequiredColumns {
    /// The header list captured at init.
    type State = Vec<String>;

    fn name(&self) -> &'static str {
        RULE_REQUIRED_COLUMNS
    }

    fn init(&self, headers: &[String]) -> Vec<String> {
        headers.to_vec()
    }

    fn process_row(&self, _: &mut Vec<String>, _: &NormalizedRow, _: usize, _: &[String]) {}

    fn finalize(&self, found: Vec<String>) -> ValidationResult {
        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !found.iter().any(|h| h == col))
            .collect();
        let passed = missing.is_empty();

        let details = ColumnDetails {
            required: REQUIRED_COLUMNS.to_vec(),
            missing: (!passed).then_some(missing),
            found,
        };
        ValidationResult::new(RULE_REQUIRED_COLUMNS, passed, serde_json::json!(details))
    }
}
