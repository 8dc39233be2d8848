//! Business-rule validation of parsed inventory files.
//!
//! Each rule is a small state machine:
//!
//! - `init(headers)` inspects the header list once and builds the rule state
//! - `process_row(state, row, row_index, headers)` runs once per data row
//! - `finalize(state)` collapses the state into a [`ValidationResult`]
//!
//! [`RuleSet::run`] starts every rule, then walks the rows once, feeding each
//! row to every rule before moving on, and finalizes in registration order.
//! State lives only for the duration of one run.
//!
//! # Example
//!
//! ```
//! use stockcheck::parser::parse_file;
//! use stockcheck::validation::{run_validations, overall_pass};
//!
//! let parsed = parse_file(b"status,cost,price\nMISSING,10,5\n", "text/csv").unwrap();
//! let results = run_validations(&parsed);
//!
//! assert_eq!(results.len(), 4);
//! assert_eq!(results[2].rule, "missing_items");
//! assert!(!results[2].passed);
//! assert!(!overall_pass(&results));
//! ```

pub mod cost_vs_price;
pub mod missing_items;
pub mod police_hold;
pub mod required_columns;
mod status;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{NormalizedRow, ParsedFile};

pub use cost_vs_price::{CostVsPrice, PriceViolation, MAX_REPORTED_ITEMS};
pub use missing_items::{is_missing_status, MissingItems, MISSING_STATUSES};
pub use police_hold::{is_police_hold_status, PoliceHold, POLICE_HOLD_STATUSES};
pub use required_columns::RequiredColumns;
pub use status::StatusViolation;

// =============================================================================
// Results
// =============================================================================

pub const RULE_REQUIRED_COLUMNS: &str = "required_columns";
pub const RULE_POLICE_HOLD: &str = "police_hold";
pub const RULE_MISSING_ITEMS: &str = "missing_items";
pub const RULE_COST_VS_PRICE: &str = "cost_vs_price";

/// Offset between a 0-based data row index and the row number shown to users:
/// one for 1-based numbering, one for the header row.
pub const ROW_NUMBER_OFFSET: usize = 2;

/// Row number reported for the data row at `row_index`.
pub fn reported_row(row_index: usize) -> usize {
    row_index + ROW_NUMBER_OFFSET
}

/// Outcome of one rule over one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Rule identifier, e.g. `police_hold`.
    pub rule: String,
    pub passed: bool,
    /// Rule-specific payload.
    pub details: Value,
}

impl ValidationResult {
    pub fn new(rule: &str, passed: bool, details: Value) -> Self {
        Self {
            rule: rule.to_string(),
            passed,
            details,
        }
    }

    /// Passing result for a rule whose columns are absent.
    pub fn skipped(rule: &str, message: &str) -> Self {
        Self::new(rule, true, serde_json::json!({ "message": message }))
    }

    /// `details.count`, for rules that count violations.
    pub fn count(&self) -> Option<u64> {
        self.details.get("count").and_then(Value::as_u64)
    }

    /// `details.items`, empty when absent.
    pub fn items(&self) -> &[Value] {
        self.details
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// True when every rule passed.
pub fn overall_pass(results: &[ValidationResult]) -> bool {
    results.iter().all(|r| r.passed)
}

// =============================================================================
// Rule protocol
// =============================================================================

/// A validation rule.
pub trait Rule {
    /// Per-run accumulation state.
    type State;

    /// Identifier reported in [`ValidationResult::rule`].
    fn name(&self) -> &'static str;

    fn init(&self, headers: &[String]) -> Self::State;

    fn process_row(
        &self,
        state: &mut Self::State,
        row: &NormalizedRow,
        row_index: usize,
        headers: &[String],
    );

    fn finalize(&self, state: Self::State) -> ValidationResult;
}

/// A rule that has been initialized for one run.
pub trait RuleRun {
    fn process_row(&mut self, row: &NormalizedRow, row_index: usize, headers: &[String]);
    fn finalize(self: Box<Self>) -> ValidationResult;
}

/// Object-safe view of a [`Rule`], used by [`RuleSet`].
pub trait RegisteredRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn start<'r>(&'r self, headers: &[String]) -> Box<dyn RuleRun + 'r>;
}

struct Running<'r, R: Rule> {
    rule: &'r R,
    state: R::State,
}

impl<R: Rule> RuleRun for Running<'_, R> {
    fn process_row(&mut self, row: &NormalizedRow, row_index: usize, headers: &[String]) {
        self.rule.process_row(&mut self.state, row, row_index, headers);
    }

    fn finalize(self: Box<Self>) -> ValidationResult {
        let Running { rule, state } = *self;
        rule.finalize(state)
    }
}

impl<R> RegisteredRule for R
where
    R: Rule + Send + Sync,
    R::State: 'static,
{
    fn name(&self) -> &'static str {
        Rule::name(self)
    }

    fn start<'r>(&'r self, headers: &[String]) -> Box<dyn RuleRun + 'r> {
        Box::new(Running {
            rule: self,
            state: self.init(headers),
        })
    }
}

// =============================================================================
// Rule set
// =============================================================================

/// Ordered list of rules.
pub struct RuleSet {
    rules: Vec<Box<dyn RegisteredRule>>,
}

impl RuleSet {
    /// An empty set.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The inventory rules, in reporting order.
    pub fn standard() -> Self {
        Self::new()
            .with(RequiredColumns)
            .with(PoliceHold)
            .with(MissingItems)
            .with(CostVsPrice)
    }

    /// Append a rule.
    pub fn with<R>(mut self, rule: R) -> Self
    where
        R: Rule + Send + Sync + 'static,
        R::State: 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate a file in a single pass over its rows.
    pub fn run(&self, parsed: &ParsedFile) -> Vec<ValidationResult> {
        let headers = parsed.headers.as_slice();
        let mut runs: Vec<Box<dyn RuleRun + '_>> =
            self.rules.iter().map(|rule| rule.start(headers)).collect();

        for (row_index, row) in parsed.rows.iter().enumerate() {
            for run in runs.iter_mut() {
                run.process_row(row, row_index, headers);
            }
        }

        runs.into_iter().map(|run| run.finalize()).collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Shared, immutable standard rule set.
pub static STANDARD_RULES: Lazy<RuleSet> = Lazy::new(RuleSet::standard);

/// Run the standard rules over a parsed file.
pub fn run_validations(parsed: &ParsedFile) -> Vec<ValidationResult> {
    STANDARD_RULES.run(parsed)
}

/// Column in `headers` whose name is exactly `name`.
pub(crate) fn find_column(headers: &[String], name: &str) -> Option<String> {
    headers.iter().find(|h| h.as_str() == name).cloned()
}
