//! Cost must not be below the shelf price.
//!
//! Rows with a blank or non-numeric cost or price are left out of the check.
//! Only the first [`MAX_REPORTED_ITEMS`] violations are kept in the details;
//! `count` is always the full total.

use serde::{Deserialize, Serialize};

use super::{find_column, reported_row, Rule, ValidationResult, RULE_COST_VS_PRICE};
use crate::models::NormalizedRow;

/// Cap on `details.items` for this rule.
pub const MAX_REPORTED_ITEMS: usize = 50;

const SKIP_MESSAGE: &str = "Missing cost or price column - skipping check";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceViolation {
    pub row: usize,
    pub cost: f64,
    pub price: f64,
}

#[derive(Serialize)]
struct PriceDetails {
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<PriceViolation>>,
}

#[derive(Debug)]
pub struct PriceScan {
    /// `(cost, price)` column names, `None` when either is absent.
    columns: Option<(String, String)>,
    count: usize,
    items: Vec<PriceViolation>,
}

/// Flags rows where `cost < price`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostVsPrice;

impl Rule for CostVsPrice {
    type State = PriceScan;

    fn name(&self) -> &'static str {
        RULE_COST_VS_PRICE
    }

    fn init(&self, headers: &[String]) -> PriceScan {
        let columns = find_column(headers, "cost").zip(find_column(headers, "price"));
        PriceScan {
            columns,
            count: 0,
            items: Vec::new(),
        }
    }

    fn process_row(
        &self,
        state: &mut PriceScan,
        row: &NormalizedRow,
        row_index: usize,
        _: &[String],
    ) {
        let Some((cost_col, price_col)) = &state.columns else {
            return;
        };
        let cost = row.get(cost_col).and_then(|v| v.as_number());
        let price = row.get(price_col).and_then(|v| v.as_number());

        if let (Some(cost), Some(price)) = (cost, price) {
            if cost < price {
                state.count += 1;
                if state.items.len() < MAX_REPORTED_ITEMS {
                    state.items.push(PriceViolation {
                        row: reported_row(row_index),
                        cost,
                        price,
                    });
                }
            }
        }
    }

    fn finalize(&self, state: PriceScan) -> ValidationResult {
        if state.columns.is_none() {
            return ValidationResult::skipped(RULE_COST_VS_PRICE, SKIP_MESSAGE);
        }

        let details = PriceDetails {
            count: state.count,
            items: (state.count > 0).then_some(state.items),
        };
        ValidationResult::new(RULE_COST_VS_PRICE, state.count == 0, serde_json::json!(details))
    }
}
