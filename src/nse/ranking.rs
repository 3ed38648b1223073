//! Ordering rules for the derived lists.

use super::models::EnrichedContract;
use super::normalize::{Row, field, has_column};
use std::cmp::Ordering;

/// Ascending by strike. `sort_by` is stable so equal strikes keep input order.
pub fn sort_by_strike(contracts: &mut [EnrichedContract]) {
    contracts.sort_by(|a, b| a.strike_price.total_cmp(&b.strike_price));
}

/// Open-interest ranking: the first index row goes on top, any later index
/// rows are dropped, the rest is sorted by `OI` descending.
pub fn rank_by_open_interest(contracts: Vec<EnrichedContract>) -> Vec<EnrichedContract> {
    let mut index_row = None;
    let mut rest = Vec::with_capacity(contracts.len());

    for contract in contracts {
        if contract.is_index() {
            if index_row.is_none() {
                index_row = Some(contract);
            }
        } else {
            rest.push(contract);
        }
    }

    rest.sort_by(|a, b| b.oi.total_cmp(&a.oi));

    let mut ranked = Vec::with_capacity(rest.len() + 1);
    ranked.extend(index_row);
    ranked.extend(rest);
    ranked
}

/// Sort table rows descending by a numeric column. Without the column the
/// provider order stays as is.
pub fn sort_rows_desc(rows: &mut [Row], column: &str) {
    if !has_column(rows, column) {
        return;
    }
    rows.sort_by(|a, b| {
        field(b, column, 0.0)
            .partial_cmp(&field(a, column, 0.0))
            .unwrap_or(Ordering::Equal)
    });
}
