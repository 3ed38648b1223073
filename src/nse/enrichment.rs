//! Record merger: fills most-active summaries in from the option chain.

use super::config;
use super::models::{
    ContractKey, ContractKind, DisplayValue, EnrichedContract, OptionContract, QuoteDetail, text,
};
use super::normalize::{Row, field, parse_number};
use serde_json::Value;
use std::collections::HashMap;

/// Chain quotes keyed by strike, expiry and side
pub type QuoteTable = HashMap<ContractKey, QuoteDetail>;

/// Summary columns replaced by the enriched fields
const ENRICHED_COLUMNS: &[&str] = &[
    "strikePrice",
    "expiryDate",
    "optionType",
    "OI",
    "COI",
    "TBQ",
    "TSQ",
    "pchange",
    "lastPrice",
    "volume",
    "value",
    "OI_display",
    "COI_display",
    "volume_display",
];

/// Index the normalized chain. Contracts without an expiry are left out and
/// a later duplicate key overwrites an earlier one.
pub fn build_quote_table(contracts: &[OptionContract]) -> QuoteTable {
    let mut table = QuoteTable::with_capacity(contracts.len());
    for contract in contracts {
        let Some(expiry) = contract.expiry_date.as_deref() else {
            continue;
        };
        table.insert(
            ContractKey::new(contract.strike_price, expiry, contract.option_side),
            QuoteDetail::from(contract),
        );
    }
    table
}

/// Enrich a most-active list against the quote table.
///
/// Summaries without a numeric strike are dropped; everything else is kept,
/// matched or not. Output order follows input order.
pub fn enrich_contracts(
    summaries: &[Row],
    table: &QuoteTable,
    nearest_expiry: Option<&str>,
) -> Vec<EnrichedContract> {
    summaries
        .iter()
        .filter_map(|row| enrich_contract(row, table, nearest_expiry))
        .collect()
}

pub fn enrich_contract(
    row: &Row,
    table: &QuoteTable,
    nearest_expiry: Option<&str>,
) -> Option<EnrichedContract> {
    let strike = parse_number(row.get("strikePrice"))?;

    let label = text(row.get("optionType"));
    let kind = label.as_deref().and_then(ContractKind::from_label);
    let option_type = match kind {
        Some(kind) => Some(kind.code().to_string()),
        None => label,
    };

    let own_expiry = text(row.get("expiryDate"));
    let lookup_expiry = own_expiry.as_deref().or(nearest_expiry);

    let detail = match (kind.and_then(ContractKind::option_side), lookup_expiry) {
        (Some(side), Some(expiry)) => table.get(&ContractKey::new(strike, expiry, side)),
        _ => None,
    };

    let quote = match detail {
        Some(d) => *d,
        None => QuoteDetail {
            open_interest: field(row, "OI", 0.0),
            change_in_open_interest: field(row, "COI", 0.0),
            total_buy_quantity: field(row, "TBQ", 0.0),
            total_sell_quantity: field(row, "TSQ", 0.0),
            percent_change: field(row, "pchange", 0.0),
            last_price: field(row, "lastPrice", 0.0),
            total_traded_volume: field(row, "volume", 0.0),
        },
    };

    let last_price = if quote.last_price == 0.0 {
        config::MIN_TICK
    } else {
        quote.last_price
    };

    let expiry_date = own_expiry
        .or_else(|| nearest_expiry.map(str::to_string))
        .unwrap_or_else(|| config::EXPIRY_UNAVAILABLE.to_string());

    let value = row
        .get("value")
        .cloned()
        .unwrap_or_else(|| Value::String(config::DISPLAY_UNAVAILABLE.to_string()));

    let mut extra = row.clone();
    for column in ENRICHED_COLUMNS {
        extra.remove(*column);
    }

    Some(EnrichedContract {
        extra,
        strike_price: strike,
        expiry_date,
        option_type,
        kind,
        oi: quote.open_interest,
        coi: quote.change_in_open_interest,
        tbq: quote.total_buy_quantity,
        tsq: quote.total_sell_quantity,
        pchange: quote.percent_change,
        last_price,
        volume: quote.total_traded_volume,
        value,
        oi_display: DisplayValue::of(quote.open_interest),
        coi_display: DisplayValue::of(quote.change_in_open_interest),
        volume_display: DisplayValue::of(quote.total_traded_volume),
    })
}
