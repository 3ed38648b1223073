//! Market snapshots served next to the option chain: large deals, volume
//! gainers, most-active securities and insider (PIT) disclosures.

use super::models::TabularPayload;
use super::normalize::{Row, field, normalize_columns, parse_number};
use super::ranking::sort_rows_desc;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

const DEAL_COLUMNS: &[&str] = &["QTY_TRADED", "TRADE_PRICE"];

const VOLUME_GAINER_COLUMNS: &[&str] = &[
    "volume",
    "week1AvgVolume",
    "week1volChange",
    "week2AvgVolume",
    "week2volChange",
    "ltp",
    "pChange",
    "turnover",
];

const MOST_ACTIVE_COLUMNS: &[&str] = &[
    "lastPrice",
    "pChange",
    "quantityTraded",
    "totalTradedVolume",
    "totalTradedValue",
    "previousClose",
    "yearHigh",
    "yearLow",
    "change",
    "open",
    "closePrice",
    "dayHigh",
    "dayLow",
];

const INSIDER_COLUMNS: &[&str] = &[
    "buyValue",
    "sellValue",
    "buyQuantity",
    "sellquantity",
    "secAcq",
    "secVal",
    "afterAcqSharesNo",
    "afterAcqSharesPer",
    "befAcqSharesNo",
    "befAcqSharesPer",
];

const INSIDER_DATE_FORMAT: &str = "%d-%b-%Y %H:%M";

/// Object rows of an array field; anything else counts as empty
fn table(payload: &Row, key: &str) -> Vec<Row> {
    match payload.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn section(payload: &Row, key: &str) -> Value {
    match payload.get(key) {
        Some(v) if !v.is_null() => v.clone(),
        _ => Value::Array(Vec::new()),
    }
}

// -----------------------------------------------
// LARGE DEALS
// -----------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeDealsSummary {
    pub bulk_count: usize,
    pub block_count: usize,
    pub short_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LargeDealsSnapshot {
    #[serde(rename = "asOnDate")]
    pub as_on_date: Option<Value>,
    #[serde(rename = "bulkDeals")]
    pub bulk_deals: Vec<Row>,
    #[serde(rename = "blockDeals")]
    pub block_deals: Vec<Row>,
    #[serde(rename = "shortDeals")]
    pub short_deals: Vec<Row>,
    pub summary: LargeDealsSummary,
    #[serde(rename = "BULK_DEALS")]
    pub raw_bulk: Value,
    #[serde(rename = "BLOCK_DEALS")]
    pub raw_block: Value,
    #[serde(rename = "SHORT_DEALS")]
    pub raw_short: Value,
}

pub fn build_large_deals(payload: &Row) -> LargeDealsSnapshot {
    let mut bulk = table(payload, "BULK_DEALS_DATA");
    let mut block = table(payload, "BLOCK_DEALS_DATA");
    let mut short = table(payload, "SHORT_DEALS_DATA");
    for rows in [&mut bulk, &mut block, &mut short] {
        normalize_columns(rows, DEAL_COLUMNS, 0.0);
    }

    LargeDealsSnapshot {
        as_on_date: payload.get("as_on_date").cloned(),
        summary: LargeDealsSummary {
            bulk_count: bulk.len(),
            block_count: block.len(),
            short_count: short.len(),
        },
        bulk_deals: bulk,
        block_deals: block,
        short_deals: short,
        raw_bulk: section(payload, "BULK_DEALS"),
        raw_block: section(payload, "BLOCK_DEALS"),
        raw_short: section(payload, "SHORT_DEALS"),
    }
}

// -----------------------------------------------
// VOLUME GAINERS
// -----------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeGainersSummary {
    pub top_symbol: Option<Value>,
    pub total_count: usize,
    pub timestamp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeGainersSnapshot {
    pub volume_gainers: Vec<Row>,
    pub summary: VolumeGainersSummary,
}

pub fn build_volume_gainers(payload: TabularPayload) -> VolumeGainersSnapshot {
    let mut rows = payload.data;
    normalize_columns(&mut rows, VOLUME_GAINER_COLUMNS, 0.0);
    sort_rows_desc(&mut rows, "week1volChange");

    VolumeGainersSnapshot {
        summary: VolumeGainersSummary {
            top_symbol: rows.first().and_then(|r| r.get("symbol").cloned()),
            total_count: rows.len(),
            timestamp: payload.timestamp,
        },
        volume_gainers: rows,
    }
}

// -----------------------------------------------
// MOST ACTIVE SECURITIES
// -----------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MostActiveSummary {
    pub top_symbol: Option<Value>,
    pub top_turnover: Option<f64>,
    pub total_count: usize,
    pub timestamp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MostActiveSecuritiesSnapshot {
    pub most_active_securities: Vec<Row>,
    pub summary: MostActiveSummary,
}

pub fn build_most_active_securities(payload: TabularPayload) -> MostActiveSecuritiesSnapshot {
    let mut rows = payload.data;
    normalize_columns(&mut rows, MOST_ACTIVE_COLUMNS, 0.0);
    sort_rows_desc(&mut rows, "totalTradedValue");

    let top = rows.first();
    MostActiveSecuritiesSnapshot {
        summary: MostActiveSummary {
            top_symbol: top.and_then(|r| r.get("symbol").cloned()),
            top_turnover: top.and_then(|r| parse_number(r.get("totalTradedValue"))),
            total_count: rows.len(),
            timestamp: payload.timestamp,
        },
        most_active_securities: rows,
    }
}

// -----------------------------------------------
// INSIDER DISCLOSURES (PIT)
// -----------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub company: String,
    pub sec_val: f64,
    /// Rows carrying a transaction type
    pub tdp_transaction_type: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_disclosure: Option<Row>,
    pub total_disclosures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_value_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell_value_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_summary: Option<Vec<CompanySummary>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderSnapshot {
    #[serde(rename = "corporatesPIT")]
    pub corporates_pit: Vec<Row>,
    pub acq_name_list: Value,
    pub summary: InsiderSummary,
}

pub fn parse_disclosure_date(row: &Row) -> Option<NaiveDateTime> {
    let raw = row.get("date")?.as_str()?;
    NaiveDateTime::parse_from_str(raw.trim(), INSIDER_DATE_FORMAT).ok()
}

/// Newest first; rows whose date does not parse go last in input order
fn sort_by_disclosure_date(rows: Vec<Row>) -> Vec<Row> {
    let mut keyed: Vec<(Option<NaiveDateTime>, Row)> = rows
        .into_iter()
        .map(|row| (parse_disclosure_date(&row), row))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}

fn transaction_total(rows: &[Row], transaction: &str) -> f64 {
    rows.iter()
        .filter(|row| {
            row.get("tdpTransactionType")
                .and_then(Value::as_str)
                .is_some_and(|t| t.trim().eq_ignore_ascii_case(transaction))
        })
        .map(|row| field(row, "secVal", 0.0))
        .sum()
}

fn company_name(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn company_summaries(rows: &[Row]) -> Vec<CompanySummary> {
    let mut grouped: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let Some(company) = company_name(row.get("company")) else {
            continue;
        };
        let entry = grouped.entry(company).or_default();
        entry.0 += field(row, "secVal", 0.0);
        if row.get("tdpTransactionType").is_some_and(|v| !v.is_null()) {
            entry.1 += 1;
        }
    }

    grouped
        .into_iter()
        .map(|(company, (sec_val, count))| CompanySummary {
            company,
            sec_val,
            tdp_transaction_type: count,
        })
        .collect()
}

pub fn build_insider_snapshot(payload: &Row) -> InsiderSnapshot {
    let acq_name_list = section(payload, "acqNameList");
    let mut rows = table(payload, "data");

    if rows.iter().all(|r| r.is_empty()) {
        return InsiderSnapshot {
            corporates_pit: Vec::new(),
            acq_name_list,
            summary: InsiderSummary {
                latest_disclosure: None,
                total_disclosures: 0,
                buy_value_total: None,
                sell_value_total: None,
                company_summary: None,
            },
        };
    }

    normalize_columns(&mut rows, INSIDER_COLUMNS, 0.0);
    let rows = sort_by_disclosure_date(rows);

    InsiderSnapshot {
        summary: InsiderSummary {
            latest_disclosure: rows.first().cloned(),
            total_disclosures: rows.len(),
            buy_value_total: Some(transaction_total(&rows, "BUY")),
            sell_value_total: Some(transaction_total(&rows, "SELL")),
            company_summary: Some(company_summaries(&rows)),
        },
        corporates_pit: rows,
        acq_name_list,
    }
}
