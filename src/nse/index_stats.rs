//! One statistics row for the tracked index, joined from the valuation
//! (`getIndexData`) and breadth (`getAdvanceDecline`) sources.

use super::config;
use super::normalize::{Row, field};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const JOIN_COLUMN: &str = "indexName";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexStats(pub Row);

impl IndexStats {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric column, zero when missing or unparseable
    pub fn number(&self, column: &str) -> f64 {
        field(&self.0, column, 0.0)
    }

    pub fn pe_ratio(&self) -> f64 {
        self.number("peRatio")
    }

    pub fn advances(&self) -> f64 {
        self.number("advance_symbol")
    }

    pub fn declines(&self) -> f64 {
        self.number("decline_symbol")
    }

    pub fn advance_turnover(&self) -> f64 {
        self.number("advance_top_turnover")
    }

    pub fn decline_turnover(&self) -> f64 {
        self.number("decline_top_turnover")
    }

    /// Schema every response carries, whatever the sources returned
    pub fn defaults() -> Self {
        let row = json!({
            "indexName": config::TRACKED_INDEX_NAME,
            "ffm": 0.0,
            "peRatio": 0.0,
            "pbRatio": 0.0,
            "dividentYield": 0.0,
            "volume": 0.0,
            "advance_symbol": 0,
            "decline_symbol": 0,
            "unchanged_symbol": 0,
            "total_symbol": 50,
            "advance_top_turnover": 0.0,
            "decline_top_turnover": 0.0,
            "total_top_turnover": 0.0
        });
        match row {
            Value::Object(map) => IndexStats(map),
            _ => IndexStats::default(),
        }
    }

    /// Lay this row over the default schema; present values win
    pub fn with_defaults(self) -> Self {
        let mut merged = Self::defaults().0;
        merged.extend(self.0);
        IndexStats(merged)
    }
}

/// Join the two sources into one row.
///
/// When both tables carry `indexName` the first valuation row with a
/// matching breadth row is joined with it; no match gives an empty row.
/// Otherwise the first rows of both tables are laid side by side. Duplicate
/// columns keep the valuation side. Nulls and columns missing from the picked
/// rows become `0`.
pub fn merge_index_stats(index_rows: &[Row], breadth_rows: &[Row]) -> IndexStats {
    let index_empty = is_empty_table(index_rows);
    let breadth_empty = is_empty_table(breadth_rows);

    if !index_empty
        && !breadth_empty
        && has_join_column(index_rows)
        && has_join_column(breadth_rows)
    {
        return inner_join_first(index_rows, breadth_rows);
    }

    if index_empty && breadth_empty {
        return IndexStats::default();
    }

    let mut row = Row::new();
    for table in [index_rows, breadth_rows] {
        if let Some(first) = table.first() {
            append_missing(&mut row, &fill_nulls(first, table));
        }
    }
    IndexStats(row)
}

fn inner_join_first(index_rows: &[Row], breadth_rows: &[Row]) -> IndexStats {
    for left in index_rows {
        let Some(key) = left.get(JOIN_COLUMN).filter(|v| !v.is_null()) else {
            continue;
        };
        if let Some(right) = breadth_rows.iter().find(|r| r.get(JOIN_COLUMN) == Some(key)) {
            let mut row = fill_nulls(left, index_rows);
            append_missing(&mut row, &fill_nulls(right, breadth_rows));
            return IndexStats(row);
        }
    }
    IndexStats::default()
}

/// Copy of `row` with every column of `table` present and nulls replaced by 0
fn fill_nulls(row: &Row, table: &[Row]) -> Row {
    let mut filled = Row::new();
    for column in table.iter().flat_map(|r| r.keys()) {
        if filled.contains_key(column) {
            continue;
        }
        let value = match row.get(column) {
            Some(v) if !v.is_null() => v.clone(),
            _ => Value::from(0),
        };
        filled.insert(column.clone(), value);
    }
    filled
}

fn append_missing(target: &mut Row, source: &Row) {
    for (k, v) in source {
        target.entry(k.clone()).or_insert_with(|| v.clone());
    }
}

fn is_empty_table(rows: &[Row]) -> bool {
    rows.iter().all(|r| r.is_empty())
}

fn has_join_column(rows: &[Row]) -> bool {
    rows.iter().any(|r| r.contains_key(JOIN_COLUMN))
}
