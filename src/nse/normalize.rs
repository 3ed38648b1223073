//! Turns loosely typed provider fields into plain `f64`.
//!
//! NSE sends the same column as a number on one row, a string on the next, and
//! leaves it out entirely on a third. Everything numeric in this crate goes
//! through [`to_number`] before any arithmetic happens.

use serde_json::{Map, Value};

/// Row of a tabular NSE payload, kept as-is apart from normalized columns
pub type Row = Map<String, Value>;

/// Parse `value` as a number, falling back to `default`.
///
/// Numbers pass through, strings are trimmed and parsed. Absent, null,
/// booleans, arrays, objects, unparseable strings and non-finite results all
/// yield `default`. A literal zero is a valid result.
pub fn to_number(value: Option<&Value>, default: f64) -> f64 {
    parse_number(value).unwrap_or(default)
}

/// Finite numeric content of a value, `None` when there is none
pub fn parse_number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Like [`to_number`] but treats zero as missing as well
pub fn nonzero_or(value: Option<&Value>, default: f64) -> f64 {
    let v = to_number(value, default);
    if v == 0.0 { default } else { v }
}

/// Look up `key` in a row and normalize it
pub fn field(row: &Row, key: &str, default: f64) -> f64 {
    to_number(row.get(key), default)
}

/// Normalize the given columns of a table in place.
///
/// A column counts as present when any row carries it; in that case every row
/// ends up with a numeric value for it, missing cells getting `default`.
/// Columns no row carries are left out.
pub fn normalize_columns(rows: &mut [Row], columns: &[&str], default: f64) {
    for column in columns {
        if !has_column(rows, column) {
            continue;
        }
        for row in rows.iter_mut() {
            let v = to_number(row.get(*column), default);
            row.insert((*column).to_string(), number_value(v));
        }
    }
}

pub fn has_column(rows: &[Row], column: &str) -> bool {
    rows.iter().any(|row| row.contains_key(column))
}

/// JSON value for a finite float; non-finite input becomes zero
pub fn number_value(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}
