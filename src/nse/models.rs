use super::config;
use super::normalize::Row;
use ordered_float::OrderedFloat;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A list whose entries are kept only when they have the expected shape.
/// A missing or null list is empty; a non-list is still an error.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Non-empty trimmed string content of a field, if any
pub fn text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

// -----------------------------------------------
// RAW UPSTREAM PAYLOADS
// -----------------------------------------------

/// Main response structure from NSE option chain API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionChainPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub records: ChainRecords,

    #[serde(default, deserialize_with = "null_as_default")]
    pub filtered: FilteredData,
}

/// Records section: timestamp, spot price and the listed expiries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainRecords {
    #[serde(default)]
    pub timestamp: Option<Value>,

    #[serde(rename = "underlyingValue", default)]
    pub underlying_value: Option<Value>,

    #[serde(rename = "expiryDates", default, deserialize_with = "lenient_items")]
    pub expiry_dates: Vec<String>,
}

/// Filtered section: per-strike rows for the requested expiry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilteredData {
    #[serde(default, deserialize_with = "lenient_items")]
    pub data: Vec<StrikeRow>,
}

/// One strike of the chain, with either side possibly missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrikeRow {
    #[serde(rename = "strikePrice", default)]
    pub strike_price: Option<Value>,

    #[serde(rename = "CE", default)]
    pub call: Option<Value>,

    #[serde(rename = "PE", default)]
    pub put: Option<Value>,
}

impl StrikeRow {
    pub fn quote(&self, side: OptionSide) -> Option<ChainQuote> {
        let raw = match side {
            OptionSide::Call => self.call.as_ref(),
            OptionSide::Put => self.put.as_ref(),
        };
        match raw {
            Some(Value::Object(obj)) if !obj.is_empty() => Some(ChainQuote::from_object(obj)),
            _ => None,
        }
    }
}

/// Raw CE or PE quote. Every field may be a number, a string or missing.
#[derive(Debug, Clone, Default)]
pub struct ChainQuote {
    pub expiry_date: Option<String>,
    pub open_interest: Option<Value>,
    pub change_in_oi: Option<Value>,
    pub total_traded_volume: Option<Value>,
    pub implied_volatility: Option<Value>,
    pub last_price: Option<Value>,
    pub pchange: Option<Value>,
    pub total_buy_quantity: Option<Value>,
    pub total_sell_quantity: Option<Value>,
}

impl ChainQuote {
    pub fn from_object(obj: &Row) -> Self {
        let get = |key: &str| obj.get(key).cloned();
        Self {
            expiry_date: text(obj.get("expiryDate")),
            open_interest: get("openInterest"),
            change_in_oi: get("changeinOpenInterest"),
            total_traded_volume: get("totalTradedVolume"),
            implied_volatility: get("impliedVolatility"),
            last_price: get("lastPrice"),
            // older payloads spell it pChange, option-chain-v3 uses pchange
            pchange: get("pChange").or_else(|| get("pchange")),
            total_buy_quantity: get("totalBuyQuantity"),
            total_sell_quantity: get("totalSellQuantity"),
        }
    }
}

/// Most-active contract lists from the index tracker API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveContractsPayload {
    #[serde(rename = "mostActiveCall", default, deserialize_with = "lenient_items")]
    pub calls: Vec<Row>,

    #[serde(rename = "mostActivePut", default, deserialize_with = "lenient_items")]
    pub puts: Vec<Row>,

    #[serde(rename = "mostActiveContractbyOI", default, deserialize_with = "lenient_items")]
    pub by_oi: Vec<Row>,
}

/// Generic `{data: [...], timestamp}` payload shared by several NSE endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabularPayload {
    #[serde(default, deserialize_with = "lenient_items")]
    pub data: Vec<Row>,

    #[serde(default)]
    pub timestamp: Option<Value>,
}

// -----------------------------------------------
// SIDE VOCABULARY
// -----------------------------------------------

/// Side of an option contract in option-chain vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionSide {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionSide {
    pub const BOTH: [OptionSide; 2] = [OptionSide::Call, OptionSide::Put];

    pub fn code(self) -> &'static str {
        match self {
            OptionSide::Call => "CE",
            OptionSide::Put => "PE",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Kind of a most-active summary row, as labelled by the index tracker API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Call,
    Put,
    Index,
}

/// Provider label, kind, and the code used in enriched output
const SIDE_VOCABULARY: &[(&str, ContractKind, &str)] = &[
    ("Call", ContractKind::Call, "CE"),
    ("Put", ContractKind::Put, "PE"),
    ("Index", ContractKind::Index, "XX"),
];

impl ContractKind {
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        SIDE_VOCABULARY
            .iter()
            .find(|(l, _, _)| *l == label)
            .map(|(_, kind, _)| *kind)
    }

    pub fn code(self) -> &'static str {
        SIDE_VOCABULARY
            .iter()
            .find(|(_, kind, _)| *kind == self)
            .map(|(_, _, code)| *code)
            .unwrap_or("XX")
    }

    /// Chain side this kind can be matched against; the index row has none
    pub fn option_side(self) -> Option<OptionSide> {
        match self {
            ContractKind::Call => Some(OptionSide::Call),
            ContractKind::Put => Some(OptionSide::Put),
            ContractKind::Index => None,
        }
    }
}

// -----------------------------------------------
// NORMALIZED CHAIN ENTITIES
// -----------------------------------------------

/// One side of one strike, every quote field numeric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    pub strike_price: f64,
    pub expiry_date: Option<String>,
    pub option_side: OptionSide,
    pub open_interest: f64,
    pub change_in_open_interest: f64,
    pub total_buy_quantity: f64,
    pub total_sell_quantity: f64,
    pub percent_change: f64,
    pub last_price: f64,
    pub total_traded_volume: f64,
}

impl OptionContract {
    /// Alert bucket key, e.g. `"21000 CE"`
    pub fn alert_key(&self) -> String {
        format!("{} {}", self.strike_price, self.option_side)
    }
}

/// Lookup key of the enrichment table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractKey {
    pub strike: OrderedFloat<f64>,
    pub expiry: String,
    pub side: OptionSide,
}

impl ContractKey {
    pub fn new(strike: f64, expiry: impl Into<String>, side: OptionSide) -> Self {
        Self {
            strike: OrderedFloat(strike),
            expiry: expiry.into(),
            side,
        }
    }
}

/// Quote fields copied onto a matching summary row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteDetail {
    pub open_interest: f64,
    pub change_in_open_interest: f64,
    pub total_buy_quantity: f64,
    pub total_sell_quantity: f64,
    pub percent_change: f64,
    pub last_price: f64,
    pub total_traded_volume: f64,
}

impl From<&OptionContract> for QuoteDetail {
    fn from(c: &OptionContract) -> Self {
        Self {
            open_interest: c.open_interest,
            change_in_open_interest: c.change_in_open_interest,
            total_buy_quantity: c.total_buy_quantity,
            total_sell_quantity: c.total_sell_quantity,
            percent_change: c.percent_change,
            last_price: c.last_price,
            total_traded_volume: c.total_traded_volume,
        }
    }
}

/// Normalized quote columns of one side inside a [`StrikeDetail`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideColumns {
    pub open_interest: f64,
    pub change_in_oi: f64,
    pub total_traded_volume: f64,
    pub implied_volatility: f64,
    pub last_price: f64,
    pub pchange: f64,
    pub total_buy_quantity: f64,
    pub total_sell_quantity: f64,
}

/// Flattened per-strike row, both sides side by side (`optionChainDetails`)
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeDetail {
    pub strike_price: f64,
    pub expiry_date: Option<String>,
    pub call: SideColumns,
    pub put: SideColumns,
}

impl Serialize for StrikeDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(18))?;
        map.serialize_entry("strikePrice", &self.strike_price)?;
        map.serialize_entry("expiryDate", &self.expiry_date)?;
        for (prefix, cols) in [("CE", &self.call), ("PE", &self.put)] {
            let columns = [
                ("openInterest", cols.open_interest),
                ("changeinOpenInterest", cols.change_in_oi),
                ("totalTradedVolume", cols.total_traded_volume),
                ("impliedVolatility", cols.implied_volatility),
                ("lastPrice", cols.last_price),
                ("pChange", cols.pchange),
                ("totalBuyQuantity", cols.total_buy_quantity),
                ("totalSellQuantity", cols.total_sell_quantity),
            ];
            for (name, value) in columns {
                map.serialize_entry(&format!("{}_{}", prefix, name), &value)?;
            }
        }
        map.end()
    }
}

// -----------------------------------------------
// ENRICHED OUTPUT
// -----------------------------------------------

/// Presentation mirror of a numeric field: zero shows as `"-"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayValue {
    Value(f64),
    Unavailable,
}

impl DisplayValue {
    pub fn of(v: f64) -> Self {
        if v == 0.0 {
            DisplayValue::Unavailable
        } else {
            DisplayValue::Value(v)
        }
    }
}

impl Serialize for DisplayValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DisplayValue::Value(v) => serializer.serialize_f64(*v),
            DisplayValue::Unavailable => serializer.serialize_str(config::DISPLAY_UNAVAILABLE),
        }
    }
}

/// Most-active summary row after enrichment against the chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedContract {
    /// Provider columns this crate does not interpret
    #[serde(flatten)]
    pub extra: Row,

    #[serde(rename = "strikePrice")]
    pub strike_price: f64,

    #[serde(rename = "expiryDate")]
    pub expiry_date: String,

    /// `CE`, `PE`, `XX`, or the provider label when it is not recognised
    #[serde(rename = "optionType", skip_serializing_if = "Option::is_none")]
    pub option_type: Option<String>,

    #[serde(skip)]
    pub kind: Option<ContractKind>,

    #[serde(rename = "OI")]
    pub oi: f64,

    #[serde(rename = "COI")]
    pub coi: f64,

    #[serde(rename = "TBQ")]
    pub tbq: f64,

    #[serde(rename = "TSQ")]
    pub tsq: f64,

    pub pchange: f64,

    #[serde(rename = "lastPrice")]
    pub last_price: f64,

    pub volume: f64,

    pub value: Value,

    #[serde(rename = "OI_display")]
    pub oi_display: DisplayValue,

    #[serde(rename = "COI_display")]
    pub coi_display: DisplayValue,

    #[serde(rename = "volume_display")]
    pub volume_display: DisplayValue,
}

impl EnrichedContract {
    pub fn is_index(&self) -> bool {
        self.kind == Some(ContractKind::Index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_side_vocabulary_round_trip() {
        assert_eq!(ContractKind::from_label("Call"), Some(ContractKind::Call));
        assert_eq!(ContractKind::from_label(" Put "), Some(ContractKind::Put));
        assert_eq!(ContractKind::from_label("Index"), Some(ContractKind::Index));
        assert_eq!(ContractKind::from_label("Future"), None);

        assert_eq!(ContractKind::Call.code(), "CE");
        assert_eq!(ContractKind::Put.code(), "PE");
        assert_eq!(ContractKind::Index.code(), "XX");
        assert_eq!(ContractKind::Index.option_side(), None);
    }

    #[test]
    fn test_display_value_serializes_marker_for_zero() {
        assert_eq!(serde_json::to_value(DisplayValue::of(0.0)).unwrap(), json!("-"));
        assert_eq!(serde_json::to_value(DisplayValue::of(1500.0)).unwrap(), json!(1500.0));
    }

    #[test]
    fn test_quote_reads_either_pchange_spelling() {
        let row: StrikeRow = serde_json::from_value(json!({
            "strikePrice": 21000,
            "CE": {"pchange": "4.5", "expiryDate": "02-Sep-2025"},
            "PE": {}
        }))
        .unwrap();

        let ce = row.quote(OptionSide::Call).unwrap();
        assert_eq!(ce.pchange, Some(json!("4.5")));
        assert_eq!(ce.expiry_date.as_deref(), Some("02-Sep-2025"));
        assert!(row.quote(OptionSide::Put).is_none());
    }

    #[test]
    fn test_null_sections_deserialize_as_empty() {
        let payload: OptionChainPayload =
            serde_json::from_value(json!({"records": null, "filtered": {"data": null}})).unwrap();
        assert!(payload.records.expiry_dates.is_empty());
        assert!(payload.filtered.data.is_empty());
    }

    #[test]
    fn test_chain_skips_malformed_entries() {
        let payload: OptionChainPayload = serde_json::from_value(json!({
            "records": {
                "timestamp": 1756720800,
                "expiryDates": ["02-Sep-2025", null, 5, "09-Sep-2025"]
            },
            "filtered": {"data": [
                {"strikePrice": 21000, "CE": {"expiryDate": "02-Sep-2025"}},
                null,
                "21100"
            ]}
        }))
        .unwrap();

        assert_eq!(payload.records.expiry_dates, vec!["02-Sep-2025", "09-Sep-2025"]);
        assert_eq!(payload.records.timestamp, Some(json!(1756720800)));
        assert_eq!(payload.filtered.data.len(), 1);
    }

    #[test]
    fn test_active_lists_skip_null_rows() {
        let payload: ActiveContractsPayload = serde_json::from_value(json!({
            "mostActiveCall": [{"strikePrice": 21000, "optionType": "Call"}, null],
            "mostActivePut": [{"strikePrice": 21000, "optionType": "Put"}],
            "mostActiveContractbyOI": null
        }))
        .unwrap();

        assert_eq!(payload.calls.len(), 1);
        assert_eq!(payload.puts.len(), 1);
        assert!(payload.by_oi.is_empty());
    }

    #[test]
    fn test_tabular_skips_non_object_rows() {
        let payload: TabularPayload =
            serde_json::from_value(json!({"data": [{"symbol": "A"}, null, [1, 2]]})).unwrap();
        assert_eq!(payload.data.len(), 1);
        assert_eq!(payload.data[0]["symbol"], json!("A"));

        // a non-list is still a shape error
        assert!(serde_json::from_value::<TabularPayload>(json!({"data": "oops"})).is_err());
    }

    #[test]
    fn test_strike_detail_flattens_side_columns() {
        let detail = StrikeDetail {
            strike_price: 21000.0,
            expiry_date: Some("02-Sep-2025".to_string()),
            call: SideColumns { open_interest: 10.0, ..Default::default() },
            put: SideColumns::default(),
        };
        let v = serde_json::to_value(&detail).unwrap();
        assert_eq!(v["CE_openInterest"], json!(10.0));
        assert_eq!(v["PE_pChange"], json!(0.0));
        assert_eq!(v["expiryDate"], json!("02-Sep-2025"));
    }
}
