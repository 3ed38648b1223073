use nifty_pulse::nse::models::ActiveContractsPayload;
use nifty_pulse::nse::dashboard::build_active_lists;
use nifty_pulse::nse::{
    OptionChainPayload,
    Row,
    build_quote_table,
    enrich_contracts,
    process_option_chain,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const NEAREST: &str = "02-Sep-2025";

    fn chain() -> OptionChainPayload {
        serde_json::from_value(json!({
            "records": {
                "timestamp": "01-Sep-2025 15:30:00",
                "underlyingValue": 21105.5,
                "expiryDates": [NEAREST, "09-Sep-2025"]
            },
            "filtered": {"data": [
                {
                    "strikePrice": 21000,
                    "CE": {
                        "expiryDate": NEAREST,
                        "openInterest": 120000,
                        "changeinOpenInterest": 15000,
                        "pChange": 5,
                        "lastPrice": "112.5",
                        "totalTradedVolume": "5000"
                    },
                    "PE": {
                        "expiryDate": NEAREST,
                        "openInterest": 60000,
                        "changeinOpenInterest": -12000,
                        "pChange": -25,
                        "lastPrice": 0
                    }
                },
                {"strikePrice": 21200, "CE": {"expiryDate": NEAREST, "openInterest": 1000}},
                {"CE": {"expiryDate": NEAREST, "openInterest": 999999}}
            ]}
        }))
        .unwrap()
    }

    fn summaries(v: Value) -> Vec<Row> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_summary_without_oi_is_filled_from_chain() {
        let processed = process_option_chain(&chain().filtered.data, Some(NEAREST));
        let table = build_quote_table(&processed.contracts);

        let out = enrich_contracts(
            &summaries(json!([{"strikePrice": 21000, "optionType": "Call"}])),
            &table,
            Some(NEAREST),
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].oi, 120000.0);
        assert_eq!(out[0].coi, 15000.0);
        assert_eq!(out[0].pchange, 5.0);
        assert_eq!(out[0].last_price, 112.5);
        assert_eq!(out[0].volume, 5000.0);
        assert_eq!(out[0].expiry_date, NEAREST);
    }

    #[test]
    fn test_unmatched_summary_keeps_own_values() {
        let processed = process_option_chain(&chain().filtered.data, Some(NEAREST));
        let table = build_quote_table(&processed.contracts);

        let out = enrich_contracts(
            &summaries(json!([{
                "strikePrice": 25000,
                "optionType": "Call",
                "expiryDate": "30-Sep-2025",
                "OI": "3400",
                "lastPrice": "-",
                "volume": null
            }])),
            &table,
            Some(NEAREST),
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].oi, 3400.0);
        assert_eq!(out[0].coi, 0.0);
        assert_eq!(out[0].last_price, 0.05);
        assert_eq!(out[0].volume, 0.0);
        assert_eq!(out[0].expiry_date, "30-Sep-2025");

        let v = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(v["volume_display"], json!("-"));
        assert_eq!(v["OI_display"], json!(3400.0));
    }

    #[test]
    fn test_own_expiry_drives_the_lookup() {
        let processed = process_option_chain(&chain().filtered.data, Some(NEAREST));
        let table = build_quote_table(&processed.contracts);

        // same strike and side, different expiry: no match
        let out = enrich_contracts(
            &summaries(json!([{"strikePrice": 21000, "optionType": "Call", "expiryDate": "09-Sep-2025"}])),
            &table,
            Some(NEAREST),
        );
        assert_eq!(out[0].oi, 0.0);
    }

    #[test]
    fn test_summary_without_strike_is_dropped() {
        let out = enrich_contracts(
            &summaries(json!([
                {"optionType": "Put", "OI": 10},
                {"strikePrice": 21000, "optionType": "Put"}
            ])),
            &Default::default(),
            Some(NEAREST),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].strike_price, 21000.0);
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let processed = process_option_chain(&chain().filtered.data, Some(NEAREST));
        let table = build_quote_table(&processed.contracts);
        let input = summaries(json!([
            {"strikePrice": 21000, "optionType": "Put", "extra": [1, 2]},
            {"strikePrice": 21200, "optionType": "Call"},
            {"strikePrice": 21105, "optionType": "Index"}
        ]));

        let first = enrich_contracts(&input, &table, Some(NEAREST));
        let second = enrich_contracts(&input, &table, Some(NEAREST));

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_ranked_lists() {
        let processed = process_option_chain(&chain().filtered.data, Some(NEAREST));
        let table = build_quote_table(&processed.contracts);
        let active: ActiveContractsPayload = serde_json::from_value(json!({
            "mostActiveCall": [
                {"strikePrice": 21500, "optionType": "Call"},
                {"strikePrice": 21000, "optionType": "Call"},
                {"strikePrice": 21200, "optionType": "Call"}
            ],
            "mostActivePut": [
                {"optionType": "Put"},
                {"strikePrice": 21000, "optionType": "Put", "expiryDate": NEAREST}
            ],
            "mostActiveContractbyOI": [
                {"strikePrice": 21200, "optionType": "Call"},
                {"strikePrice": 21000, "optionType": "Put"},
                {"strikePrice": 21105, "optionType": "Index", "OI": 0},
                {"strikePrice": 21000, "optionType": "Call"}
            ]
        }))
        .unwrap();

        let lists = build_active_lists(&active, &table, Some(NEAREST));

        let strikes: Vec<f64> = lists.calls.iter().map(|c| c.strike_price).collect();
        assert_eq!(strikes, vec![21000.0, 21200.0, 21500.0]);

        assert_eq!(lists.puts.len(), 1);
        // a zero chain price is floored to the tick
        assert_eq!(lists.puts[0].last_price, 0.05);

        let oi_order: Vec<(f64, Option<&str>)> = lists
            .by_oi
            .iter()
            .map(|c| (c.oi, c.option_type.as_deref()))
            .collect();
        assert_eq!(
            oi_order,
            vec![
                (0.0, Some("XX")),
                (120000.0, Some("CE")),
                (60000.0, Some("PE")),
                (1000.0, Some("CE")),
            ]
        );
    }

    #[test]
    fn test_chain_details_cover_every_strike() {
        let processed = process_option_chain(&chain().filtered.data, Some(NEAREST));

        assert_eq!(processed.details.len(), 2);
        assert_eq!(processed.contracts.len(), 3);

        let v = serde_json::to_value(&processed.details[1]).unwrap();
        assert_eq!(v["strikePrice"], json!(21200.0));
        assert_eq!(v["CE_openInterest"], json!(1000.0));
        assert_eq!(v["PE_openInterest"], json!(0.0));
    }
}
