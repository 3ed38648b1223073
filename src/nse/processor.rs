use super::models::{ChainQuote, OptionContract, OptionSide, SideColumns, StrikeDetail, StrikeRow};
use super::normalize::{parse_number, to_number};
use tracing::debug;

/// Option chain flattened two ways: one row per strike, one contract per side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedChain {
    pub details: Vec<StrikeDetail>,
    pub contracts: Vec<OptionContract>,
}

/// Flatten `filtered.data` of an option chain.
///
/// A strike's expiry is taken from its CE side, then its PE side, then
/// `fallback_expiry`. Strikes without a numeric strike price are skipped.
/// Provider order is kept in both outputs.
pub fn process_option_chain(rows: &[StrikeRow], fallback_expiry: Option<&str>) -> ProcessedChain {
    let mut processed = ProcessedChain::default();
    let mut skipped = 0usize;

    for row in rows {
        let Some(strike) = parse_number(row.strike_price.as_ref()) else {
            skipped += 1;
            continue;
        };

        let ce = row.quote(OptionSide::Call);
        let pe = row.quote(OptionSide::Put);

        let expiry = ce
            .as_ref()
            .and_then(|q| q.expiry_date.clone())
            .or_else(|| pe.as_ref().and_then(|q| q.expiry_date.clone()))
            .or_else(|| fallback_expiry.map(str::to_string));

        processed.details.push(StrikeDetail {
            strike_price: strike,
            expiry_date: expiry.clone(),
            call: ce.as_ref().map(side_columns).unwrap_or_default(),
            put: pe.as_ref().map(side_columns).unwrap_or_default(),
        });

        for (side, quote) in [(OptionSide::Call, &ce), (OptionSide::Put, &pe)] {
            if let Some(quote) = quote {
                processed
                    .contracts
                    .push(build_contract(strike, expiry.clone(), side, quote));
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped option chain rows without a strike price");
    }

    processed
}

fn side_columns(q: &ChainQuote) -> SideColumns {
    SideColumns {
        open_interest: to_number(q.open_interest.as_ref(), 0.0),
        change_in_oi: to_number(q.change_in_oi.as_ref(), 0.0),
        total_traded_volume: to_number(q.total_traded_volume.as_ref(), 0.0),
        implied_volatility: to_number(q.implied_volatility.as_ref(), 0.0),
        last_price: to_number(q.last_price.as_ref(), 0.0),
        pchange: to_number(q.pchange.as_ref(), 0.0),
        total_buy_quantity: to_number(q.total_buy_quantity.as_ref(), 0.0),
        total_sell_quantity: to_number(q.total_sell_quantity.as_ref(), 0.0),
    }
}

fn build_contract(
    strike: f64,
    expiry: Option<String>,
    side: OptionSide,
    q: &ChainQuote,
) -> OptionContract {
    let cols = side_columns(q);
    OptionContract {
        strike_price: strike,
        expiry_date: expiry,
        option_side: side,
        open_interest: cols.open_interest,
        change_in_open_interest: cols.change_in_oi,
        total_buy_quantity: cols.total_buy_quantity,
        total_sell_quantity: cols.total_sell_quantity,
        percent_change: cols.pchange,
        last_price: cols.last_price,
        total_traded_volume: cols.total_traded_volume,
    }
}
