use super::config;
use super::index_stats::IndexStats;
use super::models::OptionContract;
use serde::Serialize;
use std::collections::BTreeSet;

// -----------------------------------------------
// NARRATIVE TEXTS
// -----------------------------------------------
pub const VALUATION_UNAVAILABLE: &str = "Valuation data unavailable.";
pub const BREADTH_UNAVAILABLE: &str = "Market breadth data unavailable.";
pub const BUYING_INTEREST_UNAVAILABLE: &str = "Buying interest data unavailable.";

const PE_HIGH: &str = "PE ratio is high, suggesting overvaluation.";
const PE_LOW: &str = "PE ratio is low, suggesting undervaluation.";
const PE_NORMAL: &str = "PE ratio is within normal range.";
const PE_INVALID: &str = "PE ratio data not available or invalid.";

/// Texts of a three-way advancing/declining split
struct SplitTexts {
    advancing: &'static str,
    declining: &'static str,
    balanced: &'static str,
    missing: &'static str,
}

const BREADTH_TEXTS: SplitTexts = SplitTexts {
    advancing: "Majority of stocks are advancing (Bullish sentiment).",
    declining: "Majority of stocks are declining (Bearish sentiment).",
    balanced: "Mixed sentiment across market breadth.",
    missing: "Market breadth data not available.",
};

const TURNOVER_TEXTS: SplitTexts = SplitTexts {
    advancing: "Turnover concentrated in advancing stocks (Strong Buying Interest).",
    declining: "Turnover concentrated in declining stocks (Strong Selling Interest).",
    balanced: "Turnover is balanced across advancing and declining stocks.",
    missing: "Turnover data not available.",
};

/// Index-level narratives plus per-contract signal buckets.
///
/// Buckets hold `"{strike} {side}"` keys, unique and sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alerts {
    pub fair_valuation: String,
    pub market_breadth: String,
    pub buying_interest: String,
    pub momentum: BTreeSet<String>,
    pub unwinding: BTreeSet<String>,
    pub fresh_longs: BTreeSet<String>,
    pub buyer_dominance: BTreeSet<String>,
    pub seller_dominance: BTreeSet<String>,
}

impl Default for Alerts {
    fn default() -> Self {
        Self {
            fair_valuation: VALUATION_UNAVAILABLE.to_string(),
            market_breadth: BREADTH_UNAVAILABLE.to_string(),
            buying_interest: BUYING_INTEREST_UNAVAILABLE.to_string(),
            momentum: BTreeSet::new(),
            unwinding: BTreeSet::new(),
            fresh_longs: BTreeSet::new(),
            buyer_dominance: BTreeSet::new(),
            seller_dominance: BTreeSet::new(),
        }
    }
}

impl Alerts {
    pub fn signal_count(&self) -> usize {
        self.momentum.len()
            + self.unwinding.len()
            + self.fresh_longs.len()
            + self.buyer_dominance.len()
            + self.seller_dominance.len()
    }
}

/// Run every rule. An empty stats row leaves the narratives untouched and an
/// empty contract table leaves the buckets empty; neither affects the other.
pub fn generate_alerts(stats: &IndexStats, contracts: &[OptionContract]) -> Alerts {
    let mut alerts = Alerts::default();

    if !stats.is_empty() {
        alerts.fair_valuation = valuation_narrative(stats.pe_ratio()).to_string();
        alerts.market_breadth =
            split_narrative(stats.advances(), stats.declines(), &BREADTH_TEXTS).to_string();
        alerts.buying_interest = split_narrative(
            stats.advance_turnover(),
            stats.decline_turnover(),
            &TURNOVER_TEXTS,
        )
        .to_string();
    }

    for contract in contracts {
        check_contract_rules(contract, &mut alerts);
    }

    alerts
}

/// Bucket a single contract
pub fn check_contract_rules(c: &OptionContract, alerts: &mut Alerts) {
    let key = c.alert_key();

    // Rule 1: big move in premium, either direction
    if c.percent_change.abs() > config::MOMENTUM_PCHANGE {
        alerts.momentum.insert(key.clone());
    }

    // Rule 2: large open interest being unwound or freshly built
    if c.open_interest > config::OI_FLOOR && c.change_in_open_interest < -config::COI_SWING {
        alerts.unwinding.insert(key.clone());
    } else if c.open_interest > config::OI_FLOOR && c.change_in_open_interest > config::COI_SWING {
        alerts.fresh_longs.insert(key.clone());
    }

    // Rule 3: one side of the order book dominating
    let tbq = c.total_buy_quantity;
    let tsq = c.total_sell_quantity;
    if tsq > 0.0 && tbq > tsq * config::DOMINANCE_RATIO && tbq > config::DOMINANCE_MIN_QTY {
        alerts.buyer_dominance.insert(key);
    } else if tbq > 0.0 && tsq > tbq * config::DOMINANCE_RATIO && tsq > config::DOMINANCE_MIN_QTY {
        alerts.seller_dominance.insert(key);
    }
}

pub fn valuation_narrative(pe: f64) -> &'static str {
    if pe > config::PE_OVERVALUED {
        PE_HIGH
    } else if pe > 0.0 && pe < config::PE_UNDERVALUED {
        PE_LOW
    } else if pe > 0.0 {
        PE_NORMAL
    } else {
        PE_INVALID
    }
}

fn split_narrative(advancing: f64, declining: f64, texts: &SplitTexts) -> &'static str {
    let total = advancing + declining;
    if total <= 0.0 {
        texts.missing
    } else if advancing / total > config::BREADTH_MAJORITY {
        texts.advancing
    } else if declining / total > config::BREADTH_MAJORITY {
        texts.declining
    } else {
        texts.balanced
    }
}
