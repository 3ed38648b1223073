use std::time::Duration;

// -----------------------------------------------
// NSE API ENDPOINTS
// -----------------------------------------------
pub const NSE_BASE_URL: &str = "https://www.nseindia.com";

/// Page visited first so NSE hands out the session cookies
pub const PATH_ORIGIN_PAGE: &str = "/market-data/most-active-contracts";

pub const PATH_INDEX_TRACKER: &str = "/api/NextApi/apiClient/indexTrackerApi";
pub const PATH_OPTION_CHAIN: &str = "/api/option-chain-v3";
pub const PATH_LARGE_DEALS: &str = "/api/snapshot-capital-market-largedeal";
pub const PATH_VOLUME_GAINERS: &str = "/api/live-analysis-volume-gainers";
pub const PATH_MOST_ACTIVE_SECURITIES: &str = "/api/live-analysis-most-active-securities";
pub const PATH_CORPORATES_PIT: &str = "/api/corporates-pit";

// -----------------------------------------------
// TRACKED INDEX
// -----------------------------------------------
pub const OPTION_CHAIN_SYMBOL: &str = "NIFTY";
pub const OPTION_CHAIN_TYPE: &str = "Indices";
pub const TRACKED_INDEX_NAME: &str = "NIFTY 50";

pub fn index_tracker_url(base: &str, function_name: &str, index: &str) -> String {
    format!(
        "{}{}?functionName={}&index={}",
        base,
        PATH_INDEX_TRACKER,
        function_name,
        urlencoding::encode(index)
    )
}

pub fn index_data_url(base: &str) -> String {
    index_tracker_url(base, "getIndexData", TRACKED_INDEX_NAME)
}

pub fn advance_decline_url(base: &str) -> String {
    index_tracker_url(base, "getAdvanceDecline", TRACKED_INDEX_NAME)
}

pub fn most_active_contracts_url(base: &str) -> String {
    index_tracker_url(base, "getMostActiveContracts", OPTION_CHAIN_SYMBOL)
}

/// Option chain URL; without an expiry NSE still returns the expiry list
pub fn option_chain_url(base: &str, expiry: Option<&str>) -> String {
    let mut url = format!(
        "{}{}?type={}&symbol={}",
        base,
        PATH_OPTION_CHAIN,
        OPTION_CHAIN_TYPE,
        urlencoding::encode(OPTION_CHAIN_SYMBOL)
    );
    if let Some(expiry) = expiry {
        url.push_str(&format!("&expiry={}", urlencoding::encode(expiry)));
    }
    url
}

pub fn most_active_securities_url(base: &str) -> String {
    format!("{}{}?index=value", base, PATH_MOST_ACTIVE_SECURITIES)
}

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9,hi;q=0.8",
    "en-GB,en;q=0.8",
    "en-IN,en;q=0.9",
];

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// -----------------------------------------------
// SESSION
// -----------------------------------------------
pub const SESSION_REFRESH_INTERVAL: Duration = Duration::from_secs(300);
pub const WARMUP_DELAY_MS: u64 = 200;

// -----------------------------------------------
// RETRY CONFIG
// -----------------------------------------------
pub const RETRY_BASE_DELAY_MS: u64 = 100;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 3;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// HTTP HEADERS
// -----------------------------------------------
pub const HEADER_REFERER: &str = "https://www.nseindia.com/";
pub const HEADER_X_REQUESTED_WITH: &str = "XMLHttpRequest";
pub const HEADER_ACCEPT_HTML: &str = "text/html";

// -----------------------------------------------
// ENRICHMENT & ALERT THRESHOLDS
// -----------------------------------------------

/// Quoted price floor for a contract with no trade
pub const MIN_TICK: f64 = 0.05;
pub const DISPLAY_UNAVAILABLE: &str = "-";
pub const EXPIRY_UNAVAILABLE: &str = "N/A";
pub const EXPIRY_FORMAT: &str = "%d-%b-%Y";

pub const MOMENTUM_PCHANGE: f64 = 20.0;
pub const OI_FLOOR: f64 = 50_000.0;
pub const COI_SWING: f64 = 10_000.0;
pub const DOMINANCE_RATIO: f64 = 1.5;
pub const DOMINANCE_MIN_QTY: f64 = 50_000.0;

pub const PE_OVERVALUED: f64 = 25.0;
pub const PE_UNDERVALUED: f64 = 15.0;
pub const BREADTH_MAJORITY: f64 = 0.75;

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Get the execution mode from environment or default to server
pub fn get_execution_mode() -> String {
    std::env::var("NSE_MODE").unwrap_or_else(|_| "server".to_string())
}

/// Upstream base URL, overridable for staging mirrors and tests
pub fn get_base_url() -> String {
    std::env::var("NSE_BASE_URL").unwrap_or_else(|_| NSE_BASE_URL.to_string())
}

pub fn get_session_refresh_interval() -> Duration {
    std::env::var("NSE_SESSION_REFRESH_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(SESSION_REFRESH_INTERVAL)
}

/// Output file for snapshot mode
pub fn get_output_file() -> String {
    std::env::var("NSE_OUTPUT_FILE").unwrap_or_else(|_| "nifty_dashboard.json".to_string())
}

/// Client-facing settings gathered in one place so tests can point at a mock server
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub session_refresh: Duration,
    pub http_timeout: Duration,
    pub warmup_delay: Duration,
    pub retry_base_delay_ms: u64,
    pub retry_factor: u64,
    pub retry_max_delay: Duration,
    pub retry_max_attempts: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: NSE_BASE_URL.to_string(),
            session_refresh: SESSION_REFRESH_INTERVAL,
            http_timeout: HTTP_TIMEOUT,
            warmup_delay: Duration::from_millis(WARMUP_DELAY_MS),
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
            retry_factor: RETRY_FACTOR,
            retry_max_delay: Duration::from_secs(RETRY_MAX_DELAY_SECS),
            retry_max_attempts: RETRY_MAX_ATTEMPTS,
        }
    }
}

impl ClientSettings {
    pub fn from_env() -> Self {
        Self {
            base_url: get_base_url(),
            session_refresh: get_session_refresh_interval(),
            ..Self::default()
        }
    }

    /// Settings for a local mock upstream: no warmup pause, a single attempt
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            warmup_delay: Duration::ZERO,
            retry_base_delay_ms: 1,
            retry_max_attempts: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_names_are_url_encoded() {
        assert_eq!(
            index_data_url("http://x"),
            "http://x/api/NextApi/apiClient/indexTrackerApi?functionName=getIndexData&index=NIFTY%2050"
        );
    }

    #[test]
    fn option_chain_url_appends_expiry_only_when_given() {
        assert_eq!(
            option_chain_url("http://x", None),
            "http://x/api/option-chain-v3?type=Indices&symbol=NIFTY"
        );
        assert_eq!(
            option_chain_url("http://x", Some("02-Sep-2025")),
            "http://x/api/option-chain-v3?type=Indices&symbol=NIFTY&expiry=02-Sep-2025"
        );
    }
}
