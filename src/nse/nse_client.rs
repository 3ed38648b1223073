use super::config::{self, ClientSettings};
use super::dashboard::DashboardInputs;
use super::expiry::{format_expiry, parse_expiry, resolve_nearest_expiry};
use super::models::{ActiveContractsPayload, OptionChainPayload, TabularPayload};
use super::normalize::Row;
use super::session::NseSession;
use crate::error::NSEError;
use crate::utility::timing::Timer;
use chrono::Local;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

// -----------------------------------------------
// CLIENT WRAPPER WITH SESSION STATE
// -----------------------------------------------
pub struct NSEClient {
    session: Arc<NseSession>,
    settings: ClientSettings,
}

impl NSEClient {
    /// Client configured from the environment
    pub fn new() -> Self {
        Self::with_settings(ClientSettings::from_env())
    }

    pub fn with_settings(settings: ClientSettings) -> Self {
        Self {
            session: Arc::new(NseSession::new(settings.clone())),
            settings,
        }
    }

    pub fn session(&self) -> &Arc<NseSession> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// GET with retries, returning the raw JSON text
    async fn fetch_text(&self, url: &str) -> Result<String, NSEError> {
        let backoff = ExponentialBackoff::from_millis(self.settings.retry_base_delay_ms)
            .factor(self.settings.retry_factor)
            .max_delay(self.settings.retry_max_delay)
            .take(self.settings.retry_max_attempts);

        Retry::spawn(backoff, || async {
            let client = self.session.get_or_refresh().await?;
            let res = client
                .get(url)
                .header("Referer", config::HEADER_REFERER)
                .header("X-Requested-With", config::HEADER_X_REQUESTED_WITH)
                .send()
                .await?;

            let status = res.status();
            if !status.is_success() {
                warn!(url, status = status.as_u16(), "Upstream returned an error status");
                return Err(NSEError::Unreachable(format!("{} returned {}", url, status)));
            }

            let text = res.text().await?;
            let trimmed = text.trim_start();
            if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
                let preview: String = trimmed.chars().take(200).collect();
                warn!(url, "Non-JSON response from upstream");
                return Err(NSEError::InvalidData(format!("Non-JSON response: {}", preview)));
            }

            Ok(text)
        })
        .await
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, NSEError> {
        let text = self.fetch_text(url).await?;
        let parsed = serde_json::from_str(&text)?;
        debug!(url, bytes = text.len(), "Fetched upstream payload");
        Ok(parsed)
    }

    // -----------------------------------------------
    // OPTION CHAIN & INDEX TRACKER
    // -----------------------------------------------

    pub async fn fetch_option_chain(
        &self,
        expiry: Option<&str>,
    ) -> Result<OptionChainPayload, NSEError> {
        self.fetch_json(&config::option_chain_url(self.base_url(), expiry))
            .await
    }

    pub async fn fetch_index_data(&self) -> Result<TabularPayload, NSEError> {
        self.fetch_json(&config::index_data_url(self.base_url())).await
    }

    pub async fn fetch_advance_decline(&self) -> Result<TabularPayload, NSEError> {
        self.fetch_json(&config::advance_decline_url(self.base_url()))
            .await
    }

    pub async fn fetch_most_active_contracts(&self) -> Result<ActiveContractsPayload, NSEError> {
        self.fetch_json(&config::most_active_contracts_url(self.base_url()))
            .await
    }

    // -----------------------------------------------
    // SNAPSHOTS
    // -----------------------------------------------

    pub async fn fetch_large_deals(&self) -> Result<Row, NSEError> {
        self.fetch_json(&format!("{}{}", self.base_url(), config::PATH_LARGE_DEALS))
            .await
    }

    pub async fn fetch_volume_gainers(&self) -> Result<TabularPayload, NSEError> {
        self.fetch_json(&format!("{}{}", self.base_url(), config::PATH_VOLUME_GAINERS))
            .await
    }

    pub async fn fetch_most_active_securities(&self) -> Result<TabularPayload, NSEError> {
        self.fetch_json(&config::most_active_securities_url(self.base_url()))
            .await
    }

    pub async fn fetch_corporates_pit(&self) -> Result<Row, NSEError> {
        self.fetch_json(&format!("{}{}", self.base_url(), config::PATH_CORPORATES_PIT))
            .await
    }

    // -----------------------------------------------
    // DASHBOARD FETCH SEQUENCE
    // -----------------------------------------------

    /// Resolve the nearest expiry from the chain listing, then fetch the chain
    /// for that expiry. A failed listing falls back to the next Tuesday; a
    /// failed chain fetch is returned as the error.
    pub async fn fetch_nearest_chain(&self) -> Result<(OptionChainPayload, String), NSEError> {
        let listing = self.fetch_option_chain(None).await;
        if let Err(e) = &listing {
            warn!(error = %e, "Expiry listing unavailable, falling back to next Tuesday");
        }

        let nearest = resolve_nearest_expiry(listing.as_ref().ok(), Local::now().date_naive());
        info!(expiry = %nearest, "Nearest expiry resolved");

        let expiry_param = parse_expiry(&nearest).map(format_expiry);
        if expiry_param.is_none() {
            warn!(expiry = %nearest, "Unparseable expiry, fetching chain without it");
        }

        let chain = self.fetch_option_chain(expiry_param.as_deref()).await?;
        Ok((chain, nearest))
    }

    /// Every payload `/nifty/data` needs
    pub async fn fetch_dashboard_inputs(&self) -> Result<DashboardInputs, NSEError> {
        let timer = Timer::start("dashboard fetch");

        let (chain, index_data, advance_decline, active_contracts) = futures::join!(
            self.fetch_nearest_chain(),
            self.fetch_index_data(),
            self.fetch_advance_decline(),
            self.fetch_most_active_contracts(),
        );
        let (chain, nearest_expiry) = chain?;

        let (large_deals, volume_gainers, most_active_securities, corporates_pit) = futures::join!(
            self.fetch_large_deals(),
            self.fetch_volume_gainers(),
            self.fetch_most_active_securities(),
            self.fetch_corporates_pit(),
        );

        timer.stop();

        Ok(DashboardInputs {
            chain,
            nearest_expiry,
            index_data,
            advance_decline,
            active_contracts,
            large_deals,
            volume_gainers,
            most_active_securities,
            corporates_pit,
        })
    }
}

impl Default for NSEClient {
    fn default() -> Self {
        Self::new()
    }
}

