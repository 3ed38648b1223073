use super::config::{self, ClientSettings};
use crate::error::NSEError;
use crate::utility::timing::Timer;
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{Client, header};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Warmups faster than this are not logged
const WARMUP_LOG_THRESHOLD_MS: u128 = 1000;

struct WarmClient {
    client: Client,
    warmed_at: Instant,
}

// -----------------------------------------------
// COOKIE-CARRYING SESSION
// -----------------------------------------------

/// NSE only answers API calls that carry the cookies handed out by its web
/// pages. The session keeps one warmed client and replaces it once it is
/// older than the refresh interval.
pub struct NseSession {
    settings: ClientSettings,
    current: RwLock<Option<WarmClient>>,
}

impl NseSession {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            current: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn is_fresh(&self, warm: &WarmClient) -> bool {
        warm.warmed_at.elapsed() < self.settings.session_refresh
    }

    /// Current client, warming a new one when none exists or it went stale.
    ///
    /// A failed refresh falls back to the stale client; only a failure with
    /// no client at all is an error.
    pub async fn get_or_refresh(&self) -> Result<Client, NSEError> {
        {
            let current = self.current.read().await;
            if let Some(warm) = current.as_ref().filter(|w| self.is_fresh(w)) {
                return Ok(warm.client.clone());
            }
        }

        let mut current = self.current.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(warm) = current.as_ref().filter(|w| self.is_fresh(w)) {
            return Ok(warm.client.clone());
        }

        info!("Refreshing NSE session cookies");
        match self.warm_new_client().await {
            Ok(client) => {
                *current = Some(WarmClient {
                    client: client.clone(),
                    warmed_at: Instant::now(),
                });
                info!("NSE session refreshed");
                Ok(client)
            }
            Err(e) => match current.as_ref() {
                Some(stale) => {
                    warn!(error = %e, "Session refresh failed, reusing stale session");
                    Ok(stale.client.clone())
                }
                None => Err(NSEError::Unreachable(format!(
                    "Could not establish initial connection to NSE: {}",
                    e
                ))),
            },
        }
    }

    /// Age of the current client, `None` before the first warmup
    pub async fn age(&self) -> Option<Duration> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|w| w.warmed_at.elapsed())
    }

    async fn warm_new_client(&self) -> Result<Client, NSEError> {
        let _timer = Timer::start_with_threshold("session warmup", WARMUP_LOG_THRESHOLD_MS);
        let client = build_client(&self.settings)?;
        let base = &self.settings.base_url;

        let origin = client
            .get(format!("{}{}", base, config::PATH_ORIGIN_PAGE))
            .header(header::ACCEPT, config::HEADER_ACCEPT_HTML)
            .send()
            .await?;
        debug!(status = %origin.status(), "Origin page visited");

        let api = client.get(config::index_data_url(base)).send().await?;
        debug!(status = %api.status(), "Index data endpoint visited");

        if !self.settings.warmup_delay.is_zero() {
            tokio::time::sleep(self.settings.warmup_delay).await;
        }

        Ok(client)
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
pub fn build_client(settings: &ClientSettings) -> Result<Client, NSEError> {
    let mut headers = header::HeaderMap::new();

    let lang = config::ACCEPT_LANGUAGES
        .choose(&mut thread_rng())
        .copied()
        .unwrap_or(config::ACCEPT_LANGUAGES[0]);
    headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_static(lang));
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));

    Ok(Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .gzip(true)
        .user_agent(config::USER_AGENT)
        .timeout(settings.http_timeout)
        .build()?)
}
