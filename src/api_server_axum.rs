use crate::error::NSEError;
use crate::nse::NSEClient;
use crate::nse::dashboard::{Dashboard, assemble_dashboard};
use crate::nse::snapshots::{
    InsiderSnapshot, LargeDealsSnapshot, MostActiveSecuritiesSnapshot, VolumeGainersSnapshot,
    build_insider_snapshot, build_large_deals, build_most_active_securities,
    build_volume_gainers,
};
use crate::utility::timing::Timer;
use anyhow::Result;
use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

// -----------------------------------------------
// API RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub session_age_secs: Option<u64>,
}

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    client: Arc<NSEClient>,
}

impl AppState {
    pub fn new(client: Arc<NSEClient>) -> Self {
        Self { client }
    }
}

fn respond<T>(route: &str, timer: Timer, result: Result<T, NSEError>) -> ApiResult<T> {
    let processing_time_ms = Some(timer.elapsed_ms());
    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
                processing_time_ms,
            }),
        ),
        Err(e) => {
            error!(route, error = %e, "Request failed");
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
            (
                status,
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                }),
            )
        }
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /nifty/data - enriched most-active lists, chain details, alerts and snapshots
async fn get_nifty_data(State(app_state): State<AppState>) -> ApiResult<Dashboard> {
    let timer = Timer::silent("nifty data");
    let result = app_state
        .client
        .fetch_dashboard_inputs()
        .await
        .map(assemble_dashboard);
    respond("/nifty/data", timer, result)
}

/// GET /nifty/large-deals
async fn get_large_deals(State(app_state): State<AppState>) -> ApiResult<LargeDealsSnapshot> {
    let timer = Timer::silent("large deals");
    let result = app_state
        .client
        .fetch_large_deals()
        .await
        .map(|payload| build_large_deals(&payload));
    respond("/nifty/large-deals", timer, result)
}

/// GET /nifty/volume-gainers
async fn get_volume_gainers(
    State(app_state): State<AppState>,
) -> ApiResult<VolumeGainersSnapshot> {
    let timer = Timer::silent("volume gainers");
    let result = app_state
        .client
        .fetch_volume_gainers()
        .await
        .map(build_volume_gainers);
    respond("/nifty/volume-gainers", timer, result)
}

/// GET /nifty/most-active-securities
async fn get_most_active_securities(
    State(app_state): State<AppState>,
) -> ApiResult<MostActiveSecuritiesSnapshot> {
    let timer = Timer::silent("most active securities");
    let result = app_state
        .client
        .fetch_most_active_securities()
        .await
        .map(build_most_active_securities);
    respond("/nifty/most-active-securities", timer, result)
}

/// GET /nifty/insider-trades
async fn get_insider_trades(State(app_state): State<AppState>) -> ApiResult<InsiderSnapshot> {
    let timer = Timer::silent("insider trades");
    let result = app_state
        .client
        .fetch_corporates_pit()
        .await
        .map(|payload| build_insider_snapshot(&payload));
    respond("/nifty/insider-trades", timer, result)
}

/// GET /health - liveness plus the age of the upstream session
async fn get_health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let age = app_state.client.session().age().await;
    Json(HealthResponse {
        status: "ok",
        session_age_secs: age.map(|d| d.as_secs()),
    })
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn router(client: Arc<NSEClient>) -> Router {
    Router::new()
        .route("/nifty/data", get(get_nifty_data))
        .route("/nifty/large-deals", get(get_large_deals))
        .route("/nifty/volume-gainers", get(get_volume_gainers))
        .route("/nifty/most-active-securities", get(get_most_active_securities))
        .route("/nifty/insider-trades", get(get_insider_trades))
        .route("/health", get(get_health))
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(client))
}

pub async fn start_server(client: Arc<NSEClient>, port: u16) -> Result<()> {
    let app = router(client);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "NIFTY Options Pulse API server running");
    println!("🚀 NIFTY Options Pulse running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   GET  /nifty/data");
    println!("   GET  /nifty/large-deals");
    println!("   GET  /nifty/volume-gainers");
    println!("   GET  /nifty/most-active-securities");
    println!("   GET  /nifty/insider-trades");
    println!("   GET  /health");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}
