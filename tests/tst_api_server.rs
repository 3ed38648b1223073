use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use httpmock::prelude::*;
use nifty_pulse::api_server_axum::router;
use nifty_pulse::nse::{ClientSettings, NSEClient};
use std::sync::Arc;
use tower::ServiceExt;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn app(base_url: &str) -> axum::Router {
        router(Arc::new(NSEClient::with_settings(ClientSettings::for_base_url(base_url))))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(app("http://127.0.0.1:1"), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["session_age_secs"], Value::Null);
    }

    #[tokio::test]
    async fn test_nifty_data_with_chain_only() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/option-chain-v3");
                then.status(200).json_body(json!({
                    "records": {"expiryDates": ["02-Sep-2025"], "underlyingValue": 21105.5},
                    "filtered": {"data": [
                        {"strikePrice": 21000, "CE": {"expiryDate": "02-Sep-2025", "pChange": 30}}
                    ]}
                }));
            })
            .await;

        let (status, body) = get(app(&server.base_url()), "/nifty/data").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        let data = &body["data"];
        assert_eq!(data["nearestExpiry"], json!("02-Sep-2025"));
        assert_eq!(data["alerts"]["momentum"], json!(["21000 CE"]));
        assert_eq!(data["sourceErrors"].as_array().map(Vec::len), Some(7));
        assert!(data["largeDeals"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_503() {
        let (status, body) = get(app("http://127.0.0.1:1"), "/nifty/data").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_non_json_upstream_is_502() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/corporates-pit");
                then.status(200).body("<html>Resource not found</html>");
            })
            .await;

        let (status, body) = get(app(&server.base_url()), "/nifty/insider-trades").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_snapshot_route() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/live-analysis-volume-gainers");
                then.status(200).json_body(json!({
                    "data": [
                        {"symbol": "LOW", "week1volChange": 1.1},
                        {"symbol": "HIGH", "week1volChange": "7.5"}
                    ],
                    "timestamp": "01-Sep-2025 15:30:00"
                }));
            })
            .await;

        let (status, body) = get(app(&server.base_url()), "/nifty/volume-gainers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["summary"]["topSymbol"], json!("HIGH"));
        assert_eq!(body["data"]["volumeGainers"][0]["week1volChange"], json!(7.5));
        assert!(body["processing_time_ms"].is_u64());
    }
}
