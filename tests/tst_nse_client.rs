use httpmock::prelude::*;
use nifty_pulse::NSEError;
use nifty_pulse::nse::{ClientSettings, NSEClient};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::time::Duration;

    const TRACKER: &str = "/api/NextApi/apiClient/indexTrackerApi";
    const NEAREST: &str = "02-Sep-2025";

    fn chain_body() -> Value {
        json!({
            "records": {
                "timestamp": "01-Sep-2025 15:30:00",
                "underlyingValue": 21105.5,
                "expiryDates": [NEAREST, "09-Sep-2025"]
            },
            "filtered": {"data": [
                {
                    "strikePrice": 21000,
                    "CE": {"expiryDate": NEAREST, "openInterest": 120000, "changeinOpenInterest": 15000},
                    "PE": {"expiryDate": NEAREST, "openInterest": 60000}
                }
            ]}
        })
    }

    fn client_for(server: &MockServer) -> NSEClient {
        NSEClient::with_settings(ClientSettings::for_base_url(server.base_url()))
    }

    #[tokio::test]
    async fn test_session_warms_on_origin_page_first() {
        let server = MockServer::start_async().await;
        let origin = server
            .mock_async(|when, then| {
                when.method(GET).path("/market-data/most-active-contracts");
                then.status(200).body("<html></html>");
            })
            .await;
        let gainers = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/live-analysis-volume-gainers")
                    .header("x-requested-with", "XMLHttpRequest");
                then.status(200).json_body(json!({"data": [{"symbol": "ABC"}]}));
            })
            .await;

        let client = client_for(&server);
        assert!(client.session().age().await.is_none());

        let payload = client.fetch_volume_gainers().await.unwrap();
        assert_eq!(payload.data.len(), 1);

        // the warm session is reused
        client.fetch_volume_gainers().await.unwrap();

        origin.assert_hits_async(1).await;
        gainers.assert_hits_async(2).await;
        assert!(client.session().age().await.is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_warmed_again() {
        let server = MockServer::start_async().await;
        let origin = server
            .mock_async(|when, then| {
                when.method(GET).path("/market-data/most-active-contracts");
                then.status(200).body("<html></html>");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/corporates-pit");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;

        let settings = ClientSettings {
            session_refresh: Duration::ZERO,
            ..ClientSettings::for_base_url(server.base_url())
        };
        let client = NSEClient::with_settings(settings);

        client.fetch_corporates_pit().await.unwrap();
        client.fetch_corporates_pit().await.unwrap();

        origin.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/snapshot-capital-market-largedeal");
                then.status(200).body("<html>Access Denied</html>");
            })
            .await;

        let err = client_for(&server).fetch_large_deals().await.unwrap_err();
        assert!(matches!(err, NSEError::InvalidData(_)), "got {:?}", err);
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_invalid_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(TRACKER).query_param("functionName", "getIndexData");
                then.status(200).json_body(json!({"data": "not a table"}));
            })
            .await;

        let err = client_for(&server).fetch_index_data().await.unwrap_err();
        assert!(matches!(err, NSEError::InvalidData(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_error_status_is_unreachable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/live-analysis-most-active-securities");
                then.status(500);
            })
            .await;

        let err = client_for(&server)
            .fetch_most_active_securities()
            .await
            .unwrap_err();
        assert!(matches!(err, NSEError::Unreachable(_)), "got {:?}", err);
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn test_dashboard_inputs_end_to_end() {
        let server = MockServer::start_async().await;
        let chain = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/option-chain-v3")
                    .query_param("symbol", "NIFTY");
                then.status(200).json_body(chain_body());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(TRACKER).query_param("functionName", "getIndexData");
                then.status(200)
                    .json_body(json!({"data": [{"indexName": "NIFTY 50", "peRatio": 22.4}]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(TRACKER)
                    .query_param("functionName", "getMostActiveContracts");
                then.status(200).json_body(json!({
                    "mostActiveCall": [{"strikePrice": 21000, "optionType": "Call"}],
                    "mostActivePut": [],
                    "mostActiveContractbyOI": []
                }));
            })
            .await;

        let inputs = client_for(&server).fetch_dashboard_inputs().await.unwrap();

        // listing call plus the call for the resolved expiry
        chain.assert_hits_async(2).await;
        assert_eq!(inputs.nearest_expiry, NEAREST);
        assert_eq!(inputs.chain.filtered.data.len(), 1);
        assert_eq!(inputs.index_data.as_ref().unwrap().data.len(), 1);
        assert_eq!(inputs.active_contracts.as_ref().unwrap().calls.len(), 1);

        // no mock for these: the mock server answers 404
        assert!(matches!(inputs.advance_decline, Err(NSEError::Unreachable(_))));
        assert!(inputs.large_deals.is_err());
        assert!(inputs.corporates_pit.is_err());
    }

    #[tokio::test]
    async fn test_failed_chain_fails_the_dashboard() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/option-chain-v3");
                then.status(503);
            })
            .await;

        let err = client_for(&server).fetch_dashboard_inputs().await.unwrap_err();
        assert!(matches!(err, NSEError::Unreachable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_without_session() {
        let client = NSEClient::with_settings(ClientSettings::for_base_url("http://127.0.0.1:1"));

        let err = client.fetch_volume_gainers().await.unwrap_err();
        assert!(
            err.to_string().contains("Could not establish initial connection"),
            "got {}",
            err
        );
    }
}
