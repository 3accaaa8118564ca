//! HTTP client for the onramp session service.
//!
//! [`SessionClient`] talks to a running `onramp-session` instance and turns
//! its answers into typed results.
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use onramp_models::OnrampParams;
//! use onramp_sdk::SessionClient;
//!
//! # async fn run() -> Result<(), onramp_sdk::SdkError> {
//! let client = SessionClient::new("http://localhost:3001")?;
//! let link = client
//!     .create_onramp_link(&OnrampParams {
//!         address: Some("0x742d35Cc6634C0532925a3b8D96cF1B8FdB1f3b4".into()),
//!         network: Some("base".into()),
//!         asset: Some("USDC".into()),
//!         amount: Some("25".into()),
//!         ..OnrampParams::default()
//!     })
//!     .await?;
//!
//! println!("{link}");
//! # Ok(())
//! # }
//! ```

use onramp_models::{
    validation, AddressEntry, ErrorBody, OnrampParams, OnrampUrlBuilder, SessionTokenRequest,
    SessionTokenResponse, SESSION_PATH,
};
use tracing::debug;
use url::Url;

use crate::error::SdkError;

/// Client of one session service instance.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SessionClient {
    /// Create a client for the service at `base_url` (e.g.
    /// `http://localhost:3001`).
    pub fn new(base_url: &str) -> Result<Self, SdkError> {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Same as [`new`](Self::new), reusing an existing HTTP client.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self, SdkError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SdkError::Config(format!("invalid session service URL {base_url:?}: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// Full URL of the session endpoint.
    pub fn session_url(&self) -> String {
        format!(
            "{}{SESSION_PATH}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Request a session token scoped to the given addresses and assets.
    ///
    /// A non-success answer becomes [`SdkError::Api`] carrying the decoded
    /// error body; bodies that are not JSON are kept as the error text.
    pub async fn request_session_token(
        &self,
        request: &SessionTokenRequest,
    ) -> Result<SessionTokenResponse, SdkError> {
        let res = self
            .http
            .post(self.session_url())
            .json(request)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(ErrorBody {
                error: text,
                details: None,
                api_error: None,
            });
            return Err(SdkError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Validate the destination, fetch a session token for it and build the
    /// session-mode onramp URL.
    ///
    /// When `params.network` is absent it is inferred from the address.
    /// The token is scoped to `params.asset` when one is given.
    pub async fn create_onramp_link(&self, params: &OnrampParams) -> Result<String, SdkError> {
        let address = params.address.clone().unwrap_or_default();
        let network = params
            .network
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| validation::infer_network(&address).to_string());

        // Same check the service runs, without the round trip.
        let mut entry = AddressEntry::new(address, [network.clone()]);
        entry.normalize();
        entry.check().map_err(SdkError::Validation)?;

        let mut request = SessionTokenRequest::new(vec![entry]);
        if let Some(asset) = params.asset.as_ref().filter(|a| !a.trim().is_empty()) {
            request = request.with_assets([asset.clone()]);
        }

        let session = self.request_session_token(&request).await?;
        debug!(network = %network, "session token received");

        let url = OnrampUrlBuilder::with_session_token(session.token)
            .params(params.clone())
            .network(network)
            .build()?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    const EVM: &str = "0x742d35Cc6634C0532925a3b8D96cF1B8FdB1f3b4";
    const SOLANA: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    /// Bodies received by the fake session service.
    type Seen = Arc<Mutex<Vec<Value>>>;

    async fn spawn_service(status: StatusCode, body: &'static str) -> (SessionClient, Seen) {
        let seen: Seen = Arc::default();
        let log = seen.clone();

        let app = Router::new().route(
            SESSION_PATH,
            post(move |Json(body_in): Json<Value>| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(body_in);
                    (status, body)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = SessionClient::new(&format!("http://{addr}/")).unwrap();
        (client, seen)
    }

    #[test]
    fn session_url_joins_path() {
        let client = SessionClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.session_url(), "http://localhost:3001/api/session");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = SessionClient::new("localhost without scheme").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[tokio::test]
    async fn token_request_round_trip() {
        let (client, seen) =
            spawn_service(StatusCode::OK, r#"{"token":"T","channel_id":"c"}"#).await;

        let request = SessionTokenRequest::new(vec![AddressEntry::new(EVM, ["base"])])
            .with_assets(["USDC"]);
        let response = client.request_session_token(&request).await.unwrap();

        assert_eq!(response.token, "T");
        assert_eq!(response.channel_id.as_deref(), Some("c"));
        assert_eq!(
            seen.lock().unwrap()[0],
            json!({
                "addresses": [{ "address": EVM, "blockchains": ["base"] }],
                "assets": ["USDC"],
            })
        );
    }

    #[tokio::test]
    async fn structured_error_is_decoded() {
        let (client, _) = spawn_service(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Invalid address for network","details":{"address":"x","suggestion":"Expected: y"}}"#,
        )
        .await;

        let request = SessionTokenRequest::new(vec![AddressEntry::new("x", ["base"])]);
        let err = client.request_session_token(&request).await.unwrap_err();

        assert_eq!(err.suggestion(), Some("Expected: y"));
        match err {
            SdkError::Api { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body.error, "Invalid address for network");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_text_error_is_kept() {
        let (client, _) = spawn_service(StatusCode::BAD_GATEWAY, "upstream down").await;

        let request = SessionTokenRequest::new(vec![AddressEntry::new(EVM, ["base"])]);
        match client.request_session_token(&request).await.unwrap_err() {
            SdkError::Api { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.error, "upstream down");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn link_uses_session_token_and_hints() {
        let params = OnrampParams {
            address: Some(EVM.into()),
            network: Some("base".into()),
            asset: Some("USDC".into()),
            amount: Some("25".into()),
            ..OnrampParams::default()
        };

        let (client, seen) = spawn_service(StatusCode::OK, r#"{"token":"TOK"}"#).await;
        let link = client.create_onramp_link(&params).await.unwrap();

        let url = Url::parse(&link).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(query[0], ("sessionToken".into(), "TOK".into()));
        assert!(query.contains(&("defaultAsset".into(), "USDC".into())));
        assert!(query.contains(&("defaultNetwork".into(), "base".into())));
        assert!(query.contains(&("presetFiatAmount".into(), "25".into())));
        assert!(!query.iter().any(|(k, _)| k == "appId" || k == "addresses"));

        assert_eq!(
            seen.lock().unwrap()[0],
            json!({
                "addresses": [{ "address": EVM, "blockchains": ["base"] }],
                "assets": ["USDC"],
            })
        );
    }

    #[tokio::test]
    async fn link_infers_network_when_absent() {
        let (client, seen) = spawn_service(StatusCode::OK, r#"{"token":"TOK"}"#).await;

        let params = OnrampParams {
            address: Some(SOLANA.into()),
            ..OnrampParams::default()
        };
        client.create_onramp_link(&params).await.unwrap();

        assert_eq!(
            seen.lock().unwrap()[0]["addresses"][0]["blockchains"],
            json!(["solana"])
        );
    }

    #[tokio::test]
    async fn invalid_address_fails_before_any_request() {
        let (client, seen) = spawn_service(StatusCode::OK, r#"{"token":"TOK"}"#).await;

        let params = OnrampParams {
            address: Some(SOLANA.into()),
            network: Some("ethereum".into()),
            ..OnrampParams::default()
        };
        let err = client.create_onramp_link(&params).await.unwrap_err();

        assert!(matches!(err, SdkError::Validation(_)));
        assert!(err.suggestion().unwrap().contains("0x"));
        assert!(seen.lock().unwrap().is_empty());

        let err = client
            .create_onramp_link(&OnrampParams::default())
            .await
            .unwrap_err();
        match err {
            SdkError::Validation(rejection) => assert_eq!(rejection.reason, "Address is required"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
