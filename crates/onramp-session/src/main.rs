//! Onramp session service: exchanges a list of destination addresses for a
//! single-use provider session token.
//!
//! On each `POST /api/session` request it:
//!
//! 1. Validates every (address, blockchain) pair locally.
//! 2. Signs a short-lived request JWT scoped to the provider token endpoint.
//! 3. Forwards `{addresses, assets}` to the provider and returns the token.

mod config;
mod error;
mod jwt;
mod provider;

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::routing::post;
use onramp_models::{SESSION_PATH, SessionTokenRequest, SessionTokenResponse};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::SessionError;

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// State shared across all Axum handlers.
struct AppState {
    /// Provider endpoint and credential.
    config: AppConfig,
    /// Pooled HTTP client for provider calls.
    http: reqwest::Client,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /api/session`: issue a provider session token.
async fn create_session_token(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SessionTokenRequest>, JsonRejection>,
) -> Result<Json<SessionTokenResponse>, SessionError> {
    // 1. Credential must be configured
    let credential = state
        .config
        .credential
        .as_ref()
        .ok_or(SessionError::MissingCredentials)?;

    // 2. Body shape
    let Json(mut req) = body.map_err(|e| SessionError::InvalidBody(e.body_text()))?;
    if req.addresses.is_empty() {
        return Err(SessionError::MissingAddresses {
            legacy_shape: req.wallet_address.is_some(),
        });
    }

    // 3. Every address against every declared network
    for entry in &mut req.addresses {
        entry.normalize();
        entry.check().map_err(SessionError::InvalidAddress)?;
    }

    info!(
        addresses = req.addresses.len(),
        assets = req.assets.as_ref().map_or(0, Vec::len),
        "session token requested"
    );

    // 4. Sign the request JWT
    let provider = &state.config.provider;
    let jwt = jwt::sign_request_jwt(
        credential,
        "POST",
        &provider.request_host(),
        &provider.request_path(),
        jwt::REQUEST_JWT_TTL_SECS,
    )?;

    // 5. Exchange it for a session token
    let response = provider::request_session_token(&state.http, provider, &jwt, &req).await?;

    info!(
        channel = response.channel_id.is_some(),
        "session token issued"
    );

    Ok(Json(response))
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(SESSION_PATH, post(create_session_token))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env().expect("invalid PROVIDER_API_URL");

    match &config.credential {
        Some(credential) => info!(key_id = %credential.key_id, "provider credential loaded"),
        None => warn!("KEY_NAME / KEY_SECRET not set; session requests will fail"),
    }
    info!(token_url = %config.provider.token_url(), "provider endpoint configured");

    let listen_port = config.listen_port;

    let state = Arc::new(AppState {
        config,
        http: reqwest::Client::new(),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{listen_port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    info!(address = %addr, "session service listening");
    axum::serve(listener, app).await.expect("server error");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::http::{HeaderMap, StatusCode};
    use axum_test::TestServer;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::{Value, json};
    use url::Url;

    use super::*;
    use crate::config::{DEFAULT_TOKEN_PATH, ProviderConfig};
    use crate::jwt::tests::ed25519_credential;

    const EVM: &str = "0x742d35Cc6634C0532925a3b8D96cF1B8FdB1f3b4";
    const SOLANA: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    /// One request as seen by the mock provider.
    struct ProviderCall {
        authorization: Option<String>,
        accept: Option<String>,
        body: Value,
    }

    type Calls = Arc<Mutex<Vec<ProviderCall>>>;

    /// Spawn a throwaway provider answering every token request with
    /// `status` and `body`. Returns its base URL and the call log.
    async fn spawn_provider(status: StatusCode, body: &'static str) -> (Url, Calls) {
        spawn_provider_at(DEFAULT_TOKEN_PATH, status, body).await
    }

    async fn spawn_provider_at(
        path: &str,
        status: StatusCode,
        body: &'static str,
    ) -> (Url, Calls) {
        let calls: Calls = Arc::default();
        let log = calls.clone();

        let app = Router::new().route(
            path,
            post(move |headers: HeaderMap, Json(body_in): Json<Value>| {
                let log = log.clone();
                async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string)
                    };
                    log.lock().unwrap().push(ProviderCall {
                        authorization: header("authorization"),
                        accept: header("accept"),
                        body: body_in,
                    });
                    (status, body)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (Url::parse(&format!("http://{addr}")).unwrap(), calls)
    }

    fn test_server(api_url: Url, with_credential: bool) -> TestServer {
        let config = AppConfig {
            provider: ProviderConfig {
                api_url,
                token_path: DEFAULT_TOKEN_PATH.to_string(),
            },
            credential: with_credential.then(ed25519_credential),
            listen_port: 0,
        };
        let state = Arc::new(AppState {
            config,
            http: reqwest::Client::new(),
        });
        TestServer::new(router(state)).unwrap()
    }

    fn evm_request() -> Value {
        json!({ "addresses": [{ "address": EVM, "blockchains": ["ethereum", "base"] }] })
    }

    #[tokio::test]
    async fn issues_token_from_nested_envelope() {
        let (url, calls) = spawn_provider(
            StatusCode::OK,
            r#"{"data":{"token":"T-123","channel_id":"chan-1"}}"#,
        )
        .await;
        let server = test_server(url.clone(), true);

        let res = server
            .post(SESSION_PATH)
            .json(&json!({
                "addresses": [{ "address": EVM, "blockchains": ["ethereum", "base"] }],
                "assets": ["ETH", "USDC"],
            }))
            .await;

        res.assert_status_ok();
        let body: Value = res.json();
        assert_eq!(body, json!({ "token": "T-123", "channel_id": "chan-1" }));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert!(call.authorization.as_deref().unwrap().starts_with("Bearer "));
        assert_eq!(call.accept.as_deref(), Some("application/json"));
        assert_eq!(
            call.body,
            json!({
                "addresses": [{ "address": EVM, "blockchains": ["ethereum", "base"] }],
                "assets": ["ETH", "USDC"],
            })
        );
    }

    #[tokio::test]
    async fn bearer_jwt_is_scoped_to_provider_endpoint() {
        let (url, calls) = spawn_provider(StatusCode::OK, r#"{"token":"T"}"#).await;
        let host = format!("{}:{}", url.host_str().unwrap(), url.port().unwrap());
        let server = test_server(url, true);

        server.post(SESSION_PATH).json(&evm_request()).await.assert_status_ok();

        let calls = calls.lock().unwrap();
        let auth = calls[0].authorization.as_deref().unwrap();
        let jwt = auth.strip_prefix("Bearer ").unwrap();
        let claims: Value = serde_json::from_slice(
            &URL_SAFE_NO_PAD.decode(jwt.split('.').nth(1).unwrap()).unwrap(),
        )
        .unwrap();
        assert_eq!(claims["uris"], json!([format!("POST {host}/onramp/v1/token")]));
        assert_eq!(claims["sub"], ed25519_credential().key_id.as_str());
        // Assets omitted when the client sent none.
        assert!(calls[0].body.get("assets").is_none());
    }

    #[tokio::test]
    async fn padded_address_is_forwarded_trimmed() {
        let (url, calls) = spawn_provider(StatusCode::OK, r#"{"token":"T"}"#).await;
        let server = test_server(url, true);

        server
            .post(SESSION_PATH)
            .json(&json!({ "addresses": [{ "address": format!(" {EVM}\t"), "blockchains": ["base "] }] }))
            .await
            .assert_status_ok();

        assert_eq!(
            calls.lock().unwrap()[0].body["addresses"],
            json!([{ "address": EVM, "blockchains": ["base"] }])
        );
    }

    #[tokio::test]
    async fn provider_base_path_is_included_in_jwt_scope() {
        let (url, calls) =
            spawn_provider_at("/cdp/onramp/v1/token", StatusCode::OK, r#"{"token":"T"}"#).await;
        let host = format!("{}:{}", url.host_str().unwrap(), url.port().unwrap());
        let server = test_server(url.join("/cdp/").unwrap(), true);

        server.post(SESSION_PATH).json(&evm_request()).await.assert_status_ok();

        let calls = calls.lock().unwrap();
        let jwt = calls[0]
            .authorization
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap();
        let claims: Value = serde_json::from_slice(
            &URL_SAFE_NO_PAD.decode(jwt.split('.').nth(1).unwrap()).unwrap(),
        )
        .unwrap();
        assert_eq!(claims["uris"], json!([format!("POST {host}/cdp/onramp/v1/token")]));
    }

    #[tokio::test]
    async fn flat_envelope_without_channel() {
        let (url, _) = spawn_provider(StatusCode::OK, r#"{"token":"flat"}"#).await;
        let server = test_server(url, true);

        let res = server.post(SESSION_PATH).json(&evm_request()).await;

        res.assert_status_ok();
        assert_eq!(res.json::<Value>(), json!({ "token": "flat" }));
    }

    #[tokio::test]
    async fn mismatched_address_never_reaches_provider() {
        let (url, calls) = spawn_provider(StatusCode::OK, r#"{"token":"T"}"#).await;
        let server = test_server(url, true);

        let res = server
            .post(SESSION_PATH)
            .json(&json!({ "addresses": [{ "address": SOLANA, "blockchains": ["ethereum"] }] }))
            .await;

        res.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = res.json();
        assert_eq!(body["details"]["address"], SOLANA);
        assert_eq!(body["details"]["blockchain"], "ethereum");
        assert!(!body["details"]["suggestion"].as_str().unwrap().is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_is_a_server_error() {
        let (url, calls) = spawn_provider(StatusCode::OK, r#"{"token":"T"}"#).await;
        let server = test_server(url, false);

        let res = server.post(SESSION_PATH).json(&evm_request()).await;

        res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .starts_with("Missing provider API credentials"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_and_retired_shapes_are_rejected() {
        let (url, calls) = spawn_provider(StatusCode::OK, r#"{"token":"T"}"#).await;
        let server = test_server(url, true);

        let res = server.post(SESSION_PATH).json(&json!({ "addresses": [] })).await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "Addresses parameter is required");

        let res = server
            .post(SESSION_PATH)
            .json(&json!({ "walletAddress": EVM }))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert!(res.json::<Value>()["details"]
            .as_str()
            .unwrap()
            .contains("walletAddress"));

        let res = server
            .post(SESSION_PATH)
            .json(&json!({ "addresses": [{ "address": EVM, "blockchains": [] }] }))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            res.json::<Value>()["details"]["reason"],
            "At least one blockchain is required"
        );

        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (url, _) = spawn_provider(StatusCode::OK, r#"{"token":"T"}"#).await;
        let server = test_server(url, true);

        let res = server
            .post(SESSION_PATH)
            .text("{not json")
            .content_type("application/json")
            .await;

        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn provider_unauthorized_maps_to_401() {
        let (url, _) = spawn_provider(
            StatusCode::UNAUTHORIZED,
            r#"{"errorMessage":"invalid jwt"}"#,
        )
        .await;
        let server = test_server(url, true);

        let res = server.post(SESSION_PATH).json(&evm_request()).await;

        res.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = res.json();
        assert_eq!(body["error"], "Authentication failed");
        assert_eq!(body["apiError"]["errorMessage"], "invalid jwt");
    }

    #[tokio::test]
    async fn other_provider_statuses_pass_through() {
        let (url, _) = spawn_provider(StatusCode::TOO_MANY_REQUESTS, "rate limited").await;
        let server = test_server(url, true);

        let res = server.post(SESSION_PATH).json(&evm_request()).await;

        res.assert_status(StatusCode::TOO_MANY_REQUESTS);
        let body: Value = res.json();
        assert_eq!(body["error"], "Provider API error: 429");
        assert_eq!(body["details"], "rate limited");
    }

    #[tokio::test]
    async fn unreadable_success_body_is_a_server_error() {
        let (url, _) = spawn_provider(StatusCode::OK, "<html>maintenance</html>").await;
        let server = test_server(url, true);

        let res = server.post(SESSION_PATH).json(&evm_request()).await;

        res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.json::<Value>()["error"],
            "Invalid response from provider API"
        );
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_server_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let server = test_server(Url::parse(&format!("http://{addr}")).unwrap(), true);

        let res = server.post(SESSION_PATH).json(&evm_request()).await;

        res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.json::<Value>()["error"],
            "Failed to generate session token"
        );
    }
}
