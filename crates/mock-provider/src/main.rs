use axum::{
    extract::Json,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

const TOKEN_PATH: &str = "/onramp/v1/token";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("MOCK_PROVIDER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4000);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind listener");
    info!(
        "mock provider listening; run the session service with PROVIDER_API_URL=http://localhost:{port}"
    );
    axum::serve(listener, app()).await.expect("server error");
}

fn app() -> Router {
    Router::new().route(TOKEN_PATH, post(token))
}

// --- Bearer JWT checks ---

#[derive(Debug, Deserialize)]
struct RequestClaims {
    sub: String,
    exp: u64,
    #[serde(default)]
    uris: Vec<String>,
}

fn decode_segment(segment: &str) -> Result<Value, String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| format!("bad base64url segment: {e}"))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("bad JSON segment: {e}"))
}

/// Structural checks only. The signature is not verified (no public key
/// here) and the host part of the scope is not compared, so the mock can
/// sit behind any name.
fn check_bearer(authorization: Option<&str>, now: u64) -> Result<RequestClaims, String> {
    let jwt = authorization
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or("missing bearer token")?;

    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 || parts[2].is_empty() {
        return Err("malformed JWT".into());
    }

    let header = decode_segment(parts[0])?;
    match header["alg"].as_str() {
        Some("EdDSA" | "ES256") => {}
        other => return Err(format!("unsupported alg {other:?}")),
    }
    if header["nonce"].as_str().map_or(true, str::is_empty) {
        return Err("missing nonce".into());
    }

    let claims: RequestClaims =
        serde_json::from_value(decode_segment(parts[1])?).map_err(|e| format!("bad claims: {e}"))?;
    if claims.exp <= now {
        return Err("token expired".into());
    }
    let scoped = match claims.uris.as_slice() {
        [uri] => uri
            .strip_prefix("POST ")
            .and_then(|rest| rest.strip_suffix(TOKEN_PATH))
            .is_some_and(|host| !host.is_empty() && !host.contains('/')),
        _ => false,
    };
    if !scoped {
        return Err(format!(
            "token scoped to {:?}, expected [\"POST <host>{TOKEN_PATH}\"]",
            claims.uris
        ));
    }

    Ok(claims)
}

fn unauthorized(reason: String) -> Response {
    warn!(%reason, "rejecting token request");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "errorType": "unauthorized", "errorMessage": reason })),
    )
        .into_response()
}

// --- Endpoint ---

async fn token(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = match check_bearer(authorization, now) {
        Ok(claims) => claims,
        Err(reason) => return unauthorized(reason),
    };

    let addresses = body["addresses"].as_array().map_or(0, Vec::len);
    if addresses == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errorType": "invalid_request", "errorMessage": "addresses is required" })),
        )
            .into_response();
    }

    info!(key = %claims.sub, addresses, "issuing session token");

    Json(json!({
        "data": {
            "token": uuid::Uuid::new_v4().to_string(),
            "channel_id": "mock-channel",
        }
    }))
    .into_response()
}
