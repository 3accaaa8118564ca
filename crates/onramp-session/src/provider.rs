//! Provider session-token exchange.
//!
//! Forwards the scoped address/asset list to the provider's token endpoint
//! with a signed bearer JWT, and normalises whatever envelope the provider
//! answers with into a [`SessionTokenResponse`].

use onramp_models::{AddressEntry, SessionTokenRequest, SessionTokenResponse};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::SessionError;

/// Body sent to the provider: `{ addresses, assets? }`.
#[derive(Serialize)]
struct ProviderTokenRequest<'a> {
    addresses: &'a [AddressEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    assets: Option<&'a [String]>,
}

#[derive(Deserialize, Default)]
struct TokenPayload {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, alias = "channelId")]
    channel_id: Option<String>,
}

/// Provider answer: the payload either nested under `data` or at the top
/// level. Each field is taken from `data` when non-empty, else from the top.
#[derive(Deserialize)]
struct ProviderTokenResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(flatten)]
    top: TokenPayload,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Exchange a signed request JWT for a provider session token.
///
/// One attempt only: transport failures and non-success statuses are
/// returned to the caller as-is.
pub async fn request_session_token(
    http: &reqwest::Client,
    provider: &ProviderConfig,
    jwt: &str,
    request: &SessionTokenRequest,
) -> Result<SessionTokenResponse, SessionError> {
    let body = ProviderTokenRequest {
        addresses: &request.addresses,
        assets: request.assets.as_deref(),
    };

    let res = http
        .post(provider.token_url())
        .bearer_auth(jwt)
        .header(ACCEPT, "application/json")
        .json(&body)
        .send()
        .await?;

    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        return Err(rejection(status, &text));
    }

    normalize_response(&text)
}

/// Map a non-success provider answer to an error, singling out 401.
fn rejection(status: StatusCode, text: &str) -> SessionError {
    let details = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
    if status == StatusCode::UNAUTHORIZED {
        SessionError::ProviderAuth(details)
    } else {
        SessionError::ProviderRejected {
            status: status.as_u16(),
            details,
        }
    }
}

/// Extract the token from either known envelope. Anything else, including
/// an empty token, is an integration fault.
fn normalize_response(text: &str) -> Result<SessionTokenResponse, SessionError> {
    let invalid = || SessionError::InvalidProviderResponse(text.to_string());

    let response: ProviderTokenResponse = serde_json::from_str(text).map_err(|_| invalid())?;
    let nested: TokenPayload = response
        .data
        .and_then(|data| serde_json::from_value(data).ok())
        .unwrap_or_default();

    let token = non_empty(nested.token)
        .or_else(|| non_empty(response.top.token))
        .ok_or_else(invalid)?;
    let channel_id = non_empty(nested.channel_id).or_else(|| non_empty(response.top.channel_id));

    Ok(SessionTokenResponse { token, channel_id })
}
