//! Error types for the onramp session service.
//!
//! [`SessionError`] unifies all failure modes and implements
//! [`axum::response::IntoResponse`] so handlers can return
//! `Result<…, SessionError>` directly. Every variant becomes an
//! [`ErrorBody`] JSON document.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use onramp_models::{AddressRejection, ErrorBody};
use serde_json::Value;

/// Errors that can occur while issuing a session token.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No provider credential is configured.
    #[error("missing provider API credentials")]
    MissingCredentials,

    /// The request body is not valid JSON of the expected shape.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The request carries no addresses. `legacy_shape` is set when it used
    /// the retired `walletAddress` field instead.
    #[error("addresses parameter is required")]
    MissingAddresses {
        /// Whether the retired single-address shape was used.
        legacy_shape: bool,
    },

    /// An address does not match one of its declared networks.
    #[error("invalid address for {:?}: {}", .0.blockchain, .0.reason)]
    InvalidAddress(AddressRejection),

    /// The request JWT could not be built (bad key material, clock error).
    #[error("failed to generate JWT: {0}")]
    JwtGeneration(String),

    /// The provider refused our signed request (HTTP 401).
    #[error("provider rejected the API credentials")]
    ProviderAuth(Value),

    /// The provider answered with any other non-success status.
    #[error("provider API error: {status}")]
    ProviderRejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider body, as JSON when it parsed, as a string otherwise.
        details: Value,
    },

    /// The provider answered 2xx with a body we cannot interpret.
    #[error("invalid response from provider API")]
    InvalidProviderResponse(String),

    /// The HTTP call to the provider failed at the transport level.
    #[error("failed to reach provider API: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON (de)serialisation error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::MissingAddresses { .. } | Self::InvalidAddress(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ProviderAuth(_) => StatusCode::UNAUTHORIZED,
            Self::ProviderRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::MissingCredentials
            | Self::JwtGeneration(_)
            | Self::InvalidProviderResponse(_)
            | Self::HttpError(_)
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        let body = |error: &str, details: Option<Value>| ErrorBody {
            error: error.to_string(),
            details,
            api_error: None,
        };

        match self {
            Self::MissingCredentials => body(
                "Missing provider API credentials. Please set KEY_NAME and KEY_SECRET environment variables.",
                None,
            ),
            Self::InvalidBody(reason) => body("Invalid request body", Some(Value::String(reason))),
            Self::MissingAddresses { legacy_shape } => body(
                "Addresses parameter is required",
                legacy_shape.then(|| {
                    Value::String(
                        "walletAddress is no longer supported; send addresses: [{ address, blockchains }]"
                            .into(),
                    )
                }),
            ),
            Self::InvalidAddress(rejection) => body(
                "Invalid address for network",
                serde_json::to_value(rejection).ok(),
            ),
            Self::JwtGeneration(reason) => {
                body("Failed to generate JWT token", Some(Value::String(reason)))
            }
            Self::ProviderAuth(api_error) => ErrorBody {
                error: "Authentication failed".into(),
                details: Some(Value::String(
                    "Please verify your provider API key and secret are correct.".into(),
                )),
                api_error: Some(api_error),
            },
            Self::ProviderRejected { status, details } => {
                body(&format!("Provider API error: {status}"), Some(details))
            }
            Self::InvalidProviderResponse(text) => {
                body("Invalid response from provider API", Some(Value::String(text)))
            }
            Self::HttpError(e) => body(
                "Failed to generate session token",
                Some(Value::String(e.to_string())),
            ),
            Self::Serialization(e) => body(
                "Failed to generate session token",
                Some(Value::String(e.to_string())),
            ),
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
