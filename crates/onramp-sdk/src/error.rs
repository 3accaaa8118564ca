//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. Failures reported by the session service keep
//! their structured [`ErrorBody`] so callers can show the suggestion.

use onramp_models::{AddressRejection, ErrorBody, ModelError};

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad service URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// The address was refused locally, before any request was made.
    #[error("invalid address {}: {}", .0.address, .0.reason)]
    Validation(AddressRejection),

    /// The session service answered with a non-success status.
    #[error("session service error ({status}): {}", .body.error)]
    Api {
        /// HTTP status code.
        status: u16,
        /// Decoded error body.
        body: ErrorBody,
    },

    /// HTTP request failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The onramp URL could not be built.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SdkError {
    /// Suggestion attached to a validation failure, local or remote.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation(rejection) => rejection.suggestion.as_deref(),
            Self::Api { body, .. } => body
                .details
                .as_ref()
                .and_then(|details| details.get("suggestion"))
                .and_then(serde_json::Value::as_str),
            _ => None,
        }
    }
}
