//! # Onramp SDK
//!
//! Client SDK for the **onramp session service**.
//!
//! The SDK provides:
//!
//! * [`SessionClient`]: typed access to `POST /api/session`, plus a
//!   one-call helper that validates, fetches a token and builds the
//!   provider link.
//! * [`SdkError`]: unified error type for all SDK operations.
//!
//! Model types from [`onramp_models`] are re-exported for convenience.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use onramp_sdk::{AddressEntry, SessionClient, SessionTokenRequest};
//!
//! # async fn run() -> Result<(), onramp_sdk::SdkError> {
//! let client = SessionClient::new("http://localhost:3001")?;
//! let request = SessionTokenRequest::new(vec![AddressEntry::new(
//!     "0x742d35Cc6634C0532925a3b8D96cF1B8FdB1f3b4",
//!     ["ethereum", "base"],
//! )]);
//!
//! let session = client.request_session_token(&request).await?;
//! println!("token issued (channel {:?})", session.channel_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;

pub use client::SessionClient;
pub use error::SdkError;

// Re-export models for ergonomic usage.
pub use onramp_models::{
    AddressEntry, AddressRejection, ErrorBody, Network, OnrampParams, OnrampUrlBuilder,
    SessionTokenRequest, SessionTokenResponse,
};
