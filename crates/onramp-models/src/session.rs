//! Wire types of the session-token endpoint.
//!
//! Shared by the `onramp-session` service (which serves them) and the
//! `onramp-sdk` client (which sends and decodes them).
//!
//! ```text
//! POST /api/session
//!   { "addresses": [{ "address": "0x…", "blockchains": ["base"] }], "assets": ["USDC"] }
//! 200
//!   { "token": "…", "channel_id": "…" }
//! 4xx / 5xx
//!   { "error": "…", "details": … }
//! ```

use serde::{Deserialize, Serialize};

use crate::validation;

/// Path of the session-token endpoint.
pub const SESSION_PATH: &str = "/api/session";

// ---------------------------------------------------------------------------
// AddressEntry
// ---------------------------------------------------------------------------

/// A destination address together with the networks it may receive on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    /// Wallet address.
    pub address: String,
    /// Network identifiers (e.g. `"base"`, `"solana"`).
    pub blockchains: Vec<String>,
}

impl AddressEntry {
    /// Create an entry for `address` on the given networks.
    pub fn new<I, S>(address: impl Into<String>, blockchains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            address: address.into(),
            blockchains: blockchains.into_iter().map(Into::into).collect(),
        }
    }

    /// Strip surrounding whitespace from the address and network ids, so
    /// what is forwarded is exactly what was validated.
    pub fn normalize(&mut self) {
        let address = self.address.trim();
        if address.len() != self.address.len() {
            self.address = address.to_string();
        }
        for blockchain in &mut self.blockchains {
            let trimmed = blockchain.trim();
            if trimmed.len() != blockchain.len() {
                *blockchain = trimmed.to_string();
            }
        }
    }

    /// Check the address against every declared network.
    ///
    /// Stops at the first failure. An entry without an address or without
    /// any blockchain is rejected as well.
    pub fn check(&self) -> Result<(), AddressRejection> {
        if self.address.trim().is_empty() {
            return Err(AddressRejection {
                address: self.address.clone(),
                blockchain: None,
                reason: "Address is required".into(),
                suggestion: None,
            });
        }
        if self.blockchains.is_empty() {
            return Err(AddressRejection {
                address: self.address.clone(),
                blockchain: None,
                reason: "At least one blockchain is required".into(),
                suggestion: None,
            });
        }

        for blockchain in &self.blockchains {
            let outcome = validation::validate(&self.address, blockchain);
            if !outcome.is_valid {
                return Err(AddressRejection {
                    address: self.address.clone(),
                    blockchain: Some(blockchain.clone()),
                    reason: outcome.error.unwrap_or_default(),
                    suggestion: outcome.suggestion,
                });
            }
        }

        Ok(())
    }
}

/// Why an [`AddressEntry`] was refused.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddressRejection {
    /// The offending address, as submitted.
    pub address: String,
    /// The network it was checked against, when the failure is format-related.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<String>,
    /// Human-readable reason.
    pub reason: String,
    /// Expected format and example, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

// ---------------------------------------------------------------------------
// Request / Response DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /api/session`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTokenRequest {
    /// Destination addresses the session token is scoped to.
    #[serde(default)]
    pub addresses: Vec<AddressEntry>,
    /// Assets the session token is scoped to. Omitted means "any".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<String>>,
    /// Retired single-address field. Only read so that requests still using
    /// it can be refused with a precise message.
    #[serde(default, rename = "walletAddress", skip_serializing)]
    pub wallet_address: Option<String>,
}

impl SessionTokenRequest {
    /// Create a request for the given addresses, unscoped by asset.
    pub fn new(addresses: Vec<AddressEntry>) -> Self {
        Self {
            addresses,
            ..Self::default()
        }
    }

    /// Restrict the token to the given assets.
    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assets = Some(assets.into_iter().map(Into::into).collect());
        self
    }
}

/// Successful response of `POST /api/session`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionTokenResponse {
    /// Single-use provider session token, embedded into the onramp URL.
    pub token: String,
    /// Provider channel identifier, when the provider returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// JSON body of every failed request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    /// Short description of the failure.
    pub error: String,
    /// Structured or textual details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Raw error returned by the provider, when it rejected our credentials.
    #[serde(default, rename = "apiError", skip_serializing_if = "Option::is_none")]
    pub api_error: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
