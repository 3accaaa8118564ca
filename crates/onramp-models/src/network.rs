//! Blockchain network identifiers.
//!
//! A [`Network`] names one of the chains the payment provider can deliver
//! purchased assets to. Each network belongs to a [`NetworkFamily`], which
//! fixes the address format accepted by [`crate::validation`].
//!
//! Network identifiers travel as plain strings in requests (the provider
//! accepts chains this crate does not know about), so parsing is lenient:
//! [`Network::parse`] ignores ASCII case and surrounding whitespace and
//! returns `None` for anything unrecognised.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NetworkFamily
// ---------------------------------------------------------------------------

/// Address-format family shared by a group of networks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NetworkFamily {
    /// Ethereum Virtual Machine chains: `0x` + 40 hex characters.
    Evm,
    /// Solana: 32-44 base58 characters.
    Solana,
    /// Bitcoin: legacy P2PKH / P2SH or bech32 `bc1` addresses.
    Bitcoin,
}

impl NetworkFamily {
    /// Human-readable description of the expected address format.
    pub fn format_description(self) -> &'static str {
        match self {
            Self::Evm => "Ethereum-style address (0x followed by 40 hexadecimal characters)",
            Self::Solana => "Solana address (32-44 base58 characters, no 0x prefix)",
            Self::Bitcoin => "Bitcoin address (starts with 1, 3, or bc1)",
        }
    }

    /// A well-formed address of this family, shown to users as a hint.
    pub fn example_address(self) -> &'static str {
        match self {
            Self::Evm => "0x742d35Cc6634C0532925a3b8D96cF1B8FdB1f3b4",
            Self::Solana => "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
            Self::Bitcoin => "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
        }
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// A blockchain network known to the onramp toolkit.
///
/// # Examples
///
/// ```
/// use onramp_models::{Network, NetworkFamily};
///
/// let net = Network::parse("Avalanche-C-Chain").unwrap();
/// assert_eq!(net, Network::AvalancheCChain);
/// assert_eq!(net.to_string(), "avalanche-c-chain");
/// assert_eq!(net.family(), NetworkFamily::Evm);
///
/// assert!(Network::parse("dogecoin").is_none());
/// ```
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Network {
    /// Ethereum mainnet. Also the fallback when a network cannot be inferred.
    #[default]
    Ethereum,
    /// Base (Coinbase L2).
    Base,
    /// Optimism.
    Optimism,
    /// Arbitrum One.
    Arbitrum,
    /// Polygon PoS.
    Polygon,
    /// Avalanche C-Chain.
    #[serde(rename = "avalanche-c-chain")]
    #[strum(serialize = "avalanche-c-chain")]
    AvalancheCChain,
    /// Solana mainnet.
    Solana,
    /// Bitcoin mainnet.
    Bitcoin,
}

impl Network {
    /// Parse a network identifier, ignoring ASCII case and surrounding
    /// whitespace. Unknown identifiers yield `None`.
    pub fn parse(id: &str) -> Option<Self> {
        id.trim().parse().ok()
    }

    /// The address-format family of this network.
    pub fn family(self) -> NetworkFamily {
        match self {
            Self::Ethereum
            | Self::Base
            | Self::Optimism
            | Self::Arbitrum
            | Self::Polygon
            | Self::AvalancheCChain => NetworkFamily::Evm,
            Self::Solana => NetworkFamily::Solana,
            Self::Bitcoin => NetworkFamily::Bitcoin,
        }
    }

    /// The identifier as sent to the provider (e.g. `"avalanche-c-chain"`).
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
