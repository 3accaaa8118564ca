//! Wallet address validation.
//!
//! Checks that an address string has the shape expected by a network's
//! [`NetworkFamily`]. This is a syntactic check only (no checksum
//! verification): its job is to catch address/network mix-ups before they
//! reach the provider, which rejects them with an opaque error.
//!
//! | Family  | Accepted form |
//! |---------|---------------|
//! | EVM     | `0x` + exactly 40 hex characters |
//! | Solana  | 32-44 base58 characters |
//! | Bitcoin | `1`/`3` + 25-34 base58 characters, or `bc1` + 39-59 lowercase alphanumerics |
//!
//! Network identifiers that are not recognised are let through unchecked,
//! so that chains added by the provider keep working; a warning is logged.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::network::{Network, NetworkFamily};

const UNKNOWN_FORMAT_DESCRIPTION: &str = "Valid address for the selected network";

// ---------------------------------------------------------------------------
// AddressValidation
// ---------------------------------------------------------------------------

/// Outcome of [`validate`].
///
/// Serialises as `{ "isValid": bool, "error"?: string, "suggestion"?: string }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressValidation {
    /// Whether the address is acceptable for the network.
    pub is_valid: bool,
    /// Why the address was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// How to fix it (expected format and an example).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl AddressValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
            suggestion: None,
        }
    }

    fn invalid(error: impl Into<String>, suggestion: Option<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
            suggestion,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check whether `address` has the format expected on `network`.
///
/// Returns `false` when either argument is empty. Unknown networks are
/// accepted.
///
/// ```
/// use onramp_models::validation::is_valid_for_network;
///
/// assert!(is_valid_for_network("0x742d35Cc6634C0532925a3b8D96cF1B8FdB1f3b4", "base"));
/// assert!(!is_valid_for_network("0x742d35Cc6634C0532925a3b8D96cF1B8FdB1f3b4", "solana"));
/// ```
pub fn is_valid_for_network(address: &str, network: &str) -> bool {
    let address = address.trim();
    if address.is_empty() || network.trim().is_empty() {
        return false;
    }

    match Network::parse(network) {
        Some(known) => matches_family(address, known.family()),
        None => {
            warn!(network = %network, "unknown network, address format not checked");
            true
        }
    }
}

/// Validate `address` for `network`, explaining any failure.
///
/// An empty address and an empty network produce distinct errors
/// (`"Address is required"` / `"Network is required"`). A format mismatch
/// carries a suggestion naming the expected format and an example.
pub fn validate(address: &str, network: &str) -> AddressValidation {
    if address.trim().is_empty() {
        return AddressValidation::invalid("Address is required", None);
    }
    if network.trim().is_empty() {
        return AddressValidation::invalid("Network is required", None);
    }

    if is_valid_for_network(address, network) {
        return AddressValidation::valid();
    }

    let example = example_address(network);
    let mut suggestion = format!("Expected: {}", format_description(network));
    if !example.is_empty() {
        suggestion.push_str("\nExample: ");
        suggestion.push_str(example);
    }

    AddressValidation::invalid(
        format!("Invalid address format for {network} network"),
        Some(suggestion),
    )
}

/// Example address for `network`, or `""` when the network is unknown.
pub fn example_address(network: &str) -> &'static str {
    Network::parse(network)
        .map(|n| n.family().example_address())
        .unwrap_or("")
}

/// Description of the address format expected on `network`.
pub fn format_description(network: &str) -> &'static str {
    Network::parse(network)
        .map(|n| n.family().format_description())
        .unwrap_or(UNKNOWN_FORMAT_DESCRIPTION)
}

/// Best-effort guess of the network an address belongs to.
///
/// EVM addresses map to [`Network::Ethereum`], Bitcoin-shaped addresses to
/// [`Network::Bitcoin`] and remaining base58 strings of Solana length to
/// [`Network::Solana`]. Anything else falls back to Ethereum.
///
/// Bitcoin is tried before Solana because short legacy Bitcoin addresses
/// are also valid base58 strings of Solana length.
pub fn infer_network(address: &str) -> Network {
    let address = address.trim();
    if is_evm_address(address) {
        Network::Ethereum
    } else if is_bitcoin_address(address) {
        Network::Bitcoin
    } else if is_solana_address(address) {
        Network::Solana
    } else {
        Network::default()
    }
}

// ---------------------------------------------------------------------------
// Format checks
// ---------------------------------------------------------------------------

fn matches_family(address: &str, family: NetworkFamily) -> bool {
    match family {
        NetworkFamily::Evm => is_evm_address(address),
        NetworkFamily::Solana => is_solana_address(address),
        NetworkFamily::Bitcoin => is_bitcoin_address(address),
    }
}

/// Base58 alphabet: ASCII alphanumerics minus `0`, `O`, `I` and `l`.
fn is_base58(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
}

fn is_evm_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_solana_address(address: &str) -> bool {
    !address.starts_with("0x")
        && address.chars().all(is_base58)
        && (32..=44).contains(&address.len())
}

fn is_bitcoin_address(address: &str) -> bool {
    if let Some(data) = address.strip_prefix("bc1") {
        return (39..=59).contains(&data.len())
            && data
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    }

    let mut chars = address.chars();
    match chars.next() {
        Some('1' | '3') => {
            let rest = chars.as_str();
            rest.chars().all(is_base58) && (25..=34).contains(&rest.len())
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
