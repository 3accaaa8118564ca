//! # Onramp URL Builder
//!
//! Fluent builder for the provider's hosted-checkout deep link.
//!
//! Two modes share one base URL:
//!
//! * **Session mode** ([`OnrampUrlBuilder::with_session_token`]): the
//!   session token is the authorisation; every other parameter is an
//!   advisory display hint.
//! * **Legacy mode** ([`OnrampUrlBuilder::legacy`]): no token. The
//!   application id, destination address map and asset list are sent in the
//!   clear, together with the same display parameters.
//!
//! ```rust
//! use onramp_models::OnrampUrlBuilder;
//!
//! let url = OnrampUrlBuilder::with_session_token("T").build().unwrap();
//! assert_eq!(url, "https://pay.coinbase.com/buy/select-asset?sessionToken=T");
//!
//! let url = OnrampUrlBuilder::with_session_token("T")
//!     .asset("USDC")
//!     .network("base")
//!     .payment_method("card")
//!     .amount("25")
//!     .build()
//!     .unwrap();
//! assert!(url.contains("defaultPaymentMethod=CARD"));
//! assert!(url.contains("presetFiatAmount=25"));
//! ```
//!
//! Absent or empty parameters are left out of the query string entirely.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::form_urlencoded;

use crate::error::ModelError;
use crate::validation;

/// Hosted-checkout entry point.
pub const ONRAMP_BASE_URL: &str = "https://pay.coinbase.com/buy/select-asset";

/// Redirect target used in legacy mode when none is given.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000";

/// Provider limit on the length of `partnerUserId`.
pub const PARTNER_USER_ID_MAX_CHARS: usize = 49;

type Query = form_urlencoded::Serializer<'static, String>;

// ─── Parameters ─────────────────────────────────────────────────────

/// User-selected purchase parameters.
///
/// Every field is optional; which ones end up in the URL depends on the
/// builder mode.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct OnrampParams {
    /// Asset symbol, e.g. `"USDC"`.
    pub asset: Option<String>,
    /// Fiat amount as entered by the user, e.g. `"25"`.
    pub amount: Option<String>,
    /// Delivery network identifier, e.g. `"base"`.
    pub network: Option<String>,
    /// Payment method code, e.g. `"card"` (sent uppercased).
    pub payment_method: Option<String>,
    /// Fiat currency code, e.g. `"USD"`.
    pub payment_currency: Option<String>,
    /// Destination wallet address.
    pub address: Option<String>,
    /// Where the provider sends the user afterwards.
    pub redirect_url: Option<String>,
    /// ISO country code.
    pub country: Option<String>,
    /// Country subdivision (US state) code.
    pub subdivision: Option<String>,
    /// Guest checkout toggle (legacy mode only).
    pub enable_guest_checkout: Option<bool>,
}

// ─── Builder ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Authorization {
    SessionToken(String),
    AppId(String),
}

/// Builder for onramp URLs.
///
/// Created via [`with_session_token`](Self::with_session_token) or
/// [`legacy`](Self::legacy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnrampUrlBuilder {
    authorization: Authorization,
    params: OnrampParams,
}

impl OnrampUrlBuilder {
    /// Session mode: authorise with a provider session token.
    pub fn with_session_token(token: impl Into<String>) -> Self {
        Self {
            authorization: Authorization::SessionToken(token.into()),
            params: OnrampParams::default(),
        }
    }

    /// Legacy mode: identify the integration by its provider app id.
    pub fn legacy(app_id: impl Into<String>) -> Self {
        Self {
            authorization: Authorization::AppId(app_id.into()),
            params: OnrampParams::default(),
        }
    }

    /// Whether this builder carries a session token.
    pub fn is_session_mode(&self) -> bool {
        matches!(self.authorization, Authorization::SessionToken(_))
    }

    /// Replace all parameters at once.
    pub fn params(mut self, params: OnrampParams) -> Self {
        self.params = params;
        self
    }

    /// Asset to preselect.
    pub fn asset(mut self, asset: impl Into<String>) -> Self {
        self.params.asset = Some(asset.into());
        self
    }

    /// Fiat amount to preset.
    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.params.amount = Some(amount.into());
        self
    }

    /// Delivery network.
    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.params.network = Some(network.into());
        self
    }

    /// Payment method code.
    pub fn payment_method(mut self, method: impl Into<String>) -> Self {
        self.params.payment_method = Some(method.into());
        self
    }

    /// Fiat currency code.
    pub fn payment_currency(mut self, currency: impl Into<String>) -> Self {
        self.params.payment_currency = Some(currency.into());
        self
    }

    /// Destination wallet address.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.params.address = Some(address.into());
        self
    }

    /// Post-checkout redirect target.
    pub fn redirect_url(mut self, url: impl Into<String>) -> Self {
        self.params.redirect_url = Some(url.into());
        self
    }

    /// ISO country code.
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.params.country = Some(country.into());
        self
    }

    /// Country subdivision (US state) code.
    pub fn subdivision(mut self, subdivision: impl Into<String>) -> Self {
        self.params.subdivision = Some(subdivision.into());
        self
    }

    /// Guest checkout toggle (legacy mode only).
    pub fn guest_checkout(mut self, enabled: bool) -> Self {
        self.params.enable_guest_checkout = Some(enabled);
        self
    }

    /// Assemble the URL.
    ///
    /// # Errors
    ///
    /// * [`ModelError::MissingField`] if the session token or app id is empty.
    /// * [`ModelError::InvalidAmount`] in legacy mode if an amount is given
    ///   but does not parse to a finite number. In session mode such an
    ///   amount is dropped instead.
    pub fn build(&self) -> Result<String, ModelError> {
        let mut query = Query::new(String::new());

        match &self.authorization {
            Authorization::SessionToken(token) => {
                if token.is_empty() {
                    return Err(missing("sessionToken"));
                }
                query.append_pair("sessionToken", token);

                let amount = present(&self.params.amount)
                    .and_then(|raw| usable_amount(raw).ok().flatten());
                self.append_display_hints(&mut query, amount);

                if let Some(redirect) = present(&self.params.redirect_url) {
                    query.append_pair("redirectUrl", redirect);
                }
            }
            Authorization::AppId(app_id) => {
                if app_id.is_empty() {
                    return Err(missing("appId"));
                }
                let amount = match present(&self.params.amount) {
                    Some(raw) => usable_amount(raw)?,
                    None => None,
                };

                query.append_pair("appId", app_id);

                if let Some(address) = present(&self.params.address) {
                    let network = present(&self.params.network)
                        .map(str::to_string)
                        .unwrap_or_else(|| validation::infer_network(address).to_string());
                    let mut addresses = Map::new();
                    addresses.insert(address.to_string(), json!([network]));
                    query.append_pair("addresses", &Value::Object(addresses).to_string());
                }
                if let Some(asset) = present(&self.params.asset) {
                    query.append_pair("assets", &json!([asset]).to_string());
                }

                self.append_display_hints(&mut query, amount);

                let redirect =
                    present(&self.params.redirect_url).unwrap_or(DEFAULT_REDIRECT_URL);
                query.append_pair("redirectUrl", redirect);

                if let Some(enabled) = self.params.enable_guest_checkout {
                    query.append_pair("enableGuestCheckout", if enabled { "true" } else { "false" });
                }
            }
        }

        Ok(format!("{ONRAMP_BASE_URL}?{}", query.finish()))
    }

    /// Parameters common to both modes, in provider order.
    fn append_display_hints(&self, query: &mut Query, amount: Option<&str>) {
        let p = &self.params;

        if let Some(asset) = present(&p.asset) {
            query.append_pair("defaultAsset", asset);
        }
        if let Some(network) = present(&p.network) {
            query.append_pair("defaultNetwork", network);
        }
        if let Some(method) = present(&p.payment_method) {
            query.append_pair("defaultPaymentMethod", &method.to_uppercase());
        }
        if let Some(amount) = amount {
            query.append_pair("presetFiatAmount", amount);
        }
        if let Some(currency) = present(&p.payment_currency) {
            query.append_pair("fiatCurrency", currency);
        }
        if let Some(address) = present(&p.address) {
            query.append_pair("partnerUserId", &partner_user_id(address));
        }
        if let Some(country) = present(&p.country) {
            query.append_pair("country", country);
        }
        if let Some(subdivision) = present(&p.subdivision) {
            query.append_pair("subdivision", subdivision);
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn missing(field: &str) -> ModelError {
    ModelError::MissingField {
        field: field.to_string(),
    }
}

fn parse_amount(raw: &str) -> Result<f64, ModelError> {
    let value: f64 = raw.trim().parse().map_err(|_| ModelError::InvalidAmount {
        value: raw.to_string(),
        reason: "not a number".into(),
    })?;
    if !value.is_finite() {
        return Err(ModelError::InvalidAmount {
            value: raw.to_string(),
            reason: "must be a finite number".into(),
        });
    }
    Ok(value)
}

/// The trimmed amount as entered, or `None` when it is not positive.
fn usable_amount(raw: &str) -> Result<Option<&str>, ModelError> {
    let raw = raw.trim();
    Ok((parse_amount(raw)? > 0.0).then_some(raw))
}

fn partner_user_id(address: &str) -> String {
    address.chars().take(PARTNER_USER_ID_MAX_CHARS).collect()
}

// ─── Tests ──────────────────────────────────────────────────────────
