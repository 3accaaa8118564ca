//! Request JWT generation.
//!
//! Signs the short-lived bearer token that authenticates one call to the
//! provider API. The token proves possession of the API key secret and is
//! bound to a single `METHOD host/path` URI, so it cannot be replayed
//! against another endpoint.
//!
//! Two key types are supported, chosen by the shape of the secret:
//!
//! | Secret                               | JWS `alg` |
//! |--------------------------------------|-----------|
//! | base64, 32-byte seed or 64-byte pair | `EdDSA`   |
//! | PEM EC P-256 key (SEC1 or PKCS#8)    | `ES256`   |

use std::time::SystemTime;

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use p256::pkcs8::DecodePrivateKey;
use serde::Serialize;

use crate::config::Credential;
use crate::error::SessionError;

/// Lifetime of a request JWT in seconds.
pub const REQUEST_JWT_TTL_SECS: u64 = 120;

const ISSUER: &str = "cdp";

// ---------------------------------------------------------------------------
// JWT header and claims
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RequestHeader<'a> {
    alg: &'static str,
    kid: &'a str,
    typ: &'static str,
    nonce: String,
}

#[derive(Serialize)]
struct RequestClaims<'a> {
    sub: &'a str,
    iss: &'static str,
    nbf: u64,
    exp: u64,
    uris: Vec<String>,
}

// ---------------------------------------------------------------------------
// Signing keys
// ---------------------------------------------------------------------------

enum RequestSigner {
    Ed25519(ed25519_dalek::SigningKey),
    Es256(p256::ecdsa::SigningKey),
}

impl RequestSigner {
    fn from_secret(secret: &str) -> Result<Self, SessionError> {
        let secret = secret.trim();

        if secret.starts_with("-----BEGIN") {
            let key = p256::SecretKey::from_sec1_pem(secret)
                .or_else(|_| p256::SecretKey::from_pkcs8_pem(secret))
                .map_err(|e| SessionError::JwtGeneration(format!("invalid EC private key: {e}")))?;
            return Ok(Self::Es256(p256::ecdsa::SigningKey::from(key)));
        }

        let bytes = STANDARD
            .decode(secret)
            .map_err(|e| SessionError::JwtGeneration(format!("invalid Ed25519 key encoding: {e}")))?;
        if bytes.len() != 32 && bytes.len() != 64 {
            return Err(SessionError::JwtGeneration(format!(
                "Ed25519 key must be 32 or 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        Ok(Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&seed)))
    }

    fn algorithm(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => "EdDSA",
            Self::Es256(_) => "ES256",
        }
    }

    /// Raw JWS signature: 64 bytes for both algorithms (`r || s` for ES256).
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => ed25519_dalek::Signer::sign(key, message).to_bytes().to_vec(),
            Self::Es256(key) => {
                let signature: p256::ecdsa::Signature =
                    p256::ecdsa::signature::Signer::sign(key, message);
                signature.to_bytes().to_vec()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sign a JWT authorising one provider API call.
///
/// # Arguments
///
/// * `credential`: API key id and secret.
/// * `method`: HTTP method of the call (e.g. `"POST"`).
/// * `host`: provider host the call is sent to.
/// * `path`: request path (e.g. `/onramp/v1/token`).
/// * `ttl_secs`: lifetime of the token in seconds.
pub fn sign_request_jwt(
    credential: &Credential,
    method: &str,
    host: &str,
    path: &str,
    ttl_secs: u64,
) -> Result<String, SessionError> {
    let signer = RequestSigner::from_secret(&credential.key_secret)?;
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|e| SessionError::JwtGeneration(format!("system clock before epoch: {e}")))?
        .as_secs();

    let header = RequestHeader {
        alg: signer.algorithm(),
        kid: &credential.key_id,
        typ: "JWT",
        nonce: random_nonce(),
    };
    let claims = RequestClaims {
        sub: &credential.key_id,
        iss: ISSUER,
        nbf: now,
        exp: now + ttl_secs,
        uris: vec![format!("{method} {host}{path}")],
    };

    encode_and_sign(&signer, &header, &claims)
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// Encode as a compact JWS: `base64url(header).base64url(claims).base64url(sig)`.
fn encode_and_sign(
    signer: &RequestSigner,
    header: &RequestHeader<'_>,
    claims: &RequestClaims<'_>,
) -> Result<String, SessionError> {
    let encoded_header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?);
    let encoded_claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{encoded_header}.{encoded_claims}");

    let encoded_sig = URL_SAFE_NO_PAD.encode(signer.sign(signing_input.as_bytes()));

    Ok(format!("{signing_input}.{encoded_sig}"))
}

/// 16 random bytes, hex encoded.
fn random_nonce() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
