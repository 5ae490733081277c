//! Compact signed tokens in the `header.claims.signature` shape.
//!
//! Each segment is URL-safe base64 without padding. Header and claims are
//! compact JSON; the signature is the raw HMAC-SHA256 digest of
//! `base64url(header) + "." + base64url(claims)`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "HS256";
pub const TOKEN_TYPE: &str = "JWT";

/// Fixed token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self { alg: ALGORITHM.into(), typ: TOKEN_TYPE.into() }
    }
}

/// Payload carried in the second segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Id of the user the token was issued to.
    #[serde(rename = "id")]
    pub subject_id: String,
    /// Expiry, epoch seconds. Any JSON number is accepted on decode.
    #[serde(rename = "exp")]
    pub expires_at: serde_json::Number,
    /// Any other fields; kept but never consulted.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenClaims {
    pub fn new(subject_id: impl Into<String>, expires_at: i64) -> Self {
        Self { subject_id: subject_id.into(), expires_at: expires_at.into(), extra: serde_json::Map::new() }
    }

    /// `exp <= now`. Integers compare exactly; fractional expiries compare as floats.
    pub fn is_expired_at(&self, now: i64) -> bool {
        if let Some(exp) = self.expires_at.as_i64() {
            return exp <= now;
        }
        if self.expires_at.is_u64() {
            // above i64::MAX, so later than any `now`
            return false;
        }
        self.expires_at.as_f64().map_or(true, |exp| exp <= now as f64)
    }
}

/// What was wrong with the claims segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimsDefect {
    /// Not base64url or not JSON.
    Unparseable,
    /// JSON, but `id` is not a string or `exp` is not a number.
    WrongShape,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token must have exactly three segments")]
    InvalidFormat,
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token claims invalid: {0:?}")]
    InvalidClaims(ClaimsDefect),
    #[error("token expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encode(String),
}

impl TokenError {
    /// Signature and expiry failures reject a well-formed credential; the rest are malformed input.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TokenError::InvalidSignature | TokenError::Expired)
    }
}

/// Signs and verifies tokens with one symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").field("alg", &ALGORITHM).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, hmac::digest::InvalidLength> {
        let mac = HmacSha256::new_from_slice(secret.as_ref())?;
        Ok(Self { mac })
    }

    fn sign(&self, signing_input: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Encode claims into a signed token. Deterministic for a given secret.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let header = serde_json::to_vec(&TokenHeader::default()).map_err(|e| TokenError::Encode(e.to_string()))?;
        let payload = serde_json::to_vec(claims).map_err(|e| TokenError::Encode(e.to_string()))?;
        let signing_input = format!("{}.{}", URL_SAFE_NO_PAD.encode(header), URL_SAFE_NO_PAD.encode(payload));
        let signature = self.sign(&signing_input);
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Decode and validate against the system clock.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_at(token, chrono::Utc::now().timestamp())
    }

    /// Decode and validate with `now` in epoch seconds.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// segment count, signature, claims shape, expiry.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(TokenError::InvalidFormat);
        };

        let expected = self.sign(&format!("{header}.{payload}"));
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return Err(TokenError::InvalidSignature);
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::InvalidClaims(ClaimsDefect::Unparseable))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|_| TokenError::InvalidClaims(ClaimsDefect::Unparseable))?;
        let claims: TokenClaims = serde_json::from_value(value)
            .map_err(|_| TokenError::InvalidClaims(ClaimsDefect::WrongShape))?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
