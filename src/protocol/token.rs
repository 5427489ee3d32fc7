//! Entitlement token decoding.
//!
//! Tokens are `header.payload.signature`, each segment base64url. Only the
//! payload is decoded here and the signature segment is **never verified**.
//! The local expiry check is a UX convenience; the server must verify the
//! token before honoring any privileged action.

use crate::OrderGateError;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeSet;

/// Base64url decoder that, like browser `atob`, ignores padding and
/// non-zero trailing bits.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Default tolerance before expiry at which a token is already treated as expired.
pub const DEFAULT_EXPIRY_SKEW_SECONDS: i64 = 30;

/// Plan name reported when a token has none.
const DEFAULT_PAID_PLAN: &str = "pro";

/// Claims read from a token payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiry as seconds since the Unix epoch.
    pub exp: Option<f64>,
    /// Plan name, defaulting to `"pro"`.
    pub plan: String,
    /// Granted capability scopes.
    pub scopes: BTreeSet<String>,
}

impl TokenClaims {
    /// Read claims from a decoded payload.
    ///
    /// `scopes` is preferred over the legacy `scope`; anything that is not an
    /// array of strings counts as no scopes.
    pub fn from_payload(payload: &Value) -> Result<Self, OrderGateError> {
        let obj = payload.as_object().ok_or_else(|| {
            OrderGateError::ProtocolError("Token payload is not a JSON object".to_string())
        })?;

        let exp = obj.get("exp").and_then(Value::as_f64);

        let plan = obj
            .get("plan")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PAID_PLAN)
            .to_string();

        let scopes = obj
            .get("scopes")
            .and_then(Value::as_array)
            .or_else(|| obj.get("scope").and_then(Value::as_array))
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { exp, plan, scopes })
    }

    /// Decode and read claims from a raw token.
    pub fn from_token(token: &str) -> Result<Self, OrderGateError> {
        Self::from_payload(&decode_payload_unverified(token)?)
    }
}

/// Decode the payload segment of a token without verifying it.
///
/// Accepts padded or unpadded segments in either base64 alphabet and ignores
/// non-zero trailing bits. A payload that is not valid UTF-8 is read one
/// byte per character (Latin-1), so its `exp` is still honored.
pub fn decode_payload_unverified(token: &str) -> Result<Value, OrderGateError> {
    let mut segments = token.split('.');
    let payload_b64 = match (segments.next(), segments.next()) {
        (Some(_), Some(payload)) => payload,
        _ => {
            return Err(OrderGateError::ProtocolError(
                "Invalid token format".to_string(),
            ))
        }
    };

    let normalized: String = payload_b64
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = LENIENT_URL_SAFE
        .decode(normalized)
        .map_err(|e| OrderGateError::ProtocolError(format!("Invalid token base64: {}", e)))?;

    let parsed: Result<Value, serde_json::Error> = match std::str::from_utf8(&bytes) {
        Ok(text) => serde_json::from_str(text),
        Err(_) => {
            let latin1: String = bytes.iter().map(|&b| char::from(b)).collect();
            serde_json::from_str(&latin1)
        }
    };
    parsed.map_err(|e| OrderGateError::ProtocolError(format!("Invalid token payload: {}", e)))
}

/// Whether `token` should be treated as expired at `now`.
///
/// True iff `now >= exp - skew_seconds`, or the token cannot be decoded, or
/// it carries no numeric `exp`. Never fails.
pub fn is_token_expired(token: &str, now: DateTime<Utc>, skew_seconds: i64) -> bool {
    let exp = match TokenClaims::from_token(token) {
        Ok(TokenClaims { exp: Some(exp), .. }) => exp,
        _ => return true,
    };
    let now_secs = now.timestamp() as f64;
    now_secs >= exp - skew_seconds as f64
}

/// Build an unsigned token around `payload` (test helper).
#[cfg(test)]
pub(crate) fn encode_test_token(payload: &Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, body)
}
