//! HMAC-SHA256 over canonical strings.

use crate::OrderGateError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// API secret used as the HMAC key.
///
/// Never persisted, never serialized, and redacted from `Debug`. The bytes
/// are wiped when the key is dropped.
#[derive(Clone)]
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    /// Wrap raw secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Whether the secret is empty (signing will be refused).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for SigningKey {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes())
    }
}

impl From<String> for SigningKey {
    fn from(secret: String) -> Self {
        Self::new(secret.into_bytes())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

fn keyed_mac(key: &SigningKey) -> Result<HmacSha256, OrderGateError> {
    if key.is_empty() {
        return Err(OrderGateError::Signing("API secret is empty".to_string()));
    }
    HmacSha256::new_from_slice(key.expose())
        .map_err(|e| OrderGateError::Signing(format!("Failed to key HMAC: {}", e)))
}

/// Compute the lowercase hex HMAC-SHA256 of `message`.
pub fn hmac_sha256_hex(key: &SigningKey, message: &str) -> Result<String, OrderGateError> {
    let mut mac = keyed_mac(key)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature against `message` in constant time.
///
/// Any failure (bad hex, empty key, mismatch) is reported as `false`.
pub fn verify_hmac_sha256_hex(key: &SigningKey, message: &str, signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = keyed_mac(key) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
