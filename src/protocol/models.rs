//! License server request/response structs and derived entitlement state.

use crate::protocol::token::TokenClaims;
use crate::OrderGateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Plan reported when no active entitlement exists.
pub const FREE_PLAN: &str = "free";

/// Body of `POST /api/license/issue`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest<'a> {
    /// Installation to issue for.
    pub install_id: &'a str,
}

/// Response of `POST /api/license/issue`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLicense {
    /// Bearer token to persist.
    #[serde(default)]
    pub token: String,
    /// Server-reported expiry (informational; the token's `exp` is authoritative).
    #[serde(default)]
    pub expires_at: Option<serde_json::Value>,
    /// Plan name granted by the server.
    #[serde(default)]
    pub plan: Option<String>,
    /// Scopes granted by the server.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Response of `GET /api/license/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatus {
    /// Whether the subscription is active server-side.
    pub active: bool,
    /// Plan name, if any.
    #[serde(default)]
    pub plan: Option<String>,
    /// Scopes the subscription grants.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Entitlement view derived from the stored token on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementState {
    /// A decodable, unexpired token is stored.
    pub active: bool,
    /// Plan name; `"free"` unless active.
    pub plan: String,
    /// Granted scopes; empty unless active.
    pub scopes: BTreeSet<String>,
    /// A token is stored but expired or malformed.
    pub expired: bool,
}

impl EntitlementState {
    /// State when no token is stored.
    pub fn none() -> Self {
        Self {
            active: false,
            plan: FREE_PLAN.to_string(),
            scopes: BTreeSet::new(),
            expired: false,
        }
    }

    /// State for a stored token that is expired or cannot be decoded.
    pub fn expired() -> Self {
        Self {
            expired: true,
            ..Self::none()
        }
    }

    /// State for an unexpired token.
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            active: true,
            plan: claims.plan,
            scopes: claims.scopes,
            expired: false,
        }
    }

    /// Whether `scope` is granted.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Parse an issue response body.
pub fn parse_issued_license(body: &[u8]) -> Result<IssuedLicense, OrderGateError> {
    let issued: IssuedLicense = serde_json::from_slice(body).map_err(|e| {
        OrderGateError::LicenseIssuance(format!("Failed to parse license response: {}", e))
    })?;
    if issued.token.is_empty() {
        return Err(OrderGateError::LicenseIssuance(
            "License response missing token".to_string(),
        ));
    }
    Ok(issued)
}

/// Parse a status response body.
pub fn parse_license_status(body: &[u8]) -> Result<LicenseStatus, OrderGateError> {
    serde_json::from_slice(body).map_err(|e| {
        OrderGateError::ProtocolError(format!("Failed to parse license status: {}", e))
    })
}
