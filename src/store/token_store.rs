//! Entitlement token store.
//!
//! Persists the bearer token and the install identity, and refreshes the
//! token from the license server when it is missing or expired.

use crate::client::LicenseIssuer;
use crate::clock::Clock;
use crate::protocol::models::EntitlementState;
use crate::protocol::token::{is_token_expired, TokenClaims, DEFAULT_EXPIRY_SKEW_SECONDS};
use crate::store::storage::KeyValueStorage;
use crate::OrderGateError;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage key of the current bearer token.
pub const TOKEN_KEY: &str = "license_token_v1";

/// Storage key of the install identity.
pub const INSTALL_ID_KEY: &str = "install_id_v1";

/// Random bytes in a generated install identity.
const INSTALL_ID_BYTES: usize = 16;

/// Token and install identity persistence with expiry-aware refresh.
pub struct EntitlementTokenStore {
    storage: Arc<dyn KeyValueStorage>,
    issuer: Arc<dyn LicenseIssuer>,
    clock: Arc<dyn Clock>,
    install_lock: Mutex<()>,
    refresh_lock: Mutex<()>,
}

impl EntitlementTokenStore {
    /// Create a store over `storage`, refreshing through `issuer`.
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        issuer: Arc<dyn LicenseIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            issuer,
            clock,
            install_lock: Mutex::new(()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The persisted install identity, created on first call.
    ///
    /// Generated identities are 128 bits from the OS RNG as 32 lowercase hex
    /// characters. Concurrent first calls observe the same identity.
    pub async fn install_id(&self) -> Result<String, OrderGateError> {
        let _guard = self.install_lock.lock().await;

        if let Some(id) = self.storage.get(INSTALL_ID_KEY).await? {
            if !id.is_empty() {
                return Ok(id);
            }
        }

        let id = generate_install_id();
        self.storage.set(INSTALL_ID_KEY, &id).await?;
        tracing::info!(install_id = %id, "created install identity");
        Ok(id)
    }

    /// The stored token, if any.
    pub async fn token(&self) -> Result<Option<String>, OrderGateError> {
        Ok(self
            .storage
            .get(TOKEN_KEY)
            .await?
            .filter(|token| !token.is_empty()))
    }

    /// Replace the stored token. No validation is performed.
    pub async fn set_token(&self, token: &str) -> Result<(), OrderGateError> {
        self.storage.set(TOKEN_KEY, token).await
    }

    /// Remove the stored token.
    pub async fn clear_token(&self) -> Result<(), OrderGateError> {
        self.storage.remove(TOKEN_KEY).await
    }

    /// Whether `token` is expired under the default 30 second skew.
    pub fn is_expired(&self, token: &str) -> bool {
        self.is_expired_with_skew(token, DEFAULT_EXPIRY_SKEW_SECONDS)
    }

    /// Whether `token` is expired, or will be within `skew_seconds`.
    ///
    /// The token signature is not verified. Malformed tokens count as expired.
    pub fn is_expired_with_skew(&self, token: &str, skew_seconds: i64) -> bool {
        is_token_expired(token, self.clock.now_utc(), skew_seconds)
    }

    /// Return a usable token, fetching a new one when needed.
    ///
    /// Refreshes inside one process are serialized: a caller that waited on
    /// another refresh reuses its result instead of issuing again.
    ///
    /// # Errors
    /// * `LicenseIssuance` - The issuer failed; the stored token is unchanged
    /// * `StorageIO` - Reading or persisting failed
    pub async fn refresh_if_needed(&self) -> Result<String, OrderGateError> {
        if let Some(token) = self.unexpired_token().await? {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = self.unexpired_token().await? {
            return Ok(token);
        }

        let install_id = self.install_id().await?;
        tracing::debug!(install_id = %install_id, "requesting license token");

        let issued = self.issuer.issue(&install_id).await.map_err(|e| {
            tracing::warn!(install_id = %install_id, error = %e, "license issuance failed");
            match e {
                OrderGateError::LicenseIssuance(_) => e,
                other => OrderGateError::LicenseIssuance(other.to_string()),
            }
        })?;

        if issued.token.is_empty() {
            return Err(OrderGateError::LicenseIssuance(
                "License response missing token".to_string(),
            ));
        }

        self.storage.set(TOKEN_KEY, &issued.token).await?;
        tracing::debug!(install_id = %install_id, "license token refreshed");
        Ok(issued.token)
    }

    /// Entitlement state derived from the stored token. Never refreshes.
    pub async fn entitlement_state(&self) -> Result<EntitlementState, OrderGateError> {
        let Some(token) = self.token().await? else {
            return Ok(EntitlementState::none());
        };
        Ok(self.state_for(&token))
    }

    fn state_for(&self, token: &str) -> EntitlementState {
        if self.is_expired(token) {
            return EntitlementState::expired();
        }
        match TokenClaims::from_token(token) {
            Ok(claims) => EntitlementState::from_claims(claims),
            Err(_) => EntitlementState::expired(),
        }
    }

    async fn unexpired_token(&self) -> Result<Option<String>, OrderGateError> {
        Ok(self.token().await?.filter(|token| !self.is_expired(token)))
    }
}

fn generate_install_id() -> String {
    let mut bytes = [0u8; INSTALL_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
