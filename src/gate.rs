//! Entitlement gate - the main public API for privileged operations.
//!
//! The gate answers one question: may real-money trading proceed? Its mode is
//! evaluated once from [`OrderGateConfig::enforce_subscription`]:
//! - `Open`: always allowed, the token store is never consulted
//! - `Enforced`: allowed only with an active token carrying `"mainnet"`
//!
//! Tokens are checked locally without verifying their signature. The license
//! server must verify the token before honoring any privileged action.

use crate::client::http::HttpLicenseClient;
use crate::clock::{Clock, SystemClock};
use crate::config::OrderGateConfig;
use crate::crypto::canonical::encode_component;
use crate::policy::access::{allows_mainnet, GateMode};
use crate::protocol::models::EntitlementState;
use crate::store::file::FileStorage;
use crate::store::token_store::EntitlementTokenStore;
use crate::OrderGateError;
use std::sync::Arc;

/// Decides whether privileged operations are permitted.
pub struct EntitlementGate {
    config: OrderGateConfig,
    mode: GateMode,
    store: Arc<EntitlementTokenStore>,
}

impl EntitlementGate {
    /// Create a gate with file storage and the HTTP license client.
    ///
    /// Uses the system clock for expiry checks.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - HTTP client creation fails
    /// - Storage directory creation fails
    pub fn from_config(config: OrderGateConfig) -> Result<Self, OrderGateError> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`from_config`](Self::from_config) with a custom clock.
    pub fn from_config_with_clock(
        config: OrderGateConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, OrderGateError> {
        config.validate()?;
        let storage = Arc::new(FileStorage::new(config.storage_namespace)?);
        let issuer = Arc::new(HttpLicenseClient::new(&config)?);
        let store = Arc::new(EntitlementTokenStore::new(storage, issuer, clock));
        Ok(Self::with_store(config, store))
    }

    /// Create a gate over an existing token store.
    pub fn new(
        config: OrderGateConfig,
        store: Arc<EntitlementTokenStore>,
    ) -> Result<Self, OrderGateError> {
        config.validate()?;
        Ok(Self::with_store(config, store))
    }

    fn with_store(config: OrderGateConfig, store: Arc<EntitlementTokenStore>) -> Self {
        let mode = GateMode::from_flag(config.enforce_subscription);
        tracing::debug!(?mode, "entitlement gate configured");
        Self {
            config,
            mode,
            store,
        }
    }

    /// The evaluated gate mode.
    pub fn mode(&self) -> GateMode {
        self.mode
    }

    /// Whether real-money trading is currently permitted.
    ///
    /// Never refreshes the token; call
    /// [`EntitlementTokenStore::refresh_if_needed`] beforehand if desired.
    pub async fn is_allowed(&self) -> Result<bool, OrderGateError> {
        match self.mode {
            GateMode::Open => Ok(true),
            GateMode::Enforced => Ok(allows_mainnet(&self.store.entitlement_state().await?)),
        }
    }

    /// Fail unless real-money trading is permitted.
    ///
    /// # Errors
    /// * `Entitlement` - Denied; carries the install identity for support
    pub async fn require_allowed(&self) -> Result<(), OrderGateError> {
        if self.is_allowed().await? {
            return Ok(());
        }
        let install_id = self.store.install_id().await?;
        tracing::warn!(install_id = %install_id, "mainnet access denied");
        Err(OrderGateError::Entitlement { install_id })
    }

    /// Derived entitlement state, for display.
    pub async fn state(&self) -> Result<EntitlementState, OrderGateError> {
        self.store.entitlement_state().await
    }

    /// Upgrade checkout link: `{checkout_base}?installId={id}`.
    pub async fn checkout_url(&self) -> Result<String, OrderGateError> {
        let install_id = self.store.install_id().await?;
        Ok(format!(
            "{}?installId={}",
            self.config.checkout_base_url(),
            encode_component(&install_id)
        ))
    }

    /// The token store backing this gate.
    pub fn store(&self) -> &Arc<EntitlementTokenStore> {
        &self.store
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OrderGateConfig {
        &self.config
    }
}
