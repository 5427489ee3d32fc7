//! Entitlement scope policy.
//!
//! Real-money trading is allowed when the derived entitlement state is
//! active and grants [`SCOPE_MAINNET`].

use crate::protocol::models::EntitlementState;

/// Scope granting real-money (mainnet) trading.
pub const SCOPE_MAINNET: &str = "mainnet";

/// Scope granting multiple trading profiles.
pub const SCOPE_MULTI_PROFILE: &str = "multi_profile";

/// How the entitlement gate decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Every check passes and no token is inspected.
    Open,
    /// Checks require an active token with the mainnet scope.
    Enforced,
}

impl GateMode {
    /// Mode selected by the `enforce_subscription` flag.
    pub fn from_flag(enforce_subscription: bool) -> Self {
        if enforce_subscription {
            GateMode::Enforced
        } else {
            GateMode::Open
        }
    }
}

/// Whether `state` permits mainnet trading.
pub fn allows_mainnet(state: &EntitlementState) -> bool {
    state.active && state.has_scope(SCOPE_MAINNET)
}
