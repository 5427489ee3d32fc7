//! License server client layer.

pub mod http;

use crate::protocol::models::IssuedLicense;
use crate::OrderGateError;
use async_trait::async_trait;

/// Issues entitlement tokens for an installation.
///
/// Implementations report every failure as
/// [`OrderGateError::LicenseIssuance`].
#[async_trait]
pub trait LicenseIssuer: Send + Sync {
    /// Request a fresh token for `install_id`.
    async fn issue(&self, install_id: &str) -> Result<IssuedLicense, OrderGateError>;
}
