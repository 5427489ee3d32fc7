//! Ordergate error types.

use thiserror::Error;

/// Errors that can occur while signing requests or checking entitlements.
#[derive(Debug, Error)]
pub enum OrderGateError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Caller supplied an incomplete parameter set for a specific request type.
    ///
    /// Raised before any cryptographic or network work happens.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The HMAC primitive rejected the key or the secret is empty.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The license server could not issue a token (network, non-2xx, or bad body).
    #[error("License issuance failed: {0}")]
    LicenseIssuance(String),

    /// A privileged operation was attempted while the entitlement gate denies it.
    #[error("Paid subscription required for real trading (installId: {install_id})")]
    Entitlement {
        /// Install identity to quote in a support request.
        install_id: String,
    },

    /// Durable storage I/O error.
    #[error("Storage I/O error: {0}")]
    StorageIO(String),

    /// Failed to parse a license server response.
    #[error("Protocol error: {0}")]
    ProtocolError(String),
}
