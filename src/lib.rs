//! # Ordergate
//!
//! **Binance request signing and subscription gating for trading clients.**
//!
//! Ordergate produces HMAC-SHA256 signed query strings for the Binance REST
//! API against a synchronized exchange clock, and decides whether real-money
//! trading is permitted from a locally stored entitlement token.
//!
//! ## Features
//!
//! - **Canonical signing**: parameters sorted by key, percent-encoded, signed as lowercase hex
//! - **Exchange time sync**: additive clock offset applied to every timestamp
//! - **Recv window handling**: default 5000 ms, clamped to the 60000 ms exchange cap
//! - **Pre-signed requests**: capture parameters once, re-sign with a fresh timestamp per send
//! - **Entitlement gate**: open mode for development, enforced mode requiring the `mainnet` scope
//! - **Token refresh**: single-flight reissue from the license server when expired
//!
//! ## Quickstart
//!
//! ```no_run
//! use ordergate::{
//!     EntitlementGate, OrderGateConfig, RequestSigner, SigningKey, TimeSynchronizer,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), ordergate::OrderGateError> {
//! let config = OrderGateConfig {
//!     enforce_subscription: true,
//!     license_server_url: "https://license.example.com",
//!     storage_namespace: "my-trading-desk",
//!     ..OrderGateConfig::default()
//! };
//!
//! let gate = EntitlementGate::from_config(config)?;
//! gate.store().refresh_if_needed().await?;
//! gate.require_allowed().await?;
//!
//! let signer = RequestSigner::new(Arc::new(TimeSynchronizer::system()));
//! let secret = SigningKey::from("api-secret");
//! let signed = signer.sign_order_request(
//!     [("symbol", "BTCUSDT"), ("side", "BUY"), ("type", "MARKET"), ("quantity", "0.01")],
//!     &secret,
//! )?;
//! println!("POST /api/v3/order?{}", signed.to_signed_query());
//! # Ok(())
//! # }
//! ```
//!
//! ## Threat Model
//!
//! Entitlement tokens are decoded **without** signature verification. The
//! local gate is a user-experience check only: the license server must
//! verify the token before honoring any privileged action.
//!
//! API secrets are held in [`SigningKey`], which zeroizes on drop and never
//! prints its contents. Neither secrets nor tokens are logged.
//!
//! ## Configuration
//!
//! - `enforce_subscription`: the single switch between open and enforced gating
//! - `license_server_url`: base URL of the issue and status endpoints
//! - `checkout_provider`: which hosted checkout the upgrade link points at
//! - `storage_namespace`: directory name for the persisted token and install id
//!
//! See [`OrderGateConfig`] for full documentation.

#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/ordergate/0.1.0")]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Persistence layer
pub mod store;

// Policy layer
pub mod policy;

// Gate (main public API)
pub mod gate;

// Re-exports for public API
pub use client::http::HttpLicenseClient;
pub use client::LicenseIssuer;
pub use clock::{offset_from_round_trip, Clock, SystemClock, TimeSynchronizer};
pub use config::{CheckoutProvider, OrderGateConfig};
pub use crypto::canonical::{canonicalize, CanonicalParams};
pub use crypto::mac::SigningKey;
pub use crypto::signing::{PreSignedRequest, RequestSigner, SignOptions, SignedRequest};
pub use errors::OrderGateError;
pub use gate::EntitlementGate;
pub use policy::access::{GateMode, SCOPE_MAINNET, SCOPE_MULTI_PROFILE};
pub use protocol::models::EntitlementState;
pub use store::file::FileStorage;
pub use store::storage::{KeyValueStorage, MemoryStorage};
pub use store::token_store::EntitlementTokenStore;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
