//! Order signing example.
//!
//! Demonstrates the core workflow: check the entitlement gate, then sign a
//! market order against the exchange clock.
//!
//! # Running
//!
//! ```bash
//! export BINANCE_API_SECRET="your-api-secret"
//! cargo run --example sign_order
//! ```
//!
//! # Note
//!
//! The license server URL and checkout URLs should be compile-time constants
//! in your binary, not loaded from environment variables.

use ordergate::{
    EntitlementGate, OrderGateConfig, OrderGateError, RequestSigner, SigningKey, TimeSynchronizer,
};
use std::sync::Arc;

const LICENSE_SERVER_URL: &str = "https://license.example.com";

#[tokio::main]
async fn main() {
    // The API secret CAN come from environment/config
    let secret = match std::env::var("BINANCE_API_SECRET") {
        Ok(s) => SigningKey::from(s),
        Err(_) => {
            eprintln!("Set BINANCE_API_SECRET environment variable");
            std::process::exit(1);
        }
    };

    let config = OrderGateConfig {
        enforce_subscription: std::env::var("ENFORCE_SUBSCRIPTION").is_ok(),
        license_server_url: LICENSE_SERVER_URL,
        storage_namespace: "ordergate-demo",
        user_agent_product: "ordergate-demo",
        ..OrderGateConfig::default()
    };

    let gate = match EntitlementGate::from_config(config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Best effort: a stale token is replaced, a failure leaves it alone
    if let Err(e) = gate.store().refresh_if_needed().await {
        eprintln!("Token refresh failed: {}", e);
    }

    match gate.require_allowed().await {
        Ok(()) => {}
        Err(OrderGateError::Entitlement { install_id }) => {
            eprintln!("Mainnet trading requires a subscription (installId: {})", install_id);
            if let Ok(url) = gate.checkout_url().await {
                eprintln!("Upgrade at: {}", url);
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Entitlement check failed: {}", e);
            std::process::exit(1);
        }
    }

    // Call sync_from_round_trip after a server time request when clocks drift
    let signer = RequestSigner::new(Arc::new(TimeSynchronizer::system()));

    match signer.sign_order_request(
        [
            ("symbol", "BTCUSDT"),
            ("side", "BUY"),
            ("type", "MARKET"),
            ("quoteOrderQty", "25"),
        ],
        &secret,
    ) {
        Ok(signed) => {
            println!("✓ Signed order");
            println!("  Timestamp: {}", signed.timestamp());
            println!("  Recv window: {:?}", signed.recv_window());
            println!("  POST /api/v3/order?{}", signed.to_signed_query());
        }
        Err(e) => {
            eprintln!("Signing error: {}", e);
            std::process::exit(1);
        }
    }
}
