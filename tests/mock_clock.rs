//! Clock injection through the `test-seams` feature.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ordergate::protocol::models::IssuedLicense;
use ordergate::{
    EntitlementTokenStore, LicenseIssuer, MemoryStorage, MockClock, OrderGateError, RequestSigner,
    SignOptions, SigningKey, TimeSynchronizer,
};
use std::sync::Arc;

const START_MS: i64 = 1_736_942_400_000;

struct OfflineIssuer;

#[async_trait]
impl LicenseIssuer for OfflineIssuer {
    async fn issue(&self, _install_id: &str) -> Result<IssuedLicense, OrderGateError> {
        Err(OrderGateError::LicenseIssuance("offline".to_string()))
    }
}

fn store_at(clock: MockClock) -> EntitlementTokenStore {
    EntitlementTokenStore::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(OfflineIssuer),
        Arc::new(clock),
    )
}

#[test]
fn advancing_clock_crosses_expiry_skew() {
    let exp = START_MS / 1000 + 60;
    let token = format!(
        "h.{}.s",
        URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp))
    );

    let mut clock = MockClock::from_millis(START_MS);
    assert!(!store_at(clock.clone()).is_expired(&token));

    clock.advance(chrono::Duration::seconds(29));
    assert!(!store_at(clock.clone()).is_expired(&token));

    clock.advance(chrono::Duration::seconds(1));
    assert!(store_at(clock).is_expired(&token));
}

#[test]
fn signer_uses_injected_clock_plus_offset() {
    let time = Arc::new(TimeSynchronizer::new(Arc::new(MockClock::from_millis(START_MS))));
    time.set_offset(250);
    let signer = RequestSigner::new(time);

    let signed = signer
        .sign_request([("symbol", "BTCUSDT")], &SigningKey::from("k"), SignOptions::default())
        .unwrap();
    assert_eq!(signed.timestamp(), START_MS + 250);
    assert!(signed
        .query_string()
        .contains(&format!("timestamp={}", START_MS + 250)));
}
