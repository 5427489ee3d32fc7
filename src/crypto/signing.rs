//! Signed exchange request assembly.
//!
//! Signing injects `timestamp` and `recvWindow`, canonicalizes, then
//! computes the HMAC over the canonical string:
//! ```text
//! quantity=1&recvWindow=5000&side=BUY&symbol=BTCUSDT&timestamp=1499827319559&type=MARKET
//! ```
//! The `signature` parameter is attached afterwards and is never part of its
//! own input.

use crate::clock::TimeSynchronizer;
use crate::crypto::canonical::{build_query_string, sort_params};
use crate::crypto::mac::{hmac_sha256_hex, verify_hmac_sha256_hex, SigningKey};
use crate::OrderGateError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default tolerance between request timestamp and server receipt.
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5_000;

/// Largest recv window the exchange accepts; larger requests are clamped.
pub const MAX_RECV_WINDOW_MS: u64 = 60_000;

const TIMESTAMP: &str = "timestamp";
const RECV_WINDOW: &str = "recvWindow";
const SIGNATURE: &str = "signature";

/// Per-call signing options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Requested recv window. `None` or zero selects the default.
    pub recv_window_ms: Option<u64>,
}

impl SignOptions {
    /// Options with an explicit recv window.
    pub fn with_recv_window(recv_window_ms: u64) -> Self {
        Self {
            recv_window_ms: Some(recv_window_ms),
        }
    }

    /// The recv window that will actually be sent.
    pub fn effective_recv_window(&self) -> u64 {
        match self.recv_window_ms {
            Some(ms) if ms > 0 => ms.min(MAX_RECV_WINDOW_MS),
            _ => DEFAULT_RECV_WINDOW_MS,
        }
    }
}

/// A fully signed request.
///
/// Fields are private: the signature is always the one computed over the
/// query string held in the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedRequest {
    params: BTreeMap<String, String>,
    query_string: String,
    signature: String,
    timestamp: i64,
}

impl SignedRequest {
    /// All parameters keyed by name, including `signature`.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// The canonical string the signature was computed over.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Lowercase hex HMAC-SHA256.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Exchange timestamp in milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The recv window that was signed.
    pub fn recv_window(&self) -> Option<u64> {
        self.params.get(RECV_WINDOW).and_then(|v| v.parse().ok())
    }

    /// Wire form: canonical string followed by the signature parameter.
    pub fn to_signed_query(&self) -> String {
        if self.query_string.is_empty() {
            format!("{}={}", SIGNATURE, self.signature)
        } else {
            format!("{}&{}={}", self.query_string, SIGNATURE, self.signature)
        }
    }
}

/// Signs exchange requests against the synchronized exchange clock.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    time: Arc<TimeSynchronizer>,
}

impl RequestSigner {
    /// Create a signer reading timestamps from `time`.
    pub fn new(time: Arc<TimeSynchronizer>) -> Self {
        Self { time }
    }

    /// The time synchronizer used for timestamps.
    pub fn time_sync(&self) -> &TimeSynchronizer {
        &self.time
    }

    /// Sign an arbitrary parameter set.
    ///
    /// The caller's parameters are only read. Any `timestamp`, `recvWindow`
    /// or `signature` entries are replaced.
    ///
    /// # Errors
    /// * `Signing` - The secret is empty or the MAC could not be keyed
    pub fn sign_request<I, K, V>(
        &self,
        params: I,
        secret: &SigningKey,
        options: SignOptions,
    ) -> Result<SignedRequest, OrderGateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        self.sign_params(sort_params(params), secret, options)
    }

    /// Sign a new order.
    ///
    /// # Errors
    /// * `Validation` - `symbol`, `side` or `type` missing, or a `MARKET`
    ///   order without `quantity`/`quoteOrderQty`
    /// * `Signing` - See [`sign_request`](Self::sign_request)
    pub fn sign_order_request<I, K, V>(
        &self,
        params: I,
        secret: &SigningKey,
    ) -> Result<SignedRequest, OrderGateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        let params = sort_params(params);
        validate_order(&params)?;
        self.sign_params(params, secret, SignOptions::default())
    }

    /// Sign a cancel/replace request.
    ///
    /// # Errors
    /// * `Validation` - `symbol` missing, or neither `cancelOrderId` nor
    ///   `cancelOrigClientOrderId` present
    /// * `Signing` - See [`sign_request`](Self::sign_request)
    pub fn sign_cancel_replace_request<I, K, V>(
        &self,
        params: I,
        secret: &SigningKey,
    ) -> Result<SignedRequest, OrderGateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        let params = sort_params(params);
        validate_cancel_replace(&params)?;
        self.sign_params(params, secret, SignOptions::default())
    }

    /// Sign a position or account query. No shape validation.
    pub fn sign_position_request<I, K, V>(
        &self,
        params: I,
        secret: &SigningKey,
    ) -> Result<SignedRequest, OrderGateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        self.sign_request(params, secret, SignOptions::default())
    }

    /// Sign parameters as given, without injecting a timestamp or recv window.
    ///
    /// Used for authenticated stream messages that carry their own timestamp.
    pub fn sign_payload<I, K, V>(
        &self,
        params: I,
        secret: &SigningKey,
    ) -> Result<String, OrderGateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        let query = build_query_string(&sort_params(params));
        hmac_sha256_hex(secret, &query)
    }

    /// Check a signature over a canonical string. Never errors.
    pub fn verify_signature(&self, query: &str, signature_hex: &str, secret: &SigningKey) -> bool {
        verify_hmac_sha256_hex(secret, query, signature_hex)
    }

    /// Capture a parameter set for repeated submission.
    ///
    /// Each [`PreSignedRequest::produce`] signs again with a fresh timestamp.
    pub fn pre_sign<I, K, V>(
        &self,
        params: I,
        secret: &SigningKey,
        options: SignOptions,
    ) -> PreSignedRequest
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        PreSignedRequest {
            signer: self.clone(),
            params: sort_params(params),
            secret: secret.clone(),
            options,
        }
    }

    fn sign_params(
        &self,
        mut params: BTreeMap<String, String>,
        secret: &SigningKey,
        options: SignOptions,
    ) -> Result<SignedRequest, OrderGateError> {
        let timestamp = self.time.timestamp_ms();
        let recv_window = options.effective_recv_window();

        params.remove(SIGNATURE);
        params.insert(TIMESTAMP.to_string(), timestamp.to_string());
        params.insert(RECV_WINDOW.to_string(), recv_window.to_string());

        let query_string = build_query_string(&params);
        let signature = hmac_sha256_hex(secret, &query_string)?;

        tracing::debug!(
            param_count = params.len(),
            timestamp,
            recv_window,
            "signed exchange request"
        );

        params.insert(SIGNATURE.to_string(), signature.clone());

        Ok(SignedRequest {
            params,
            query_string,
            signature,
            timestamp,
        })
    }
}

/// A captured request that is re-signed on every call.
///
/// Holds its own copy of the secret; drop it when no longer needed.
#[derive(Debug, Clone)]
pub struct PreSignedRequest {
    signer: RequestSigner,
    params: BTreeMap<String, String>,
    secret: SigningKey,
    options: SignOptions,
}

impl PreSignedRequest {
    /// Sign the captured parameters with the current exchange time.
    pub fn produce(&self) -> Result<SignedRequest, OrderGateError> {
        self.signer
            .sign_params(self.params.clone(), &self.secret, self.options)
    }
}

fn has_value(params: &BTreeMap<String, String>, field: &str) -> bool {
    params.get(field).is_some_and(|v| !v.is_empty())
}

fn require_field(params: &BTreeMap<String, String>, field: &str) -> Result<(), OrderGateError> {
    if has_value(params, field) {
        Ok(())
    } else {
        Err(OrderGateError::Validation(format!(
            "Missing required field: {}",
            field
        )))
    }
}

fn validate_order(params: &BTreeMap<String, String>) -> Result<(), OrderGateError> {
    for field in ["symbol", "side", "type"] {
        require_field(params, field)?;
    }

    let is_market = params.get("type").is_some_and(|t| t == "MARKET");
    if is_market && !has_value(params, "quantity") && !has_value(params, "quoteOrderQty") {
        return Err(OrderGateError::Validation(
            "MARKET orders require quantity or quoteOrderQty".to_string(),
        ));
    }

    Ok(())
}

fn validate_cancel_replace(params: &BTreeMap<String, String>) -> Result<(), OrderGateError> {
    require_field(params, "symbol")?;

    if !has_value(params, "cancelOrderId") && !has_value(params, "cancelOrigClientOrderId") {
        return Err(OrderGateError::Validation(
            "Missing required field: cancelOrderId or cancelOrigClientOrderId".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::crypto::mac::hmac_sha256_hex;

    const NOW_MS: i64 = 1_499_827_319_559;

    fn signer() -> RequestSigner {
        let clock = Arc::new(MockClock::from_millis(NOW_MS));
        RequestSigner::new(Arc::new(TimeSynchronizer::new(clock)))
    }

    fn secret() -> SigningKey {
        SigningKey::from("NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j")
    }

    #[test]
    fn test_sign_injects_timestamp_and_recv_window() {
        let signed = signer()
            .sign_request([("symbol", "LTCBTC")], &secret(), SignOptions::default())
            .unwrap();

        assert_eq!(signed.timestamp(), NOW_MS);
        assert_eq!(
            signed.query_string(),
            "recvWindow=5000&symbol=LTCBTC&timestamp=1499827319559"
        );
        assert_eq!(signed.recv_window(), Some(DEFAULT_RECV_WINDOW_MS));
    }

    #[test]
    fn test_signature_covers_query_string() {
        let signed = signer()
            .sign_request([("symbol", "LTCBTC"), ("side", "BUY")], &secret(), SignOptions::default())
            .unwrap();

        let expected = hmac_sha256_hex(&secret(), signed.query_string()).unwrap();
        assert_eq!(signed.signature(), expected);
        assert_eq!(signed.params().get("signature"), Some(&expected));
        assert!(!signed.query_string().contains("signature="));
    }

    #[test]
    fn test_recv_window_clamped() {
        let signed = signer()
            .sign_request(
                [("symbol", "BTCUSDT")],
                &secret(),
                SignOptions::with_recv_window(999_999),
            )
            .unwrap();
        assert_eq!(signed.recv_window(), Some(60_000));
        assert!(signed.query_string().contains("recvWindow=60000"));
    }

    #[test]
    fn test_recv_window_within_cap_kept() {
        let options = SignOptions::with_recv_window(10_000);
        assert_eq!(options.effective_recv_window(), 10_000);
    }

    #[test]
    fn test_zero_recv_window_uses_default() {
        let options = SignOptions::with_recv_window(0);
        assert_eq!(options.effective_recv_window(), DEFAULT_RECV_WINDOW_MS);
    }

    #[test]
    fn test_caller_params_not_mutated() {
        let mut params = BTreeMap::new();
        params.insert("symbol".to_string(), "BTCUSDT".to_string());
        let before = params.clone();

        let signed = signer()
            .sign_request(&params, &secret(), SignOptions::default())
            .unwrap();

        assert_eq!(params, before);
        assert!(signed.params().contains_key("timestamp"));
    }

    #[test]
    fn test_caller_signature_discarded() {
        let signed = signer()
            .sign_request(
                [("symbol", "BTCUSDT"), ("signature", "forged")],
                &secret(),
                SignOptions::default(),
            )
            .unwrap();
        assert!(!signed.query_string().contains("forged"));
        assert_ne!(signed.signature(), "forged");
    }

    #[test]
    fn test_offset_applied_to_timestamp() {
        let signer = signer();
        signer.time_sync().set_offset(-500);
        let signed = signer
            .sign_request([("symbol", "BTCUSDT")], &secret(), SignOptions::default())
            .unwrap();
        assert_eq!(signed.timestamp(), NOW_MS - 500);
    }

    #[test]
    fn test_empty_secret_fails() {
        let result = signer().sign_request(
            [("symbol", "BTCUSDT")],
            &SigningKey::from(""),
            SignOptions::default(),
        );
        assert!(matches!(result, Err(OrderGateError::Signing(_))));
    }

    #[test]
    fn test_market_order_requires_quantity() {
        let result = signer().sign_order_request(
            [("symbol", "BTCUSDT"), ("side", "BUY"), ("type", "MARKET")],
            &secret(),
        );
        assert!(matches!(result, Err(OrderGateError::Validation(_))));

        let signed = signer()
            .sign_order_request(
                [
                    ("symbol", "BTCUSDT"),
                    ("side", "BUY"),
                    ("type", "MARKET"),
                    ("quantity", "1"),
                ],
                &secret(),
            )
            .unwrap();
        assert!(signed.query_string().contains("quantity=1"));
    }

    #[test]
    fn test_market_order_accepts_quote_qty() {
        let result = signer().sign_order_request(
            [
                ("symbol", "BTCUSDT"),
                ("side", "BUY"),
                ("type", "MARKET"),
                ("quoteOrderQty", "25"),
            ],
            &secret(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_order_missing_side() {
        let result = signer().sign_order_request(
            [("symbol", "BTCUSDT"), ("side", ""), ("type", "LIMIT")],
            &secret(),
        );
        match result {
            Err(OrderGateError::Validation(msg)) => assert!(msg.contains("side")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_limit_order_without_quantity_passes_validation() {
        let result = signer().sign_order_request(
            [("symbol", "BTCUSDT"), ("side", "SELL"), ("type", "LIMIT")],
            &secret(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_validation_runs_before_signing() {
        // Empty secret would fail signing; validation must win.
        let result = signer().sign_order_request([("symbol", "BTCUSDT")], &SigningKey::from(""));
        assert!(matches!(result, Err(OrderGateError::Validation(_))));
    }

    #[test]
    fn test_cancel_replace_validation() {
        let s = signer();
        assert!(matches!(
            s.sign_cancel_replace_request([("cancelOrderId", "1")], &secret()),
            Err(OrderGateError::Validation(_))
        ));
        assert!(matches!(
            s.sign_cancel_replace_request([("symbol", "BTCUSDT")], &secret()),
            Err(OrderGateError::Validation(_))
        ));
        assert!(s
            .sign_cancel_replace_request(
                [("symbol", "BTCUSDT"), ("cancelOrigClientOrderId", "abc")],
                &secret()
            )
            .is_ok());
    }

    #[test]
    fn test_pre_signed_request_resigns_each_time() {
        let time = Arc::new(TimeSynchronizer::new(Arc::new(MockClock::from_millis(NOW_MS))));
        let signer = RequestSigner::new(time.clone());
        let pre = signer.pre_sign([("symbol", "BTCUSDT")], &secret(), SignOptions::default());

        let first = pre.produce().unwrap();
        time.set_offset(1);
        let second = pre.produce().unwrap();

        assert_eq!(second.timestamp(), first.timestamp() + 1);
        assert_ne!(first.signature(), second.signature());
    }

    #[test]
    fn test_sign_payload_has_no_injection() {
        let s = signer();
        let sig = s.sign_payload([("b", "2"), ("a", "1")], &secret()).unwrap();
        assert_eq!(sig, hmac_sha256_hex(&secret(), "a=1&b=2").unwrap());
    }

    #[test]
    fn test_verify_signature() {
        let s = signer();
        let signed = s
            .sign_request([("symbol", "BTCUSDT")], &secret(), SignOptions::default())
            .unwrap();
        assert!(s.verify_signature(signed.query_string(), signed.signature(), &secret()));
        assert!(!s.verify_signature(signed.query_string(), signed.signature(), &SigningKey::from("other")));
    }

    #[test]
    fn test_signed_query_wire_form() {
        let signed = signer()
            .sign_request([("symbol", "BTCUSDT")], &secret(), SignOptions::default())
            .unwrap();
        let wire = signed.to_signed_query();
        assert!(wire.starts_with(signed.query_string()));
        assert!(wire.ends_with(&format!("&signature={}", signed.signature())));
    }
}
