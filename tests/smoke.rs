//! Basic smoke test to verify the public surface is exported.

#[test]
fn crate_compiles() {
    // If this test runs, the crate skeleton is valid.
    let _ = std::any::type_name::<ordergate::OrderGateConfig>();
    let _ = std::any::type_name::<ordergate::OrderGateError>();
    let _ = std::any::type_name::<ordergate::RequestSigner>();
    let _ = std::any::type_name::<ordergate::EntitlementGate>();
}

#[test]
fn default_config_is_valid_and_open() {
    let config = ordergate::OrderGateConfig::default();
    assert!(config.validate().is_ok());
    assert!(!config.enforce_subscription);
    assert_eq!(
        ordergate::GateMode::from_flag(config.enforce_subscription),
        ordergate::GateMode::Open
    );
}
