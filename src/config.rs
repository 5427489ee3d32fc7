//! Ordergate configuration.

use std::time::Duration;

/// Hosted checkout provider used for the upgrade link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutProvider {
    /// Stripe hosted checkout.
    #[default]
    Stripe,
    /// Paddle hosted checkout.
    Paddle,
}

/// Configuration for signing and entitlement gating.
///
/// URLs are `&'static str` so products can bake them in as constants.
#[derive(Debug, Clone)]
pub struct OrderGateConfig {
    /// When `false` the entitlement gate is open and never inspects tokens.
    ///
    /// Flip to `true` once real billing is connected. This is the only
    /// switch between the two gate modes.
    pub enforce_subscription: bool,

    /// License server base URL, e.g. `https://license.example.com`.
    pub license_server_url: &'static str,

    /// Which checkout provider the upgrade link points at.
    pub checkout_provider: CheckoutProvider,

    /// Stripe hosted checkout base URL.
    pub stripe_checkout_url: &'static str,

    /// Paddle hosted checkout base URL.
    pub paddle_checkout_url: &'static str,

    /// Namespace directory for the file-backed token store.
    pub storage_namespace: &'static str,

    /// User-Agent product identifier sent to the license server.
    pub user_agent_product: &'static str,

    /// Timeout for license server requests.
    pub request_timeout: Duration,
}

impl Default for OrderGateConfig {
    fn default() -> Self {
        Self {
            enforce_subscription: false,
            license_server_url: "https://your-license-server.example",
            checkout_provider: CheckoutProvider::Stripe,
            stripe_checkout_url: "https://your-stripe-checkout.example/checkout",
            paddle_checkout_url: "https://your-paddle-checkout.example/checkout",
            storage_namespace: "ordergate",
            user_agent_product: "ordergate",
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl OrderGateConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::OrderGateError> {
        if !is_http_url(self.license_server_url) {
            return Err(crate::OrderGateError::ConfigError(format!(
                "license_server_url must be an http(s) URL, got {:?}",
                self.license_server_url
            )));
        }
        if !is_http_url(self.checkout_base_url()) {
            return Err(crate::OrderGateError::ConfigError(format!(
                "checkout URL for {:?} must be an http(s) URL",
                self.checkout_provider
            )));
        }
        if self.storage_namespace.is_empty() {
            return Err(crate::OrderGateError::ConfigError(
                "storage_namespace cannot be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(crate::OrderGateError::ConfigError(
                "request_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Checkout base URL for the configured provider.
    pub fn checkout_base_url(&self) -> &'static str {
        match self.checkout_provider {
            CheckoutProvider::Stripe => self.stripe_checkout_url,
            CheckoutProvider::Paddle => self.paddle_checkout_url,
        }
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderGateError;

    #[test]
    fn default_config_is_valid_and_open() {
        let config = OrderGateConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.enforce_subscription);
        assert_eq!(config.checkout_provider, CheckoutProvider::Stripe);
    }

    #[test]
    fn checkout_base_follows_provider() {
        let mut config = OrderGateConfig::default();
        assert_eq!(config.checkout_base_url(), config.stripe_checkout_url);
        config.checkout_provider = CheckoutProvider::Paddle;
        assert_eq!(config.checkout_base_url(), config.paddle_checkout_url);
    }

    #[test]
    fn rejects_non_http_license_server() {
        let config = OrderGateConfig {
            license_server_url: "ftp://license.example",
            ..OrderGateConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OrderGateError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_empty_namespace() {
        let config = OrderGateConfig {
            storage_namespace: "",
            ..OrderGateConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OrderGateError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = OrderGateConfig {
            request_timeout: Duration::ZERO,
            ..OrderGateConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
