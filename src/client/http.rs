//! Reqwest-based HTTP client for the license server.
//!
//! Endpoints:
//! - `POST /api/license/issue` with `{installId}` returns `{token, expiresAt, plan, scopes}`
//! - `GET /api/license/status?installId=...` returns `{active, plan, scopes}`

use crate::client::LicenseIssuer;
use crate::config::OrderGateConfig;
use crate::crypto::canonical::encode_component;
use crate::protocol::models::{
    parse_issued_license, parse_license_status, IssueRequest, IssuedLicense, LicenseStatus,
};
use crate::OrderGateError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;

/// License server HTTP client.
#[derive(Debug, Clone)]
pub struct HttpLicenseClient {
    client: Client,
    user_agent: String,
    base_url: String,
}

impl HttpLicenseClient {
    /// Create a new client from config.
    pub fn new(config: &OrderGateConfig) -> Result<Self, OrderGateError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| OrderGateError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_agent: build_user_agent(config),
            base_url: config.license_server_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the issue endpoint.
    pub fn issue_url(&self) -> String {
        format!("{}/api/license/issue", self.base_url)
    }

    /// URL of the status endpoint for `install_id`.
    pub fn status_url(&self, install_id: &str) -> String {
        format!(
            "{}/api/license/status?installId={}",
            self.base_url,
            encode_component(install_id)
        )
    }

    /// Request a new token for an installation.
    ///
    /// # Errors
    /// * `LicenseIssuance` - Transport failure, non-2xx status, or a body
    ///   without a token
    pub async fn issue_token(&self, install_id: &str) -> Result<IssuedLicense, OrderGateError> {
        let response = self
            .client
            .post(self.issue_url())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .json(&IssueRequest { install_id })
            .send()
            .await
            .map_err(|e| OrderGateError::LicenseIssuance(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| OrderGateError::LicenseIssuance(format!("Failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(OrderGateError::LicenseIssuance(format!(
                "License issue failed ({}): {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            )));
        }

        parse_issued_license(&body)
    }

    /// Query subscription status server-side.
    ///
    /// # Errors
    /// * `LicenseIssuance` - Transport failure or non-2xx status
    /// * `ProtocolError` - Body is not a status document
    pub async fn status(&self, install_id: &str) -> Result<LicenseStatus, OrderGateError> {
        let response = self
            .client
            .get(self.status_url(install_id))
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| OrderGateError::LicenseIssuance(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| OrderGateError::LicenseIssuance(format!("Failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(OrderGateError::LicenseIssuance(format!(
                "License status failed ({}): {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            )));
        }

        parse_license_status(&body)
    }

    /// Get the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LicenseIssuer for HttpLicenseClient {
    async fn issue(&self, install_id: &str) -> Result<IssuedLicense, OrderGateError> {
        self.issue_token(install_id).await
    }
}

/// Build a User-Agent string from config.
///
/// Format: `<product>/ordergate-<version>`
pub fn build_user_agent(config: &OrderGateConfig) -> String {
    format!(
        "{}/ordergate-{}",
        config.user_agent_product,
        env!("CARGO_PKG_VERSION")
    )
}
