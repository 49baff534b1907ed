//! Provider configuration and endpoint selection

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cluster::DEFAULT_API_VERSION;

/// Public Azure Resource Manager endpoint
pub const RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";

/// Local resource provider used in development mode
pub const DEVELOPMENT_ENDPOINT: &str = "https://localhost:8443";

/// Which resource provider deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpMode {
    #[default]
    Production,
    /// Local test double with a self-signed certificate
    Development,
}

impl RpMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpMode::Production => "production",
            RpMode::Development => "development",
        }
    }
}

/// Settings for [`crate::AroProvider`]
#[derive(Clone)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub access_token: String,
    /// Explicit base URL, wins over the one implied by `rp_mode`
    pub endpoint: Option<String>,
    pub rp_mode: RpMode,
    pub api_version: String,
    /// Total time allowed for a write, long-running operation included
    pub request_timeout: Duration,
    /// Delay between long-running operation status checks
    pub lro_poll_interval: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("subscription_id", &self.subscription_id)
            .field("endpoint", &self.endpoint)
            .field("rp_mode", &self.rp_mode)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    pub fn new(subscription_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            access_token: access_token.into(),
            endpoint: None,
            rp_mode: RpMode::Production,
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(600),
            lro_poll_interval: Duration::from_secs(30),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_rp_mode(mut self, rp_mode: RpMode) -> Self {
        self.rp_mode = rp_mode;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Base URL for all requests
    pub fn base_url(&self) -> &str {
        match (&self.endpoint, self.rp_mode) {
            (Some(endpoint), _) => endpoint.as_str(),
            (None, RpMode::Development) => DEVELOPMENT_ENDPOINT,
            (None, RpMode::Production) => RESOURCE_MANAGER_ENDPOINT,
        }
    }

    /// TLS verification is off only against the development resource provider
    pub fn verify_tls(&self) -> bool {
        self.rp_mode != RpMode::Development
    }
}
