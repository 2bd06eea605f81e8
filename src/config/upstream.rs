//! Upstream chat backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::upstream::DifyConfig;

/// Credentials and location of the conversational-AI backend.
///
/// Keys are plain strings here and become `Secret`s once handed to the
/// client via [`UpstreamConfig::dify_config`].
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Default API key
    pub api_key: Option<String>,

    /// API key for the business context; falls back to `api_key`
    pub business_api_key: Option<String>,

    /// Backend base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User identifier sent when the request carries none
    #[serde(default = "default_user")]
    pub default_user: String,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl UpstreamConfig {
    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Check if the default key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Check if a dedicated business key is configured
    pub fn has_business_api_key(&self) -> bool {
        self.business_api_key
            .as_ref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Build the client configuration.
    pub fn dify_config(&self) -> DifyConfig {
        let mut config = DifyConfig::new()
            .with_base_url(self.base_url.clone())
            .with_default_user(self.default_user.clone())
            .with_connect_timeout(self.connect_timeout());
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        if let Some(key) = &self.business_api_key {
            config = config.with_business_api_key(key.clone());
        }
        config
    }

    /// Validate upstream configuration
    ///
    /// A missing key is not an error here; the proxy answers 500 per request.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_http_url(&self.base_url) {
            return Err(ValidationError::InvalidUrl {
                field: "upstream.base_url",
                url: self.base_url.clone(),
            });
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("upstream.connect_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            business_api_key: None,
            base_url: default_base_url(),
            default_user: default_user(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

pub(super) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn default_base_url() -> String {
    "https://api.dify.ai/v1".to_string()
}

fn default_user() -> String {
    "default-user".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}
