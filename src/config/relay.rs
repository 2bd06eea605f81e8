//! Stream relay configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::upstream::is_http_url;
use crate::adapters::transport::HttpTransportConfig;

/// Where the relay sends turns and how long it waits for them.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Proxy endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Whole-turn timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RelayConfig {
    /// Get turn timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the HTTP transport configuration.
    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig::new(self.endpoint.clone())
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_http_url(&self.endpoint) {
            return Err(ValidationError::InvalidUrl {
                field: "relay.endpoint",
                url: self.endpoint.clone(),
            });
        }
        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout("relay.timeout_secs"));
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080/api/chat".to_string()
}

fn default_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:8080/api/chat");
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_transport_config_uses_endpoint() {
        let config = RelayConfig {
            endpoint: "https://portfolio.example/api/chat".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.transport_config().endpoint,
            "https://portfolio.example/api/chat"
        );
    }

    #[test]
    fn test_validation_invalid_timeout() {
        let config = RelayConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidTimeout("relay.timeout_secs"))
        );
    }

    #[test]
    fn test_validation_invalid_endpoint() {
        let config = RelayConfig {
            endpoint: "/api/chat".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
