//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PORTFOLIO_CHAT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use portfolio_chat::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Proxy listening on {:?}", config.server.socket_addr());
//! ```

mod error;
mod relay;
mod server;
mod upstream;

pub use error::{ConfigError, ValidationError};
pub use relay::RelayConfig;
pub use server::{Environment, ServerConfig};
pub use upstream::UpstreamConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads. Load using
/// [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat backend configuration (keys, base URL)
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Relay configuration (proxy endpoint, turn timeout)
    #[serde(default)]
    pub relay: RelayConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PORTFOLIO_CHAT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PORTFOLIO_CHAT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PORTFOLIO_CHAT__UPSTREAM__API_KEY=...` -> `upstream.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PORTFOLIO_CHAT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Checks the bind address, timeouts, and URL schemes.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.upstream.validate()?;
        self.relay.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PORTFOLIO_CHAT__SERVER__PORT",
        "PORTFOLIO_CHAT__SERVER__ENVIRONMENT",
        "PORTFOLIO_CHAT__UPSTREAM__API_KEY",
        "PORTFOLIO_CHAT__UPSTREAM__BUSINESS_API_KEY",
        "PORTFOLIO_CHAT__UPSTREAM__BASE_URL",
        "PORTFOLIO_CHAT__RELAY__TIMEOUT_SECS",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.relay.timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_upstream_keys() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PORTFOLIO_CHAT__UPSTREAM__API_KEY", "app-default");
        env::set_var("PORTFOLIO_CHAT__UPSTREAM__BUSINESS_API_KEY", "app-business");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.upstream.api_key.as_deref(), Some("app-default"));
        assert_eq!(config.upstream.business_api_key.as_deref(), Some("app-business"));
        assert!(config.upstream.has_business_api_key());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PORTFOLIO_CHAT__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_custom_server_port_and_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PORTFOLIO_CHAT__SERVER__PORT", "3000");
        env::set_var("PORTFOLIO_CHAT__RELAY__TIMEOUT_SECS", "15");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.relay.timeout_secs, 15);
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PORTFOLIO_CHAT__UPSTREAM__BASE_URL", "api.dify.ai/v1");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }
}
