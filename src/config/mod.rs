//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `PAYBRIDGE` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use paybridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod error;
mod processor;
mod server;
mod settlement;

pub use error::{ConfigError, ValidationError};
pub use processor::ProcessorConfig;
pub use server::{Environment, ServerConfig};
pub use settlement::SettlementConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Payment processor API configuration
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Settlement behavior configuration
    #[serde(default)]
    pub settlement: SettlementConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `PAYBRIDGE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYBRIDGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYBRIDGE__PROCESSOR__TEST_PRIVATE_KEY=...` -> `processor.test_private_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYBRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.processor.validate()?;
        self.settlement.validate()?;
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

    fn set_minimal_env() {
        env::set_var("PAYBRIDGE__PROCESSOR__TEST_PRIVATE_KEY", "priv_test_xxx");
        env::set_var("PAYBRIDGE__PROCESSOR__WEBHOOK_SECRET", "whsec_xxx");
    }

    fn clear_env() {
        env::remove_var("PAYBRIDGE__PROCESSOR__TEST_PRIVATE_KEY");
        env::remove_var("PAYBRIDGE__PROCESSOR__WEBHOOK_SECRET");
        env::remove_var("PAYBRIDGE__SERVER__PORT");
        env::remove_var("PAYBRIDGE__SERVER__ENVIRONMENT");
        env::remove_var("PAYBRIDGE__SETTLEMENT__INSTANT_SETTLE");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.processor.test_private_key, "priv_test_xxx");
        assert!(config.processor.test_mode);
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok());
        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYBRIDGE__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_settlement_categories_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYBRIDGE__SETTLEMENT__INSTANT_SETTLE", "physical,fee");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        let policy = config.settlement.settle_policy().unwrap();
        assert!(policy.allows(crate::domain::order::LineCategory::Physical));
        assert!(policy.allows(crate::domain::order::LineCategory::Fee));
    }
}
