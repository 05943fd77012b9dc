//! Client configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `COOP_CLIENT` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use coop_client::config::ClientConfig;
//!
//! let config = ClientConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("API at {}", config.api.base_url());
//! ```

mod api;
mod error;
mod realtime;
mod storage;

pub use api::{ApiConfig, Environment};
pub use error::{ConfigError, ValidationError};
pub use realtime::RealtimeConfig;
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// REST API (base URL, timeout, environment)
    pub api: ApiConfig,

    /// Real-time WebSocket channel
    pub realtime: RealtimeConfig,

    /// Local session persistence
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present
    /// 2. Reads variables with the `COOP_CLIENT` prefix
    /// 3. Uses `__` to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `COOP_CLIENT__API__BASE_URL=...` -> `api.base_url = ...`
    /// - `COOP_CLIENT__REALTIME__MAX_RECONNECT_ATTEMPTS=3`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COOP_CLIENT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.api.validate()?;
        self.realtime.validate(self.is_production())?;
        self.storage.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.api.is_production()
    }
}
