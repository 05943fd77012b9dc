//! Real-time channel configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// WebSocket channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// WebSocket endpoint (`ws://` or `wss://`)
    pub url: String,

    /// Reconnect attempts before giving up
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Fixed delay between reconnect attempts
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// When false the client runs REST-only
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl RealtimeConfig {
    /// Creates an enabled config with default retry settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            enabled: default_enabled(),
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Validate the real-time configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("realtime.url"));
        }
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(ValidationError::InvalidRealtimeUrl);
        }
        if production && !self.url.starts_with("wss://") {
            return Err(ValidationError::RealtimeUrlMustBeSecure);
        }
        if self.max_reconnect_attempts == 0 {
            return Err(ValidationError::InvalidReconnectAttempts);
        }
        Ok(())
    }
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_enabled() -> bool {
    true
}
