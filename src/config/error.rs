//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid API base URL format")]
    InvalidApiUrl,

    #[error("API base URL must use HTTPS in production")]
    ApiUrlMustBeHttps,

    #[error("Invalid real-time URL format")]
    InvalidRealtimeUrl,

    #[error("Real-time URL must use WSS in production")]
    RealtimeUrlMustBeSecure,

    #[error("Reconnect attempts must be at least 1")]
    InvalidReconnectAttempts,

    #[error("Credentials path must not be empty")]
    EmptyCredentialsPath,
}
