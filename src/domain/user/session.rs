//! Authentication material held by the client.

use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use super::UserProfile;

/// Access and refresh tokens. Both are redacted in `Debug` output.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    access_token: Secret<String>,
    refresh_token: Option<Secret<String>>,
}

impl AuthTokens {
    /// Creates a token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: refresh_token.map(Secret::new),
        }
    }

    /// Exposes the access token (for request headers).
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Exposes the refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Returns a copy with a new access token, keeping the refresh token
    /// unless a rotated one is supplied.
    pub fn rotated(&self, access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: refresh_token
                .map(Secret::new)
                .or_else(|| self.refresh_token.clone()),
        }
    }
}

/// Everything the client persists between runs: tokens plus the cached
/// user object.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub tokens: AuthTokens,
    pub user: Option<UserProfile>,
}

impl StoredSession {
    /// Creates a stored session.
    pub fn new(tokens: AuthTokens, user: Option<UserProfile>) -> Self {
        Self { tokens, user }
    }
}

/// Login form.
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Registration form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}
