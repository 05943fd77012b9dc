//! Authentication endpoints.
//!
//! Login and registration write the returned tokens into the credential
//! store; logout only clears it locally.

use std::sync::Arc;

use serde::de::IgnoredAny;

use crate::domain::user::{AuthTokens, LoginCredentials, Registration, StoredSession};
use crate::ports::{ApiError, CredentialStore};

use super::client::ApiClient;
use super::dto::{AuthResponse, VerifyRequest};

/// `/auth/*` endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: ApiClient,
}

impl AuthClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn credentials(&self) -> &Arc<dyn CredentialStore> {
        self.client.credentials()
    }

    /// Creates an account and signs in.
    pub async fn register(&self, registration: &Registration) -> Result<StoredSession, ApiError> {
        let response: AuthResponse = self.client.post("/auth/register", registration).await?;
        self.store(response).await
    }

    /// Signs in with email and password.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<StoredSession, ApiError> {
        let response: AuthResponse = self.client.post("/auth/login", credentials).await?;
        let session = self.store(response).await?;
        tracing::info!(
            user_id = session.user.as_ref().map(|u| u.id.as_str()).unwrap_or("unknown"),
            "signed in"
        );
        Ok(session)
    }

    /// Rotates the access token using the stored refresh token.
    pub async fn refresh(&self) -> Result<StoredSession, ApiError> {
        self.client.refresh().await
    }

    /// Confirms an email verification token.
    pub async fn verify(&self, token: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .post("/auth/verify", &VerifyRequest { token })
            .await?;
        Ok(())
    }

    /// Forgets the stored session.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.credentials()
            .clear()
            .await
            .map_err(|e| ApiError::Credentials(e.to_string()))?;
        tracing::info!("signed out");
        Ok(())
    }

    async fn store(&self, response: AuthResponse) -> Result<StoredSession, ApiError> {
        let session = StoredSession::new(
            AuthTokens::new(response.access_token, response.refresh_token),
            response.user,
        );
        self.credentials()
            .save(&session)
            .await
            .map_err(|e| ApiError::Credentials(e.to_string()))?;
        Ok(session)
    }
}
