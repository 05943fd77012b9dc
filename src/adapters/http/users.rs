//! User profile endpoints. Also serves as the participant resolver's
//! `UserDirectory`.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::user::{ProfileUpdate, StoredSession, UserProfile};
use crate::ports::{ApiError, UserDirectory};

use super::client::{ApiClient, FilePart, RequestBody};

/// `/users/*` endpoints.
#[derive(Debug, Clone)]
pub struct UsersClient {
    client: ApiClient,
}

impl UsersClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, ApiError> {
        self.client.get(&format!("/users/{}", user_id)).await
    }

    /// Fetches the signed-in user and refreshes the cached copy.
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let user: UserProfile = self.client.get("/users/me").await?;
        self.cache_user(&user).await?;
        Ok(user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let user: UserProfile = self.client.put("/users/me", update).await?;
        self.cache_user(&user).await?;
        Ok(user)
    }

    /// Uploads a new avatar as `multipart/form-data` (field `avatar`).
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UserProfile, ApiError> {
        let body = RequestBody::file(FilePart::new("avatar", file_name, content_type, bytes));
        let user: UserProfile = self
            .client
            .request(reqwest::Method::POST, "/users/me/avatar", body)
            .await?;
        self.cache_user(&user).await?;
        Ok(user)
    }

    async fn cache_user(&self, user: &UserProfile) -> Result<(), ApiError> {
        let credentials = self.client.credentials();
        let current = credentials
            .load()
            .await
            .map_err(|e| ApiError::Credentials(e.to_string()))?;

        if let Some(session) = current {
            credentials
                .save(&StoredSession::new(session.tokens, Some(user.clone())))
                .await
                .map_err(|e| ApiError::Credentials(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for UsersClient {
    async fn fetch_user(&self, user_id: &UserId) -> Result<UserProfile, ApiError> {
        self.get_user(user_id).await
    }
}
