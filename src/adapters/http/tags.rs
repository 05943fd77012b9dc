//! Tag endpoints.

use serde::de::IgnoredAny;

use crate::domain::community::{Tag, TagDraft};
use crate::domain::foundation::TagId;
use crate::ports::ApiError;

use super::client::ApiClient;

/// `/tags/*` endpoints.
#[derive(Debug, Clone)]
pub struct TagsClient {
    client: ApiClient,
}

impl TagsClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Tag>, ApiError> {
        self.client.get("/tags").await
    }

    pub async fn create(&self, draft: &TagDraft) -> Result<Tag, ApiError> {
        draft
            .validate()
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        self.client.post("/tags", draft).await
    }

    pub async fn update(&self, tag_id: &TagId, draft: &TagDraft) -> Result<Tag, ApiError> {
        draft
            .validate()
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        self.client.put(&format!("/tags/{}", tag_id), draft).await
    }

    pub async fn delete(&self, tag_id: &TagId) -> Result<(), ApiError> {
        let _: IgnoredAny = self.client.delete(&format!("/tags/{}", tag_id)).await?;
        Ok(())
    }
}
