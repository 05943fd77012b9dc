//! Community event endpoints.

use serde::de::IgnoredAny;

use crate::domain::community::{CommunityEvent, EventDraft};
use crate::domain::foundation::EventId;
use crate::ports::ApiError;

use super::client::{ApiClient, RequestBody};

/// `/events/*` endpoints.
#[derive(Debug, Clone)]
pub struct EventsClient {
    client: ApiClient,
}

impl EventsClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<CommunityEvent>, ApiError> {
        self.client.get("/events").await
    }

    pub async fn register(&self, event_id: &EventId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .request(
                reqwest::Method::POST,
                &format!("/events/{}/register", event_id),
                RequestBody::Empty,
            )
            .await?;
        Ok(())
    }

    pub async fn unregister(&self, event_id: &EventId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .delete(&format!("/events/{}/register", event_id))
            .await?;
        Ok(())
    }

    pub async fn create(&self, draft: &EventDraft) -> Result<CommunityEvent, ApiError> {
        draft
            .validate()
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        self.client.post("/events", draft).await
    }

    pub async fn update(
        &self,
        event_id: &EventId,
        draft: &EventDraft,
    ) -> Result<CommunityEvent, ApiError> {
        draft
            .validate()
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        self.client
            .put(&format!("/events/{}", event_id), draft)
            .await
    }

    pub async fn delete(&self, event_id: &EventId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .delete(&format!("/events/{}", event_id))
            .await?;
        Ok(())
    }
}
