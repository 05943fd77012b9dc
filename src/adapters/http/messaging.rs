//! REST implementation of the `MessagingApi` port.

use async_trait::async_trait;
use serde::de::IgnoredAny;

use crate::domain::foundation::{MessageId, ThreadId, UserId};
use crate::domain::messaging::{Message, ThreadSummary};
use crate::ports::{ApiError, MessagingApi};

use super::client::ApiClient;
use super::dto::{MarkReadRequest, MessageDto, SendMessageRequest, StartThreadRequest, ThreadDto};

/// Messaging endpoints under `/messages/threads`.
#[derive(Debug, Clone)]
pub struct HttpMessagingApi {
    client: ApiClient,
}

impl HttpMessagingApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessagingApi for HttpMessagingApi {
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>, ApiError> {
        let threads: Vec<ThreadDto> = self.client.get("/messages/threads").await?;
        threads.into_iter().map(ThreadSummary::try_from).collect()
    }

    async fn start_thread(&self, peer_id: &UserId) -> Result<ThreadSummary, ApiError> {
        let thread: ThreadDto = self
            .client
            .post(
                "/messages/threads",
                &StartThreadRequest {
                    participant_id: peer_id.as_str(),
                },
            )
            .await?;
        ThreadSummary::try_from(thread)
    }

    async fn fetch_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, ApiError> {
        let path = format!("/messages/threads/{}/messages", thread_id);
        let messages: Vec<MessageDto> = self.client.get(&path).await?;
        messages.into_iter().map(Message::try_from).collect()
    }

    async fn send_message(&self, thread_id: &ThreadId, text: &str) -> Result<Message, ApiError> {
        let path = format!("/messages/threads/{}/messages", thread_id);
        let message: MessageDto = self
            .client
            .post(&path, &SendMessageRequest { text })
            .await?;
        Message::try_from(message)
    }

    async fn mark_read(
        &self,
        thread_id: &ThreadId,
        last_seen: Option<&MessageId>,
    ) -> Result<(), ApiError> {
        let path = format!("/messages/threads/{}/read", thread_id);
        let _: IgnoredAny = self
            .client
            .post(
                &path,
                &MarkReadRequest {
                    last_seen_message_id: last_seen.and_then(MessageId::as_server),
                },
            )
            .await?;
        Ok(())
    }
}
