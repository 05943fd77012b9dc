//! Messaging API port - REST side of direct messaging.

use async_trait::async_trait;

use crate::domain::foundation::{MessageId, ThreadId, UserId};
use crate::domain::messaging::{Message, ThreadSummary};

use super::ApiError;

/// REST operations on threads and messages.
///
/// Implementations must:
/// - Return the existing thread when `start_thread` is called for a peer the
///   user already has a thread with
/// - Return messages in server order, oldest first
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Lists thread metadata for the current user.
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>, ApiError>;

    /// Gets or creates the thread with `peer_id`.
    async fn start_thread(&self, peer_id: &UserId) -> Result<ThreadSummary, ApiError>;

    /// Fetches the full message list of a thread.
    async fn fetch_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, ApiError>;

    /// Sends a message and returns the server-confirmed copy.
    async fn send_message(&self, thread_id: &ThreadId, text: &str) -> Result<Message, ApiError>;

    /// Marks the thread read up to `last_seen`.
    async fn mark_read(
        &self,
        thread_id: &ThreadId,
        last_seen: Option<&MessageId>,
    ) -> Result<(), ApiError>;
}
