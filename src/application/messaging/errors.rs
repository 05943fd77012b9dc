//! Messaging service errors.

use thiserror::Error;

use crate::domain::foundation::{MessageId, ThreadId};
use crate::ports::{ApiError, TransportError};

/// Errors returned by messaging actions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessagingError {
    /// No thread with this id is loaded.
    #[error("Thread not found: {0}")]
    ThreadNotFound(ThreadId),

    /// No local message with this id exists in the thread.
    #[error("Message {message_id} not found in thread {thread_id}")]
    MessageNotFound {
        thread_id: ThreadId,
        message_id: MessageId,
    },

    /// Message text is empty or whitespace only.
    #[error("Message text cannot be empty")]
    EmptyText,

    /// Retry or discard was requested for a message that has not failed.
    #[error("Message {0} has not failed")]
    NotFailed(MessageId),

    /// REST call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Real-time channel failed.
    #[error("Real-time error: {0}")]
    Transport(#[from] TransportError),
}

impl MessagingError {
    /// True when the user must sign in again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, MessagingError::Api(e) if e.is_auth_failure())
    }
}
