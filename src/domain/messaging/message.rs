//! Direct message value type.

use crate::domain::foundation::{MessageId, ThreadId, Timestamp, UserId};

/// Delivery state of a message as seen by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Optimistically shown, write in flight.
    Pending,
    /// Known to the server.
    Confirmed,
    /// The write failed; the user may retry or discard it.
    Failed,
}

/// A single message inside a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub sender_id: UserId,
    pub text: String,
    pub created_at: Timestamp,
    pub state: DeliveryState,
}

impl Message {
    /// Creates a server-confirmed message.
    pub fn confirmed(
        id: MessageId,
        thread_id: ThreadId,
        sender_id: UserId,
        text: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            thread_id,
            sender_id,
            text: text.into(),
            created_at,
            state: DeliveryState::Confirmed,
        }
    }

    /// Creates an optimistic message with a fresh temporary id.
    pub fn optimistic(thread_id: ThreadId, sender_id: UserId, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::temporary(),
            thread_id,
            sender_id,
            text: text.into(),
            created_at: Timestamp::now(),
            state: DeliveryState::Pending,
        }
    }

    /// Returns true while the message only exists locally.
    pub fn is_local(&self) -> bool {
        self.id.is_temporary()
    }

    /// Returns true if the message was sent by `user_id`.
    pub fn is_from(&self, user_id: &UserId) -> bool {
        &self.sender_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> ThreadId {
        ThreadId::new("t-1").unwrap()
    }

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[test]
    fn optimistic_messages_start_pending_with_temporary_id() {
        let msg = Message::optimistic(thread(), alice(), "hi");
        assert_eq!(msg.state, DeliveryState::Pending);
        assert!(msg.is_local());
        assert!(msg.is_from(&alice()));
    }

    #[test]
    fn confirmed_messages_are_not_local() {
        let msg = Message::confirmed(
            MessageId::server("m-1").unwrap(),
            thread(),
            alice(),
            "hi",
            Timestamp::now(),
        );
        assert_eq!(msg.state, DeliveryState::Confirmed);
        assert!(!msg.is_local());
    }
}
