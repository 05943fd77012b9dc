//! Strongly-typed identifier value objects.
//!
//! Server-assigned identifiers are opaque strings. The only identifier the
//! client mints itself is the temporary id of an optimistic message.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Declares an opaque, non-empty, server-assigned string identifier.
macro_rules! server_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier, returning error if empty.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

server_id!(
    /// User identifier assigned by the backend.
    UserId,
    "user_id"
);
server_id!(
    /// Identifier of a two-party message thread.
    ThreadId,
    "thread_id"
);
server_id!(
    /// Identifier of a friend request.
    FriendRequestId,
    "friend_request_id"
);
server_id!(
    /// Identifier of a community event.
    EventId,
    "event_id"
);
server_id!(
    /// Identifier of a news post.
    NewsId,
    "news_id"
);
server_id!(
    /// Identifier of a tag.
    TagId,
    "tag_id"
);
server_id!(
    /// Identifier of an assessment question.
    QuestionId,
    "question_id"
);
server_id!(
    /// Identifier of an answer option within a question.
    OptionId,
    "option_id"
);

/// Prefix used when rendering temporary message ids.
const TEMPORARY_PREFIX: &str = "tmp-";

/// Identifier of a message.
///
/// `Temporary` ids belong to optimistic sends that the server has not
/// confirmed yet and never leave the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Assigned by the server.
    Server(String),
    /// Minted locally for an optimistic send.
    Temporary(Uuid),
}

impl MessageId {
    /// Creates a server-assigned message id, returning error if empty.
    pub fn server(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("message_id"));
        }
        Ok(Self::Server(id))
    }

    /// Mints a fresh temporary id.
    pub fn temporary() -> Self {
        Self::Temporary(Uuid::new_v4())
    }

    /// Returns true for locally minted ids.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// Returns the server id, if this id was assigned by the server.
    pub fn as_server(&self) -> Option<&str> {
        match self {
            Self::Server(id) => Some(id),
            Self::Temporary(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{}", id),
            Self::Temporary(uuid) => write!(f, "{}{}", TEMPORARY_PREFIX, uuid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_empty() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn user_id_displays_inner_value() {
        let id = UserId::new("u-42").unwrap();
        assert_eq!(id.to_string(), "u-42");
        assert_eq!(id.as_str(), "u-42");
    }

    #[test]
    fn thread_id_parses_from_str() {
        let id: ThreadId = "t-1".parse().unwrap();
        assert_eq!(id.as_str(), "t-1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ThreadId::new("t-9").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t-9\"");

        let back: ThreadId = serde_json::from_str("\"t-9\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn temporary_message_ids_are_unique_and_flagged() {
        let a = MessageId::temporary();
        let b = MessageId::temporary();
        assert_ne!(a, b);
        assert!(a.is_temporary());
        assert!(a.as_server().is_none());
        assert!(a.to_string().starts_with("tmp-"));
    }

    #[test]
    fn server_message_id_is_not_temporary() {
        let id = MessageId::server("m-1").unwrap();
        assert!(!id.is_temporary());
        assert_eq!(id.as_server(), Some("m-1"));
        assert!(MessageId::server("").is_err());
    }
}
