//! Wire DTOs for the messaging and auth endpoints.
//!
//! Most domain types deserialize directly. Messages and threads go through
//! these DTOs because their domain form carries client-only state
//! (temporary ids, delivery state, revision).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, ThreadId, Timestamp, UserId, ValidationError};
use crate::domain::messaging::{Message, ThreadSummary};
use crate::domain::user::UserProfile;
use crate::ports::ApiError;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /messages/threads`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartThreadRequest<'a> {
    pub participant_id: &'a str,
}

/// Body of `POST /messages/threads/{id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub text: &'a str,
}

/// Body of `POST /messages/threads/{id}/read`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_message_id: Option<&'a str>,
}

/// Body of `POST /friends/requests`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody<'a> {
    pub user_id: &'a str,
}

/// Body of `POST /auth/verify`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest<'a> {
    pub token: &'a str,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A message as the server sends it, over REST and over the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub thread_id: String,
    pub sender_id: String,
    pub text: String,
    pub created_at: String,
}

impl MessageDto {
    /// Converts to a confirmed domain message.
    pub fn into_message(self) -> Result<Message, ValidationError> {
        Ok(Message::confirmed(
            MessageId::server(self.id)?,
            ThreadId::new(self.thread_id)?,
            UserId::new(self.sender_id)?,
            self.text,
            Timestamp::parse_rfc3339(&self.created_at)?,
        ))
    }
}

impl TryFrom<MessageDto> for Message {
    type Error = ApiError;

    fn try_from(dto: MessageDto) -> Result<Self, Self::Error> {
        dto.into_message()
            .map_err(|e| ApiError::decode(e.to_string()))
    }
}

/// Thread metadata from `GET /messages/threads`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDto {
    pub id: String,
    #[serde(default, alias = "participants")]
    pub participant_ids: Vec<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
    #[serde(default)]
    pub unread_count: u32,
}

impl TryFrom<ThreadDto> for ThreadSummary {
    type Error = ApiError;

    fn try_from(dto: ThreadDto) -> Result<Self, Self::Error> {
        let decode = |e: ValidationError| ApiError::decode(e.to_string());

        let participant_ids = dto
            .participant_ids
            .into_iter()
            .map(UserId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(decode)?;
        let last_message_at = dto
            .last_message_at
            .as_deref()
            .map(Timestamp::parse_rfc3339)
            .transpose()
            .map_err(decode)?;

        Ok(ThreadSummary {
            id: ThreadId::new(dto.id).map_err(decode)?,
            participant_ids,
            last_message: dto.last_message,
            last_message_at,
            unread_count: dto.unread_count,
        })
    }
}

/// Body of a successful login or registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::messaging::DeliveryState;
    use serde_json::json;

    #[test]
    fn message_dto_converts_to_confirmed_message() {
        let dto: MessageDto = serde_json::from_value(json!({
            "id": "m-1",
            "threadId": "t-1",
            "senderId": "u-2",
            "text": "hello",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        let message = Message::try_from(dto).unwrap();
        assert_eq!(message.id, MessageId::server("m-1").unwrap());
        assert_eq!(message.state, DeliveryState::Confirmed);
        assert_eq!(message.text, "hello");
    }

    #[test]
    fn message_dto_with_bad_timestamp_is_decode_error() {
        let dto = MessageDto {
            id: "m-1".into(),
            thread_id: "t-1".into(),
            sender_id: "u-2".into(),
            text: "hi".into(),
            created_at: "yesterday".into(),
        };
        assert!(matches!(Message::try_from(dto), Err(ApiError::Decode(_))));
    }

    #[test]
    fn thread_dto_accepts_participants_alias() {
        let dto: ThreadDto = serde_json::from_value(json!({
            "id": "t-1",
            "participants": ["u-1", "u-2"],
            "lastMessage": "see you",
            "lastMessageAt": "2024-05-01T10:00:00Z",
            "unreadCount": 2
        }))
        .unwrap();

        let summary = ThreadSummary::try_from(dto).unwrap();
        assert_eq!(summary.participant_ids.len(), 2);
        assert_eq!(summary.unread_count, 2);
        assert!(summary.last_message_at.is_some());
    }

    #[test]
    fn mark_read_omits_missing_message_id() {
        let body = serde_json::to_value(MarkReadRequest {
            last_seen_message_id: None,
        })
        .unwrap();
        assert_eq!(body, json!({}));
    }
}
