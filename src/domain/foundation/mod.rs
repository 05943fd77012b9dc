//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and error types that form the
//! vocabulary of the co-op client domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    EventId, FriendRequestId, MessageId, NewsId, OptionId, QuestionId, TagId, ThreadId, UserId,
};
pub use timestamp::Timestamp;
