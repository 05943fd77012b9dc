//! User directory port for looking up users by id.
//!
//! Used by the participant resolver as the last resort when a thread's
//! other party is neither a friend nor a match.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::user::UserProfile;

use super::ApiError;

/// Retrieves user profiles by id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Gets a user by id.
    ///
    /// Returns `ApiError::Status { status: 404, .. }` when no such user exists.
    async fn fetch_user(&self, user_id: &UserId) -> Result<UserProfile, ApiError>;
}
