//! Friend graph types.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{FriendRequestId, Timestamp, UserId};
use crate::domain::user::UserProfile;

/// Lifecycle of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A friend request between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: FriendRequestId,
    pub from: UserProfile,
    pub to: UserProfile,
    pub status: FriendRequestStatus,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl FriendRequest {
    /// Returns true if `user_id` received this request and it is still open.
    pub fn awaits_response_from(&self, user_id: &UserId) -> bool {
        self.status == FriendRequestStatus::Pending && &self.to.id == user_id
    }
}

/// Incoming and outgoing requests of the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FriendRequests {
    #[serde(default)]
    pub incoming: Vec<FriendRequest>,
    #[serde(default)]
    pub outgoing: Vec<FriendRequest>,
}

/// A suggested match: another user with overlapping skills or interests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub user: UserProfile,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub shared_tags: Vec<String>,
}
