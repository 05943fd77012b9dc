//! Participant identity: the display view of the other party in a thread.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;
use crate::domain::user::UserProfile;

/// Display name used when a participant could not be resolved.
pub const PLACEHOLDER_NAME: &str = "Unknown user";

/// Cached display identity of a user.
///
/// Not authoritative: this is a display cache with no invalidation beyond
/// the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Participant {
    /// Creates a participant identity.
    pub fn new(id: UserId, display_name: impl Into<String>, avatar_url: Option<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_url,
        }
    }

    /// Identity shown while the real one is unknown.
    pub fn placeholder(id: UserId) -> Self {
        Self {
            id,
            display_name: PLACEHOLDER_NAME.to_string(),
            avatar_url: None,
        }
    }
}

impl From<&UserProfile> for Participant {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            display_name: profile.display_label().to_string(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// Where a resolved participant identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantSource {
    Friend,
    Match,
    Directory,
    Placeholder,
}

/// Picks the party of a two-person thread that is not `current_user`.
///
/// Falls back to the first id when every id equals the current user
/// (a thread with oneself).
pub fn other_party<'a>(participant_ids: &'a [UserId], current_user: &UserId) -> Option<&'a UserId> {
    participant_ids
        .iter()
        .find(|id| *id != current_user)
        .or_else(|| participant_ids.first())
}
