//! User profile as exposed by the API.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

/// A user account as seen by other users and by the account owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserProfile {
    /// Name to show in lists: display name if set, otherwise username.
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Editable subset of the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_label_prefers_display_name() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1",
            "username": "gary",
            "displayName": "Gary the Useless"
        }))
        .unwrap();
        assert_eq!(profile.display_label(), "Gary the Useless");
        assert!(!profile.is_admin);
    }

    #[test]
    fn display_label_falls_back_to_username() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1",
            "username": "gary",
            "displayName": "  "
        }))
        .unwrap();
        assert_eq!(profile.display_label(), "gary");
    }

    #[test]
    fn profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            bio: Some("I fix nothing".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"bio": "I fix nothing"}));
    }
}
