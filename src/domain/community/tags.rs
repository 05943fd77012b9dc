//! Skill and interest tags.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TagId, ValidationError};

/// A tag used by questions, news posts and matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Fields for creating or renaming a tag (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TagDraft {
    /// Checks the draft before it is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if let Some(color) = &self.color {
            let hex = color.strip_prefix('#').unwrap_or("");
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ValidationError::invalid_format("color", "expected #rrggbb"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_draft_validates_color() {
        let ok = TagDraft {
            name: "Carpentry".to_string(),
            color: Some("#a0b1c2".to_string()),
        };
        assert!(ok.validate().is_ok());

        let bad = TagDraft {
            name: "Carpentry".to_string(),
            color: Some("red".to_string()),
        };
        assert!(bad.validate().is_err());
    }
}
