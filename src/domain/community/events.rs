//! Community events (meetups, workshops).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, Timestamp, ValidationError};

/// A scheduled community event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityEvent {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    pub starts_at: Timestamp,
    #[serde(default)]
    pub ends_at: Option<Timestamp>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub attendee_count: u32,
    #[serde(default)]
    pub is_registered: bool,
}

impl CommunityEvent {
    /// Returns true if a capacity is set and reached.
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.attendee_count >= cap)
    }
}

/// Fields for creating or updating an event (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub starts_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl EventDraft {
    /// Checks the draft before it is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        if let Some(ends_at) = &self.ends_at {
            if !ends_at.is_after(&self.starts_at) {
                return Err(ValidationError::invalid_format(
                    "ends_at",
                    "must be after starts_at",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> EventDraft {
        EventDraft {
            title: "Shed build".to_string(),
            description: "Bring a hammer".to_string(),
            location: None,
            starts_at: Timestamp::from_unix_millis(1_700_000_000_000).unwrap(),
            ends_at: None,
            capacity: Some(10),
        }
    }

    #[test]
    fn draft_requires_title() {
        let mut d = draft();
        d.title = "  ".to_string();
        assert!(d.validate().is_err());
    }

    #[test]
    fn draft_rejects_end_before_start() {
        let mut d = draft();
        d.ends_at = Some(d.starts_at.plus_secs(-60));
        assert!(d.validate().is_err());

        d.ends_at = Some(d.starts_at.plus_secs(3600));
        assert!(d.validate().is_ok());
    }

    #[test]
    fn event_is_full_at_capacity() {
        let event: CommunityEvent = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "title": "Shed build",
            "startsAt": "2024-05-01T10:00:00Z",
            "capacity": 2,
            "attendeeCount": 2
        }))
        .unwrap();
        assert!(event.is_full());
    }
}
