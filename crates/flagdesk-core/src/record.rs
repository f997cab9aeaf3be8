use crate::document::{fields, Document};
use crate::types::{Disposition, RecordState, Stamp};
use serde::{Deserialize, Serialize};

/// One worker's status, resolved from a stored [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Document id within the collection.
    pub id: String,
    pub worker_id: String,
    pub role: String,
    pub last_flagged_at: Option<Stamp>,
    pub review: String,
    pub link: Option<String>,
    pub flagged: bool,
    pub action: Option<Disposition>,
    /// Stored action text that is not a known disposition, kept for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unrecognised_action: Option<String>,
    pub action_timestamp: Option<Stamp>,
}

impl StatusRecord {
    /// Resolve every field once, substituting defaults for anything missing.
    pub fn from_document(doc: &Document) -> Self {
        let stored = doc.string(fields::ACTION).filter(|s| !s.trim().is_empty());
        let (action, unrecognised_action) = match stored {
            None => (None, None),
            Some(s) => match s.parse::<Disposition>() {
                Ok(d) => (Some(d), None),
                Err(_) => {
                    tracing::warn!(record = %doc.id, action = %s, "unrecognised action");
                    (None, Some(s))
                }
            },
        };

        Self {
            id: doc.id.clone(),
            worker_id: doc.string(fields::WORKER_ID).unwrap_or_default(),
            role: doc.string(fields::ROLE).unwrap_or_default(),
            last_flagged_at: doc.stamp(fields::LAST_FLAGGED),
            review: doc.string(fields::REVIEW).unwrap_or_default(),
            link: doc.string(fields::LINK).filter(|l| !l.trim().is_empty()),
            flagged: doc.bool(fields::FLAG).unwrap_or(false),
            action,
            unrecognised_action,
            action_timestamp: doc.stamp(fields::ACTION_TIMESTAMP),
        }
    }

    /// The stored action as shown to the manager, known or not.
    pub fn action_label(&self) -> Option<String> {
        self.action
            .map(|a| a.to_string())
            .or_else(|| self.unrecognised_action.clone())
    }

    pub fn state(&self) -> RecordState {
        if self.flagged {
            RecordState::Flagged
        } else {
            RecordState::Resolved
        }
    }

    /// A raised flag must come with a defined `last_flagged_at`.
    pub fn is_consistent(&self) -> bool {
        !self.flagged || self.last_flagged_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
