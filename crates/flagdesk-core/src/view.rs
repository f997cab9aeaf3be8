//! What one refresh cycle shows: the status table and the action panel.

use crate::error::DeskError;
use crate::record::StatusRecord;
use crate::timefmt;
use crate::workflow::{self, Control};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for an empty cell.
pub const NONE_MARK: &str = "—";

/// Review text longer than this is cut in the table.
pub const REVIEW_PREVIEW_CHARS: usize = 60;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub id: String,
    pub worker_id: String,
    pub role: String,
    /// Absolute time and age, e.g. `2024-06-01 11:57:00 (3 minutes ago)`.
    pub last_flagged: String,
    pub flagged: bool,
    pub action: String,
    pub link: String,
    pub review: String,
}

impl DashboardRow {
    pub fn from_record(record: &StatusRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            worker_id: record.worker_id.clone(),
            role: record.role.clone(),
            last_flagged: timefmt::format_age_cell(record.last_flagged_at.as_ref(), now),
            flagged: record.flagged,
            action: record
                .action_label()
                .unwrap_or_else(|| NONE_MARK.to_string()),
            link: record.link.clone().unwrap_or_else(|| NONE_MARK.to_string()),
            review: preview(&record.review, REVIEW_PREVIEW_CHARS),
        }
    }
}

/// First `max` characters, with an ellipsis when anything was cut.
pub fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

// ---------------------------------------------------------------------------
// Action panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPanel {
    pub record_id: String,
    pub title: String,
    /// Open by default only while there is a ticket.
    pub expanded: bool,
    pub link: Option<String>,
    pub review: String,
    pub last_action: String,
    pub last_action_at: String,
    pub controls: Control,
}

impl ActionPanel {
    pub fn for_record(record: &StatusRecord) -> Self {
        let or_mark = |s: &str| {
            if s.trim().is_empty() {
                NONE_MARK.to_string()
            } else {
                s.to_string()
            }
        };
        Self {
            record_id: record.id.clone(),
            title: workflow::panel_title(record),
            expanded: record.flagged,
            link: record.link.clone(),
            review: or_mark(&record.review),
            last_action: record
                .action_label()
                .unwrap_or_else(|| NONE_MARK.to_string()),
            last_action_at: or_mark(&timefmt::format_absolute(record.action_timestamp.as_ref())),
            controls: workflow::controls_for(record),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub collection: String,
    pub rows: Vec<DashboardRow>,
    pub panel: Option<ActionPanel>,
    /// Set when the fetch failed; rows are empty then.
    pub error: Option<String>,
    /// Informational banner, e.g. for an empty collection.
    pub notice: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build from an already ordered fetch result.
    pub fn build(
        fetched: std::result::Result<Vec<StatusRecord>, DeskError>,
        collection: &str,
        now: DateTime<Utc>,
    ) -> Self {
        match fetched {
            Ok(records) => {
                let notice = records
                    .is_empty()
                    .then(|| format!("No documents found in collection '{collection}'."));
                Self {
                    collection: collection.to_string(),
                    rows: records
                        .iter()
                        .map(|r| DashboardRow::from_record(r, now))
                        .collect(),
                    panel: workflow::most_urgent(&records).map(ActionPanel::for_record),
                    error: None,
                    notice,
                    fetched_at: now,
                }
            }
            Err(e) => Self {
                collection: collection.to_string(),
                rows: Vec::new(),
                panel: None,
                error: Some(format!("Failed to read collection '{collection}': {e}")),
                notice: None,
                fetched_at: now,
            },
        }
    }

    pub fn open_tickets(&self) -> usize {
        self.rows.iter().filter(|r| r.flagged).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
