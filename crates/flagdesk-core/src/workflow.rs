//! The flag/action state machine and the display policy built on it.
//!
//! ```text
//! Resolved --set_flag--------> Flagged
//! Flagged  --submit(action)--> Resolved
//! ```
//!
//! Transitions are store writes; nothing here caches record state.

use crate::document::Document;
use crate::error::{DeskError, Result};
use crate::record::StatusRecord;
use crate::store::RecordStore;
use crate::types::{Disposition, RecordState, Stamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

fn recency_key(record: &StatusRecord) -> Option<DateTime<Utc>> {
    record.last_flagged_at.as_ref().and_then(Stamp::instant)
}

/// Most recently flagged first. Records without a parseable
/// `last_flagged_at` sort last; ties keep store order.
pub fn order_by_recency(records: &mut [StatusRecord]) {
    records.sort_by(|a, b| recency_key(b).cmp(&recency_key(a)));
}

/// Every record, newest flag first.
pub fn load_ordered(store: &dyn RecordStore) -> Result<Vec<StatusRecord>> {
    let mut records = store.fetch_all()?;
    order_by_recency(&mut records);
    Ok(records)
}

/// The record the action panel surfaces: the head of the ordered list.
pub fn most_urgent(ordered: &[StatusRecord]) -> Option<&StatusRecord> {
    ordered.first()
}

pub fn panel_title(record: &StatusRecord) -> String {
    match record.state() {
        RecordState::Flagged => format!("{} ({}) has a ticket", record.worker_id, record.role),
        RecordState::Resolved => "All tickets resolved".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// What the panel offers for a record in its current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    Submit { actions: Vec<Disposition> },
    SetFlag,
}

pub fn controls_for(record: &StatusRecord) -> Control {
    match record.state() {
        RecordState::Flagged => Control::Submit {
            actions: Disposition::all().to_vec(),
        },
        RecordState::Resolved => Control::SetFlag,
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Record `action` and resolve the record, whatever state it was in.
pub fn submit(store: &dyn RecordStore, id: &str, action: Disposition) -> Result<()> {
    store.apply_action(id, action)
}

/// Raise the flag on a record.
pub fn set_flag(store: &dyn RecordStore, id: &str) -> Result<()> {
    store.set_flagged(id)
}

/// Copy the template document verbatim under `new_id`, overwriting any
/// document already there. Returns the id written.
pub fn duplicate_template(
    store: &dyn RecordStore,
    template_id: &str,
    new_id: &str,
) -> Result<String> {
    let new_id = new_id.trim();
    if new_id.is_empty() || new_id.contains('/') {
        return Err(DeskError::InvalidRecordId(new_id.to_string()));
    }

    let template = store.get_document(template_id).map_err(|e| match e {
        DeskError::RecordNotFound(_) => DeskError::TemplateNotFound(template_id.to_string()),
        other => other,
    })?;

    let copy = Document {
        id: new_id.to_string(),
        fields: template.fields,
    };
    store.put_document(&copy)?;
    tracing::info!(template = %template_id, record = %new_id, "template duplicated");
    Ok(copy.id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
