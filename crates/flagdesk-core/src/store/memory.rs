use super::RecordStore;
use crate::clock::{Clock, SystemClock};
use crate::document::{bool_value, fields, string_value, timestamp_value, Document, FieldValue};
use crate::error::{DeskError, Result};
use crate::types::Disposition;
use chrono::Duration;
use std::sync::{Arc, Mutex, MutexGuard};

/// A collection held in process memory.
///
/// Every operation runs under one lock, so `set_flagged`'s read and write
/// cannot interleave with another writer.
pub struct MemoryStore {
    name: String,
    docs: Mutex<Vec<Document>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_clock(name, Arc::new(SystemClock))
    }

    pub fn with_clock(name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            docs: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// A small team with one open ticket, for `--demo` runs.
    pub fn demo(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let store = Self::with_clock("demo", clock);
        let docs = vec![
            Document::new("workerstatus")
                .with_field("ID", string_value("JohnA"))
                .with_field("team role", string_value("software developer"))
                .with_field("Review", string_value("Browsing a video site during a sprint review"))
                .with_field("link", string_value("https://www.youtube.com/watch"))
                .with_field(fields::FLAG_FIELD, bool_value(true))
                .with_field(fields::ACTION_FIELD, string_value(""))
                .with_field(fields::LAST_FLAGGED_FIELD, timestamp_value(now - Duration::minutes(3))),
            Document::new("priya")
                .with_field("ID", string_value("PriyaK"))
                .with_field("role", string_value("designer"))
                .with_field("Review", string_value("Shopping tab open for 40 minutes"))
                .with_field(fields::FLAG_FIELD, bool_value(false))
                .with_field(fields::ACTION_FIELD, string_value("warn"))
                .with_field(fields::LAST_FLAGGED_FIELD, timestamp_value(now - Duration::hours(5)))
                .with_field(
                    fields::ACTION_TIMESTAMP_FIELD,
                    timestamp_value(now - Duration::hours(4)),
                ),
            Document::new("marco")
                .with_field("ID", string_value("MarcoL"))
                .with_field("role", string_value("support"))
                .with_field(fields::FLAG_FIELD, bool_value(false)),
        ];
        *store.lock() = docs;
        store
    }

    /// Insert or replace documents directly, bypassing the workflow.
    pub fn insert(&self, doc: Document) {
        let mut docs = self.lock();
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Document>> {
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordStore for MemoryStore {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.lock().clone())
    }

    fn get_document(&self, id: &str) -> Result<Document> {
        self.lock()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| DeskError::RecordNotFound(id.to_string()))
    }

    fn put_document(&self, doc: &Document) -> Result<()> {
        self.insert(doc.clone());
        Ok(())
    }

    fn apply_action(&self, id: &str, action: Disposition) -> Result<()> {
        let now = self.clock.now();
        let mut docs = self.lock();
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DeskError::RecordNotFound(id.to_string()))?;
        doc.fields
            .insert(fields::ACTION_FIELD.into(), string_value(action.as_str()));
        doc.fields.insert(fields::FLAG_FIELD.into(), bool_value(false));
        doc.fields
            .insert(fields::ACTION_TIMESTAMP_FIELD.into(), timestamp_value(now));
        Ok(())
    }

    fn set_flagged(&self, id: &str) -> Result<()> {
        let now = self.clock.now();
        let mut docs = self.lock();
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DeskError::RecordNotFound(id.to_string()))?;

        let action_ts = doc
            .resolve(fields::ACTION_TIMESTAMP)
            .filter(|v| FieldValue::decode(v) != FieldValue::Null)
            .cloned();
        match action_ts {
            Some(action_ts) => {
                doc.fields
                    .insert(fields::LAST_FLAGGED_FIELD.into(), action_ts);
            }
            None => {
                let stamp = timestamp_value(now);
                doc.fields
                    .insert(fields::LAST_FLAGGED_FIELD.into(), stamp.clone());
                doc.fields
                    .insert(fields::ACTION_TIMESTAMP_FIELD.into(), stamp);
            }
        }
        doc.fields.insert(fields::FLAG_FIELD.into(), bool_value(true));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
