//! Record store adapters.
//!
//! A [`RecordStore`] owns one document collection. Both backends keep fields
//! in the same encoding (see [`crate::document`]) and stamp mutations with
//! their own clock rather than the caller's.

pub mod firestore;
pub mod memory;
mod token;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::document::Document;
use crate::error::Result;
use crate::record::StatusRecord;
use crate::types::Disposition;

/// Number of read-then-write attempts `set_flagged` makes before giving up
/// with [`crate::DeskError::FlagConflict`].
pub const FLAG_ATTEMPTS: usize = 3;

pub trait RecordStore: Send + Sync {
    /// Short human-readable description, e.g. `firestore:workerstatus`.
    fn describe(&self) -> String;

    /// Every document in the collection, in store order.
    fn list_documents(&self) -> Result<Vec<Document>>;

    /// One document by id; `RecordNotFound` if absent.
    fn get_document(&self, id: &str) -> Result<Document>;

    /// Create or overwrite a document with exactly these fields.
    fn put_document(&self, doc: &Document) -> Result<()>;

    /// Set `action`, clear `flag` and stamp `action_timestamp` with the store
    /// clock in one write. `RecordNotFound` if the record does not exist.
    fn apply_action(&self, id: &str, action: Disposition) -> Result<()>;

    /// Raise the flag. `last flagged` takes the current `action_timestamp`,
    /// or, when there is none, both take the store clock.
    fn set_flagged(&self, id: &str) -> Result<()>;

    /// Every record, fields resolved, in store order.
    fn fetch_all(&self) -> Result<Vec<StatusRecord>> {
        let docs = self.list_documents()?;
        Ok(docs.iter().map(StatusRecord::from_document).collect())
    }
}
