pub mod blocklist;
pub mod config;
pub mod records;
pub mod ui;

use anyhow::Context;
use flagdesk_core::clock::SystemClock;
use flagdesk_core::config::Config;
use flagdesk_core::store::{FirestoreStore, MemoryStore, RecordStore};
use std::path::Path;
use std::sync::Arc;

/// File (if given) plus environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Config::resolve(path).with_context(|| match path {
        Some(p) => format!("failed to load config '{}'", p.display()),
        None => "failed to load config".to_string(),
    })
}

pub fn open_store(config: &Config, demo: bool) -> Arc<dyn RecordStore> {
    if demo {
        Arc::new(MemoryStore::demo(Arc::new(SystemClock)))
    } else {
        Arc::new(FirestoreStore::new(config.clone()))
    }
}
