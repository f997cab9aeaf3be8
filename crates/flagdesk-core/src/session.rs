//! Process-local state for one dashboard session.
//!
//! A [`Session`] is created when the dashboard starts and dropped when it
//! stops. Nothing in it is persisted.

use crate::blocklist::BlockLists;
use crate::error::{DeskError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// RefreshSettings
// ---------------------------------------------------------------------------

/// Auto-refresh toggle and interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl RefreshSettings {
    pub const MIN_INTERVAL_SECS: u64 = 2;
    pub const MAX_INTERVAL_SECS: u64 = 3600;
    pub const DEFAULT_INTERVAL_SECS: u64 = 5;

    pub fn new(enabled: bool, interval_secs: u64) -> Result<Self> {
        if !(Self::MIN_INTERVAL_SECS..=Self::MAX_INTERVAL_SECS).contains(&interval_secs) {
            return Err(DeskError::InvalidInterval(interval_secs));
        }
        Ok(Self {
            enabled,
            interval_secs,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: Self::DEFAULT_INTERVAL_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Session {
    pub block_lists: BlockLists,
    pub refresh: RefreshSettings,
}

impl Session {
    pub fn new(refresh: RefreshSettings) -> Self {
        Self {
            block_lists: BlockLists::seeded(),
            refresh,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(RefreshSettings::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
