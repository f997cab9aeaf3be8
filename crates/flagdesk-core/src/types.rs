use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Disposition
// ---------------------------------------------------------------------------

/// A manager's decision on a flagged record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Block,
    Warn,
    Accept,
}

impl Disposition {
    pub fn all() -> &'static [Disposition] {
        &[Disposition::Block, Disposition::Warn, Disposition::Accept]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Block => "block",
            Disposition::Warn => "warn",
            Disposition::Accept => "accept",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Disposition {
    type Err = crate::error::DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Disposition::Block),
            "warn" => Ok(Disposition::Warn),
            "accept" => Ok(Disposition::Accept),
            _ => Err(crate::error::DeskError::InvalidAction(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Flagged,
    Resolved,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordState::Flagged => f.write_str("flagged"),
            RecordState::Resolved => f.write_str("resolved"),
        }
    }
}

// ---------------------------------------------------------------------------
// Stamp
// ---------------------------------------------------------------------------

/// A timestamp as it came out of the store.
///
/// Values that parse as RFC 3339 keep their own UTC offset; anything else is
/// kept verbatim so it can still be shown to the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stamp {
    At(DateTime<FixedOffset>),
    Unparsed(String),
}

impl Stamp {
    pub fn parse(raw: &str) -> Self {
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(at) => Stamp::At(at),
            Err(_) => Stamp::Unparsed(raw.to_string()),
        }
    }

    /// The instant in UTC, when the stamp could be parsed.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Stamp::At(at) => Some(at.with_timezone(&Utc)),
            Stamp::Unparsed(_) => None,
        }
    }
}

impl From<DateTime<Utc>> for Stamp {
    fn from(at: DateTime<Utc>) -> Self {
        Stamp::At(at.fixed_offset())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
