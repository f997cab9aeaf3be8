//! Absolute and relative renderings of stored timestamps.

use crate::types::Stamp;
use chrono::{DateTime, Utc};
use std::fmt;

pub const ABSOLUTE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// No timestamp stored.
    Missing,
    /// The stored text is not an instant.
    Unparsed(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Missing => f.write_str("no timestamp"),
            FormatError::Unparsed(raw) => write!(f, "unparseable timestamp '{raw}'"),
        }
    }
}

impl std::error::Error for FormatError {}

/// `YYYY-MM-DD HH:MM:SS` in the stamp's own offset.
///
/// Missing stamps render as `""`; unparsed stamps render as their raw text.
pub fn format_absolute(stamp: Option<&Stamp>) -> String {
    match stamp {
        None => String::new(),
        Some(Stamp::At(at)) => at.format(ABSOLUTE_FORMAT).to_string(),
        Some(Stamp::Unparsed(raw)) => raw.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl AgeUnit {
    fn noun(self, count: i64) -> &'static str {
        match (self, count == 1) {
            (AgeUnit::Second, true) => "second",
            (AgeUnit::Second, false) => "seconds",
            (AgeUnit::Minute, true) => "minute",
            (AgeUnit::Minute, false) => "minutes",
            (AgeUnit::Hour, true) => "hour",
            (AgeUnit::Hour, false) => "hours",
            (AgeUnit::Day, true) => "day",
            (AgeUnit::Day, false) => "days",
        }
    }
}

/// Elapsed time bucketed into a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub count: i64,
    pub unit: AgeUnit,
}

impl Age {
    /// Negative elapsed time (clock skew) clamps to zero seconds.
    pub fn from_seconds(secs: i64) -> Self {
        let secs = secs.max(0);
        if secs < MINUTE {
            Age {
                count: secs,
                unit: AgeUnit::Second,
            }
        } else if secs < HOUR {
            Age {
                count: secs / MINUTE,
                unit: AgeUnit::Minute,
            }
        } else if secs < DAY {
            Age {
                count: secs / HOUR,
                unit: AgeUnit::Hour,
            }
        } else {
            Age {
                count: secs / DAY,
                unit: AgeUnit::Day,
            }
        }
    }

    pub fn between(then: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_seconds(now.signed_duration_since(then).num_seconds())
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} ago)", self.count, self.unit.noun(self.count))
    }
}

/// `(N units ago)` relative to `now`, or why it cannot be rendered.
pub fn relative_age(stamp: Option<&Stamp>, now: DateTime<Utc>) -> Result<String, FormatError> {
    match stamp {
        None => Err(FormatError::Missing),
        Some(Stamp::Unparsed(raw)) => Err(FormatError::Unparsed(raw.clone())),
        Some(Stamp::At(at)) => Ok(Age::between(at.with_timezone(&Utc), now).to_string()),
    }
}

/// Display wrapper over [`relative_age`]: anything unrenderable becomes `""`.
pub fn format_relative(stamp: Option<&Stamp>, now: DateTime<Utc>) -> String {
    relative_age(stamp, now).unwrap_or_default()
}

/// Table cell: absolute time followed by its age.
pub fn format_age_cell(stamp: Option<&Stamp>, now: DateTime<Utc>) -> String {
    format!(
        "{} {}",
        format_absolute(stamp),
        format_relative(stamp, now)
    )
    .trim()
    .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
