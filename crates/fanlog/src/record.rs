//! Core record types for the logging engine.
//!
//! This module provides:
//! - [`Level`] — Ordered severity levels with fixed 4-character mnemonics
//! - [`LogRecord`] — An immutable, timestamped log record

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Log severity levels, ordered from least to most severe.
///
/// A record is delivered to a sink iff `record.level >= entry.level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Extremely fine-grained tracing
    Finest = 0,
    /// Fine-grained tracing
    Fine = 1,
    /// Debugging information
    Debug = 2,
    /// Execution tracing
    Trace = 3,
    /// General information
    Info = 4,
    /// Warning conditions
    Warning = 5,
    /// Error conditions
    Error = 6,
    /// Critical conditions
    Critical = 7,
}

impl Level {
    /// Returns true if a record at `record_level` passes a threshold of `self`.
    #[must_use]
    pub fn admits(self, record_level: Self) -> bool {
        record_level >= self
    }

    /// Returns the fixed 4-character mnemonic used by the `%L` directive.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Finest => "FNST",
            Self::Fine => "FINE",
            Self::Debug => "DEBG",
            Self::Trace => "TRAC",
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "EROR",
            Self::Critical => "CRIT",
        }
    }

    /// Returns the upper-case configuration name of this level.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Finest => "FINEST",
            Self::Fine => "FINE",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FINEST" => Ok(Self::Finest),
            "FINE" => Ok(Self::Fine),
            "DEBUG" => Ok(Self::Debug),
            "TRACE" => Ok(Self::Trace),
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(LogError::UnknownLevel(other.to_string())),
        }
    }
}

/// A single log record.
///
/// Produced once per logging call and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity level
    pub level: Level,
    /// Origin identifier, typically `file:line`
    pub source: String,
    /// The rendered message text
    pub message: String,
    /// When the record was created
    pub created: DateTime<Local>,
}

impl LogRecord {
    /// Creates a record stamped with the current local time.
    #[must_use]
    pub fn new(level: Level, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.into(),
            message: message.into(),
            created: Local::now(),
        }
    }

    /// Creates a record with an explicit timestamp.
    #[must_use]
    pub fn with_created(
        level: Level,
        source: impl Into<String>,
        message: impl Into<String>,
        created: DateTime<Local>,
    ) -> Self {
        Self {
            level,
            source: source.into(),
            message: message.into(),
            created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn level_ordering() {
        assert!(Level::Finest < Level::Fine);
        assert!(Level::Fine < Level::Debug);
        assert!(Level::Debug < Level::Trace);
        assert!(Level::Trace < Level::Info);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Error < Level::Critical);
    }

    #[test]
    fn level_admits_boundary_equality() {
        // Equality admits; one below does not.
        assert!(Level::Info.admits(Level::Info));
        assert!(Level::Info.admits(Level::Critical));
        assert!(!Level::Info.admits(Level::Trace));
    }

    #[test_case(Level::Finest, "FNST")]
    #[test_case(Level::Fine, "FINE")]
    #[test_case(Level::Debug, "DEBG")]
    #[test_case(Level::Trace, "TRAC")]
    #[test_case(Level::Info, "INFO")]
    #[test_case(Level::Warning, "WARN")]
    #[test_case(Level::Error, "EROR")]
    #[test_case(Level::Critical, "CRIT")]
    fn level_mnemonics_are_four_chars(level: Level, expected: &str) {
        assert_eq!(level.mnemonic(), expected);
        assert_eq!(level.mnemonic().len(), 4);
    }

    #[test]
    fn level_parses_config_names() {
        assert_eq!("FINEST".parse::<Level>().ok(), Some(Level::Finest));
        assert_eq!("WARNING".parse::<Level>().ok(), Some(Level::Warning));
        assert_eq!("CRITICAL".parse::<Level>().ok(), Some(Level::Critical));
    }

    #[test]
    fn level_rejects_unknown_name() {
        let err = "NOISY".parse::<Level>();
        assert!(err.is_err());
        if let Err(e) = err {
            assert!(e.to_string().contains("NOISY"));
        }
    }

    #[test]
    fn level_display_matches_name() {
        assert_eq!(Level::Warning.to_string(), "WARNING");
    }

    #[test]
    fn level_serde_roundtrip() {
        let json = serde_json::to_string(&Level::Error).expect("serialize");
        assert_eq!(json, "\"ERROR\"");
        let back: Level = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Level::Error);
    }

    #[test]
    fn record_fields() {
        let rec = LogRecord::new(Level::Critical, "source", "message");
        assert_eq!(rec.level, Level::Critical);
        assert_eq!(rec.source, "source");
        assert_eq!(rec.message, "message");
    }

    #[test]
    fn record_serde_roundtrip() {
        let rec = LogRecord::new(Level::Info, "a.rs:1", "hello");
        let json = serde_json::to_string(&rec).expect("serialize");
        let back: LogRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, rec);
    }

    #[test]
    fn record_wire_encoding_is_field_tagged() {
        let rec = LogRecord::new(Level::Warning, "w.rs:9", "watch out");
        let json = serde_json::to_string(&rec).expect("serialize");
        assert!(json.contains("\"level\":\"WARNING\""));
        assert!(json.contains("\"source\":\"w.rs:9\""));
        assert!(json.contains("\"message\":\"watch out\""));
        assert!(json.contains("\"created\""));
    }
}
