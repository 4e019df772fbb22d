//! Error types for the logging engine.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while configuring or driving the engine.
#[derive(Debug, Error)]
pub enum LogError {
    /// An option name the sink does not recognize.
    #[error("invalid or unsupported option: {0}")]
    BadOption(String),

    /// A recognized option given a value of the wrong kind.
    #[error("invalid value for option {option}: {reason}")]
    BadValue {
        /// The option that rejected the value.
        option: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A level name that is not part of the severity enumeration.
    #[error("unknown level: {0}")]
    UnknownLevel(String),

    /// A sink kind name that is not part of the closed sink set.
    #[error("unknown sink kind: {0}")]
    UnknownSinkKind(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LogError {
    /// Shorthand for a [`LogError::BadValue`].
    #[must_use]
    pub fn bad_value(option: &str, reason: impl Into<String>) -> Self {
        Self::BadValue {
            option: option.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, LogError>;

/// One rejected filter definition inside a declarative configuration.
#[derive(Debug)]
pub struct ConfigIssue {
    /// Name of the filter definition the error belongs to.
    pub filter: String,
    /// The underlying error.
    pub error: LogError,
}

/// All errors collected while validating a declarative filter configuration.
///
/// A configuration is applied all-or-nothing: if this error is returned,
/// no part of it was activated.
#[derive(Debug)]
pub struct ConfigErrors {
    /// Every rejected definition, in input order.
    pub issues: Vec<ConfigIssue>,
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid filter definition(s):", self.issues.len())?;
        for issue in &self.issues {
            write!(f, " [{}: {}]", issue.filter, issue.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

/// The error value returned by the warn/error/critical conveniences.
///
/// Carries the formatted message so a call site can log and propagate in
/// one step. Returned regardless of whether the underlying write succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LoggedError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = LogError::BadOption("colour".to_string());
        assert_eq!(err.to_string(), "invalid or unsupported option: colour");

        let err = LogError::bad_value("format", "expected a string");
        assert_eq!(
            err.to_string(),
            "invalid value for option format: expected a string"
        );

        let err = LogError::UnknownLevel("LOUD".to_string());
        assert_eq!(err.to_string(), "unknown level: LOUD");

        let err = LogError::UnknownSinkKind("syslog".to_string());
        assert_eq!(err.to_string(), "unknown sink kind: syslog");
    }

    #[test]
    fn error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LogError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LogError>();
        assert_send_sync::<ConfigErrors>();
        assert_send_sync::<LoggedError>();
    }

    #[test]
    fn config_errors_display_lists_every_issue() {
        let errs = ConfigErrors {
            issues: vec![
                ConfigIssue {
                    filter: "file".to_string(),
                    error: LogError::BadOption("rotat".to_string()),
                },
                ConfigIssue {
                    filter: "net".to_string(),
                    error: LogError::UnknownLevel("LOUD".to_string()),
                },
            ],
        };
        let text = errs.to_string();
        assert!(text.starts_with("2 invalid filter definition(s):"));
        assert!(text.contains("file: invalid or unsupported option: rotat"));
        assert!(text.contains("net: unknown level: LOUD"));
    }

    #[test]
    fn logged_error_carries_message() {
        let err = LoggedError("disk is full".to_string());
        assert_eq!(err.to_string(), "disk is full");
    }
}
