//! The named-filter dispatch table.
//!
//! This module provides:
//! - [`Logger`] — Routes each record to every named filter whose severity
//!   threshold admits it
//! - [`FilterEntry`] — One (threshold, sink) binding
//! - [`default_logger`] — A lazily-constructed process-wide console logger
//!   behind an explicit accessor
//!
//! Fan-out is synchronous on the calling thread; a slow sink (e.g. a file
//! sink with a full queue) backpressures the original log call. No error is
//! propagated back through a log call — logging is best-effort.

use std::collections::HashMap;
use std::panic::Location;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::console::ConsoleSink;
use crate::error::LoggedError;
use crate::record::{Level, LogRecord};
use crate::sink::Sink;

/// One named (threshold, sink) binding.
pub struct FilterEntry {
    /// Minimum severity this sink receives.
    pub level: Level,
    sink: Box<dyn Sink>,
}

/// Routes records to every configured sink whose threshold admits them.
///
/// Construct one explicitly and pass it down; for zero-configuration use
/// there is [`default_logger`].
#[derive(Default)]
pub struct Logger {
    filters: Mutex<HashMap<String, FilterEntry>>,
}

impl Logger {
    /// Creates a logger with no filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a logger with a single stdout console filter named
    /// `"stdout"` at the given threshold.
    #[must_use]
    pub fn with_console(level: Level) -> Self {
        let logger = Self::new();
        logger.add_filter("stdout", level, Box::new(ConsoleSink::new()));
        logger
    }

    /// Installs `sink` under `name` with the given threshold.
    ///
    /// Rebinding an existing name closes the prior sink first, so no file
    /// handle or socket leaks.
    pub fn add_filter(&self, name: impl Into<String>, level: Level, sink: Box<dyn Sink>) {
        let mut filters = self.filters.lock();
        if let Some(mut previous) = filters.insert(name.into(), FilterEntry { level, sink }) {
            previous.sink.close();
        }
    }

    /// Removes the filter bound to `name`, closing its sink.
    ///
    /// Returns false if no such filter existed.
    pub fn remove_filter(&self, name: &str) -> bool {
        match self.filters.lock().remove(name) {
            Some(mut entry) => {
                entry.sink.close();
                true
            }
            None => false,
        }
    }

    /// Returns true if at least one filter admits `level`.
    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        self.filters
            .lock()
            .values()
            .any(|entry| entry.level.admits(level))
    }

    /// Number of installed filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.lock().len()
    }

    /// Returns true if no filters are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.lock().is_empty()
    }

    /// Delivers `record` to every filter whose threshold admits its level.
    ///
    /// Every matching sink is attempted, even if an earlier one stalls or
    /// fails internally.
    pub fn dispatch(&self, record: &LogRecord) {
        let mut filters = self.filters.lock();
        for entry in filters.values_mut() {
            if entry.level.admits(record.level) {
                entry.sink.write(record);
            }
        }
    }

    /// Logs a message with an explicit source tag.
    pub fn log(&self, level: Level, source: impl Into<String>, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(&LogRecord::new(level, source, message));
    }

    /// Logs a message, capturing the caller's `file:line` as the source.
    #[track_caller]
    pub fn log_from(&self, level: Level, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(&LogRecord::new(level, caller_source(), message));
    }

    /// Logs a lazily-built message.
    ///
    /// The closure runs at most once, and only if some filter admits the
    /// level — the cost of building a message nobody will see is avoided.
    #[track_caller]
    pub fn log_with(&self, level: Level, message: impl FnOnce() -> String) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(&LogRecord::new(level, caller_source(), message()));
    }

    /// Logs at [`Level::Finest`].
    #[track_caller]
    pub fn finest(&self, message: impl Into<String>) {
        self.log_from(Level::Finest, message);
    }

    /// Logs at [`Level::Fine`].
    #[track_caller]
    pub fn fine(&self, message: impl Into<String>) {
        self.log_from(Level::Fine, message);
    }

    /// Logs at [`Level::Debug`].
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log_from(Level::Debug, message);
    }

    /// Logs at [`Level::Trace`].
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log_from(Level::Trace, message);
    }

    /// Logs at [`Level::Info`].
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log_from(Level::Info, message);
    }

    /// Logs at [`Level::Warning`] and returns the message as an error
    /// value for call sites that log and propagate in one step.
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) -> LoggedError {
        let message = message.into();
        self.log_from(Level::Warning, message.clone());
        LoggedError(message)
    }

    /// Logs at [`Level::Error`] and returns the message as an error value.
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) -> LoggedError {
        let message = message.into();
        self.log_from(Level::Error, message.clone());
        LoggedError(message)
    }

    /// Logs at [`Level::Critical`] and returns the message as an error
    /// value. Never aborts the process.
    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) -> LoggedError {
        let message = message.into();
        self.log_from(Level::Critical, message.clone());
        LoggedError(message)
    }

    /// Lazily-built variant of [`Logger::warn`].
    ///
    /// The closure runs exactly once: the returned error needs the message
    /// whether or not any sink admits the level.
    #[track_caller]
    pub fn warn_with(&self, message: impl FnOnce() -> String) -> LoggedError {
        self.warn(message())
    }

    /// Lazily-built variant of [`Logger::error`].
    #[track_caller]
    pub fn error_with(&self, message: impl FnOnce() -> String) -> LoggedError {
        self.error(message())
    }

    /// Closes and removes every filter.
    ///
    /// File sinks drain fully before this returns. Safe to call twice.
    pub fn close(&self) {
        let mut filters = self.filters.lock();
        for (_, mut entry) in filters.drain() {
            entry.sink.close();
        }
    }

    /// Replaces the whole filter set in one step.
    ///
    /// The previous set is closed first; used by declarative configuration.
    pub(crate) fn replace_filters(&self, new: Vec<(String, Level, Box<dyn Sink>)>) {
        let mut filters = self.filters.lock();
        for (_, mut entry) in filters.drain() {
            entry.sink.close();
        }
        for (name, level, sink) in new {
            if let Some(mut previous) = filters.insert(name, FilterEntry { level, sink }) {
                previous.sink.close();
            }
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close();
    }
}

#[track_caller]
fn caller_source() -> String {
    let location = Location::caller();
    format!("{}:{}", location.file(), location.line())
}

static DEFAULT: Lazy<Logger> = Lazy::new(|| {
    let logger = Logger::new();
    logger.add_filter(
        "stdout",
        Level::Debug,
        Box::new(ConsoleSink::new().with_color(true).with_format("%T %L %s %M")),
    );
    logger
});

/// The process-wide default logger: a colored stdout console filter at
/// [`Level::Debug`], constructed on first access.
///
/// Applications that want anything else should construct a [`Logger`]
/// explicitly and pass it down.
#[must_use]
pub fn default_logger() -> &'static Logger {
    &DEFAULT
}
