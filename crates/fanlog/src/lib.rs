//! # fanlog
//!
//! Pluggable multi-sink logging engine.
//!
//! Leveled, timestamped records fan out through a named filter table to any
//! combination of sinks, each with its own severity threshold and format
//! template:
//!
//! - [`Logger`] — The filter dispatch table and convenience API
//! - [`Level`] / [`LogRecord`] — Severity enumeration and the record value
//! - [`ConsoleSink`] — Direct synchronous stdout/stderr writes
//! - [`FileSink`] — Buffered rotating file writer with a dedicated writer
//!   thread, size- and time-triggered rotation
//! - [`SegmentRotator`] — Renumbers historical segments (`.001` newest)
//! - [`SocketSink`] / [`StructuredSocketSink`] — Best-effort UDP/TCP
//!   delivery, templated or as self-describing JSON
//! - [`FilterConfig`] — Declarative filter definitions with
//!   validate-all-then-activate loading
//!
//! ## Example
//!
//! ```rust,no_run
//! use fanlog::{ConsoleSink, FileSink, Level, Logger};
//!
//! let logger = Logger::new();
//! logger.add_filter(
//!     "stdout",
//!     Level::Info,
//!     Box::new(ConsoleSink::new().with_format("[%L] %M")),
//! );
//! logger.add_filter(
//!     "file",
//!     Level::Debug,
//!     Box::new(FileSink::new("logs/app.log", 5).with_max_size(10 * 1024 * 1024)),
//! );
//!
//! logger.info("engine started");
//! let err = logger.warn("cache miss rate high");
//! drop(err); // log-and-propagate when useful
//! logger.close();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod console;
pub mod error;
pub mod file;
pub mod format;
pub mod logger;
pub mod options;
pub mod record;
pub mod rotate;
pub mod sink;
pub mod socket;

// Re-export main types
pub use config::{FilterConfig, FilterOption};
pub use console::{ConsoleSink, ConsoleStream};
pub use error::{ConfigErrors, ConfigIssue, LogError, LoggedError, Result};
pub use file::{DEFAULT_QUEUE_CAPACITY, FileSink, FileWriter};
pub use format::{ABBREV_TEMPLATE, DEFAULT_TEMPLATE, SHORT_TEMPLATE, format_record};
pub use logger::{FilterEntry, Logger, default_logger};
pub use options::{OptionValue, parse_duration_secs, parse_size};
pub use record::{Level, LogRecord};
pub use rotate::SegmentRotator;
pub use sink::Sink;
pub use socket::{DEFAULT_ENDPOINT, Protocol, SocketSink, StructuredSocketSink};
