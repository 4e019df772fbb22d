//! Console sink: direct synchronous writes to a standard output stream.

use std::io::Write;

use crate::error::{LogError, Result};
use crate::format::{DEFAULT_TEMPLATE, format_record};
use crate::options::OptionValue;
use crate::record::{Level, LogRecord};
use crate::sink::Sink;

const COLOR_RESET: &str = "\x1b[0m";

/// Which standard stream a [`ConsoleSink`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// A sink that writes formatted records straight to stdout or stderr.
///
/// No buffering, no rotation; the caller is suspended only for the
/// underlying OS write.
#[derive(Debug)]
pub struct ConsoleSink {
    stream: ConsoleStream,
    format: String,
    color: bool,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    /// Creates a console sink writing to stdout with the standard template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stream: ConsoleStream::Stdout,
            format: DEFAULT_TEMPLATE.to_string(),
            color: false,
        }
    }

    /// Creates a console sink writing to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            stream: ConsoleStream::Stderr,
            ..Self::new()
        }
    }

    /// Sets the format template.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Enables or disables per-level ANSI coloring.
    #[must_use]
    pub const fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// ANSI color prefix for a level, if the level is colored at all.
    const fn color_code(level: Level) -> Option<&'static str> {
        match level {
            Level::Critical => Some("\x1b[1;31m"),
            Level::Error => Some("\x1b[31m"),
            Level::Warning => Some("\x1b[33m"),
            Level::Info => Some("\x1b[32m"),
            Level::Debug => Some("\x1b[35m"),
            Level::Trace => Some("\x1b[36m"),
            Level::Finest | Level::Fine => None,
        }
    }

    /// Renders one record to the exact bytes this sink would emit.
    fn render(&self, record: &LogRecord) -> String {
        let line = format_record(&self.format, record);
        if !self.color {
            return line;
        }
        match Self::color_code(record.level) {
            Some(code) => format!("{code}{line}{COLOR_RESET}"),
            None => line,
        }
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, record: &LogRecord) {
        let line = self.render(record);
        match self.stream {
            ConsoleStream::Stdout => {
                let _ = std::io::stdout().lock().write_all(line.as_bytes());
            }
            ConsoleStream::Stderr => {
                let _ = std::io::stderr().lock().write_all(line.as_bytes());
            }
        }
    }

    fn close(&mut self) {}

    fn set_option(&mut self, name: &str, value: &OptionValue) -> Result<()> {
        match name {
            "format" => {
                self.format = value.expect_str("format")?.to_string();
                Ok(())
            }
            other => Err(LogError::BadOption(other.to_string())),
        }
    }
}
