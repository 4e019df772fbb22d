//! The sink capability trait.
//!
//! A sink is a configured destination for formatted log records. The engine
//! ships a closed set of implementations — [`crate::console::ConsoleSink`],
//! [`crate::file::FileSink`], [`crate::socket::SocketSink`], and
//! [`crate::socket::StructuredSocketSink`] — and the dispatch table holds
//! them as trait objects.

use crate::error::Result;
use crate::options::OptionValue;
use crate::record::LogRecord;

/// Capability interface shared by every sink.
///
/// Exactly three operations: deliver a record, close, and refine
/// configuration before first use. `write` never reports an error to the
/// caller; delivery failures are diagnosed internally and the sink recovers
/// on a later call.
pub trait Sink: Send {
    /// Delivers one record to this sink.
    ///
    /// File sinks enqueue; all other sinks write synchronously. A full
    /// bounded queue blocks the caller until space is available.
    fn write(&mut self, record: &LogRecord);

    /// Stops accepting records and releases any owned resources.
    ///
    /// File sinks drain every queued record first. Closing twice is safe.
    fn close(&mut self);

    /// Applies one named configuration option.
    ///
    /// # Errors
    ///
    /// [`crate::error::LogError::BadOption`] for a name this sink does not
    /// recognize, [`crate::error::LogError::BadValue`] for a recognized
    /// name with a value of the wrong kind; the previous setting stays in
    /// effect on error.
    fn set_option(&mut self, name: &str, value: &OptionValue) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogError;
    use crate::record::Level;

    /// A minimal sink that records what happens to it.
    struct ProbeSink {
        written: Vec<String>,
        closed: bool,
        format: String,
    }

    impl ProbeSink {
        fn new() -> Self {
            Self {
                written: Vec::new(),
                closed: false,
                format: "%M".to_string(),
            }
        }
    }

    impl Sink for ProbeSink {
        fn write(&mut self, record: &LogRecord) {
            self.written.push(record.message.clone());
        }

        fn close(&mut self) {
            self.closed = true;
        }

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

    #[test]
    fn trait_object_dispatch() {
        let mut probe = ProbeSink::new();
        {
            let sink: &mut dyn Sink = &mut probe;
            sink.write(&LogRecord::new(Level::Info, "s", "one"));
            sink.write(&LogRecord::new(Level::Info, "s", "two"));
            sink.close();
        }
        assert_eq!(probe.written, vec!["one".to_string(), "two".to_string()]);
        assert!(probe.closed);
    }

    #[test]
    fn set_option_error_keeps_previous_value() {
        let mut sink = ProbeSink::new();
        assert!(sink.set_option("format", &OptionValue::from("[%L] %M")).is_ok());
        assert!(sink.set_option("format", &OptionValue::Int(3)).is_err());
        assert_eq!(sink.format, "[%L] %M");
        assert!(sink.set_option("nope", &OptionValue::from("x")).is_err());
    }
}
