//! Network sinks: templated and structured socket writers.
//!
//! This module provides:
//! - [`SocketSink`] — One templated line per record over UDP or TCP
//! - [`StructuredSocketSink`] — The full record as self-describing JSON,
//!   one record per network write, no framing
//!
//! Both dial lazily on first write (or after any failure), report delivery
//! failures, and drop the affected record: at-most-once, best-effort.

use std::io::Write;
use std::net::{TcpStream, UdpSocket};
use std::str::FromStr;

use tracing::error;

use crate::error::{LogError, Result};
use crate::format::{DEFAULT_TEMPLATE, format_record};
use crate::options::OptionValue;
use crate::record::LogRecord;
use crate::sink::Sink;

/// Default endpoint for socket sinks.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:12124";

/// Transport protocol for socket sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Datagram transport (the default).
    #[default]
    Udp,
    /// Stream transport.
    Tcp,
}

impl FromStr for Protocol {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "udp" => Ok(Self::Udp),
            "tcp" => Ok(Self::Tcp),
            other => Err(LogError::bad_value(
                "protocol",
                format!("expected udp or tcp, got {other:?}"),
            )),
        }
    }
}

enum Conn {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// Lazily-dialed connection state shared by both socket sink variants.
struct Transport {
    protocol: Protocol,
    endpoint: String,
    conn: Option<Conn>,
}

impl Transport {
    fn new(protocol: Protocol, endpoint: impl Into<String>) -> Self {
        Self {
            protocol,
            endpoint: endpoint.into(),
            conn: None,
        }
    }

    fn dial(&mut self) -> std::io::Result<()> {
        self.conn = Some(match self.protocol {
            Protocol::Udp => {
                let socket = UdpSocket::bind("0.0.0.0:0")?;
                socket.connect(&self.endpoint)?;
                Conn::Udp(socket)
            }
            Protocol::Tcp => Conn::Tcp(TcpStream::connect(&self.endpoint)?),
        });
        Ok(())
    }

    /// Sends one payload; on any failure the record is dropped and the
    /// connection reset so the next call redials.
    fn send(&mut self, payload: &[u8]) {
        if self.conn.is_none() {
            if let Err(e) = self.dial() {
                error!(endpoint = %self.endpoint, error = %e, "socket dial failed, record dropped");
                self.conn = None;
                return;
            }
        }
        let outcome = match self.conn.as_mut() {
            Some(Conn::Udp(socket)) => socket.send(payload).map(|_| ()),
            Some(Conn::Tcp(stream)) => stream.write_all(payload),
            None => return,
        };
        if let Err(e) = outcome {
            error!(endpoint = %self.endpoint, error = %e, "socket write failed, record dropped");
            self.conn = None;
        }
    }

    fn set_protocol(&mut self, protocol: Protocol) {
        self.protocol = protocol;
        self.conn = None;
    }

    fn set_endpoint(&mut self, endpoint: String) {
        self.endpoint = endpoint;
        self.conn = None;
    }

    fn close(&mut self) {
        self.conn = None;
    }
}

/// A sink that sends one templated line per record to a remote endpoint.
pub struct SocketSink {
    transport: Transport,
    format: String,
}

impl SocketSink {
    /// Creates a socket sink for the given protocol and endpoint.
    #[must_use]
    pub fn new(protocol: Protocol, endpoint: impl Into<String>) -> Self {
        Self {
            transport: Transport::new(protocol, endpoint),
            format: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Sets the format template.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

impl Default for SocketSink {
    fn default() -> Self {
        Self::new(Protocol::Udp, DEFAULT_ENDPOINT)
    }
}

impl Sink for SocketSink {
    fn write(&mut self, record: &LogRecord) {
        let line = format_record(&self.format, record);
        self.transport.send(line.as_bytes());
    }

    fn close(&mut self) {
        self.transport.close();
    }

    fn set_option(&mut self, name: &str, value: &OptionValue) -> Result<()> {
        match name {
            "protocol" => {
                let protocol = value.expect_str("protocol")?.parse()?;
                self.transport.set_protocol(protocol);
                Ok(())
            }
            "endpoint" => {
                let endpoint = value.expect_str("endpoint")?;
                if endpoint.is_empty() {
                    return Err(LogError::bad_value("endpoint", "empty endpoint"));
                }
                self.transport.set_endpoint(endpoint.to_string());
                Ok(())
            }
            "format" => {
                self.format = value.expect_str("format")?.to_string();
                Ok(())
            }
            other => Err(LogError::BadOption(other.to_string())),
        }
    }
}

/// A sink that serializes the whole record as JSON so a remote collector
/// can reconstruct level, source, and time independently of any template.
pub struct StructuredSocketSink {
    transport: Transport,
}

impl StructuredSocketSink {
    /// Creates a structured socket sink for the given protocol and endpoint.
    #[must_use]
    pub fn new(protocol: Protocol, endpoint: impl Into<String>) -> Self {
        Self {
            transport: Transport::new(protocol, endpoint),
        }
    }
}

impl Default for StructuredSocketSink {
    fn default() -> Self {
        Self::new(Protocol::Udp, DEFAULT_ENDPOINT)
    }
}

impl Sink for StructuredSocketSink {
    fn write(&mut self, record: &LogRecord) {
        match serde_json::to_vec(record) {
            Ok(payload) => self.transport.send(&payload),
            Err(e) => {
                error!(endpoint = %self.transport.endpoint, error = %e, "record serialization failed");
            }
        }
    }

    fn close(&mut self) {
        self.transport.close();
    }

    fn set_option(&mut self, name: &str, value: &OptionValue) -> Result<()> {
        match name {
            "protocol" => {
                let protocol = value.expect_str("protocol")?.parse()?;
                self.transport.set_protocol(protocol);
                Ok(())
            }
            "endpoint" => {
                let endpoint = value.expect_str("endpoint")?;
                if endpoint.is_empty() {
                    return Err(LogError::bad_value("endpoint", "empty endpoint"));
                }
                self.transport.set_endpoint(endpoint.to_string());
                Ok(())
            }
            other => Err(LogError::BadOption(other.to_string())),
        }
    }
}
