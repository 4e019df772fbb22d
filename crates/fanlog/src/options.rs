//! Typed option values and numeric-suffix parsing.
//!
//! Sinks accept configuration through a closed value kind ([`OptionValue`])
//! rather than an open any-typed bag; each sink's `set_option` type-checks
//! the value for the named option and reports a bad-value condition without
//! disturbing the previous setting.

use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};

/// Base multiplier for byte-sized options (`flush`, `maxsize`).
pub const BYTE_SUFFIX_BASE: i64 = 1024;

/// Base multiplier for count-like options (`rotate`).
pub const COUNT_SUFFIX_BASE: i64 = 1000;

/// A configuration value accepted by [`crate::sink::Sink::set_option`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A string value, possibly carrying a numeric suffix.
    Str(String),
}

impl OptionValue {
    /// Returns the string content, if this value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Interprets this value as a string, or reports a bad-value condition.
    pub fn expect_str(&self, option: &str) -> Result<&str> {
        self.as_str()
            .ok_or_else(|| LogError::bad_value(option, "expected a string"))
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Parses a number with an optional `K`/`M`/`G` suffix (case-insensitive).
///
/// The suffix multiplies the numeric prefix by `base^1`, `base^2`, or
/// `base^3` respectively; no suffix means the literal integer.
fn parse_suffixed(s: &str, base: i64) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (digits, mult) = match s.as_bytes()[s.len() - 1] {
        b'K' | b'k' => (&s[..s.len() - 1], base),
        b'M' | b'm' => (&s[..s.len() - 1], base * base),
        b'G' | b'g' => (&s[..s.len() - 1], base * base * base),
        _ => (s, 1),
    };
    digits.trim().parse::<i64>().ok().map(|n| n * mult)
}

/// Interprets `value` as a size (or count) with suffix support.
///
/// Integers pass through verbatim; strings accept `K`/`M`/`G` suffixes
/// against `base` (1024 for byte options, 1000 for counts).
pub fn parse_size(value: &OptionValue, base: i64, option: &str) -> Result<i64> {
    match value {
        OptionValue::Int(v) => Ok(*v),
        OptionValue::Str(s) => parse_suffixed(s, base)
            .ok_or_else(|| LogError::bad_value(option, format!("not a size: {s:?}"))),
        OptionValue::Bool(_) => Err(LogError::bad_value(option, "expected a number")),
    }
}

/// Interprets `value` as a duration in whole seconds.
///
/// Integers are seconds. Strings accept an optional `s`/`m`/`h`/`d` suffix
/// and may be negative (a negative `delay0` disables midnight anchoring).
pub fn parse_duration_secs(value: &OptionValue, option: &str) -> Result<i64> {
    match value {
        OptionValue::Int(v) => Ok(*v),
        OptionValue::Str(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(LogError::bad_value(option, "empty duration"));
            }
            let (digits, mult) = match s.as_bytes()[s.len() - 1] {
                b's' => (&s[..s.len() - 1], 1),
                b'm' => (&s[..s.len() - 1], 60),
                b'h' => (&s[..s.len() - 1], 3600),
                b'd' => (&s[..s.len() - 1], 86400),
                _ => (s, 1),
            };
            digits
                .trim()
                .parse::<i64>()
                .map(|n| n * mult)
                .map_err(|_| LogError::bad_value(option, format!("not a duration: {s:?}")))
        }
        OptionValue::Bool(_) => Err(LogError::bad_value(option, "expected a duration")),
    }
}
