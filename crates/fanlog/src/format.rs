//! Percent-directive template rendering for log records.
//!
//! This module provides:
//! - [`format_record`] — Renders a record through a format template
//! - Standard templates ([`DEFAULT_TEMPLATE`], [`SHORT_TEMPLATE`], [`ABBREV_TEMPLATE`])
//! - A process-wide cache of derived date/time/zone strings, recomputed at
//!   most once per wall-clock second
//!
//! Recognized directives:
//!
//! | Directive | Meaning                                  |
//! |-----------|------------------------------------------|
//! | `%T`      | Time `HH:MM:SS`                          |
//! | `%t`      | Time `HH:MM`                             |
//! | `%D`      | Date `YYYY/MM/DD`                        |
//! | `%d`      | Date `DD/MM/YY`                          |
//! | `%Z`      | Numeric zone offset (`+hhmm`)            |
//! | `%z`      | Zone abbreviation                        |
//! | `%L`      | 4-character level mnemonic               |
//! | `%S`      | Full source                              |
//! | `%s`      | Short source (after the last `/`)        |
//! | `%x`      | Short source without its extension       |
//! | `%M`      | Message verbatim                         |
//!
//! Unknown directives are dropped (the directive character is consumed,
//! surrounding literal text is preserved), as is a trailing lone `%`.
//! Exactly one newline is appended to every non-empty rendering.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, Timelike};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::record::LogRecord;

/// The standard log-line template: `[%D %T %z] [%L] (%S) %M`.
pub const DEFAULT_TEMPLATE: &str = "[%D %T %z] [%L] (%S) %M";

/// A shorter template: `[%t %d] [%L] %M`.
pub const SHORT_TEMPLATE: &str = "[%t %d] [%L] %M";

/// The abbreviated template: `[%L] %M`.
pub const ABBREV_TEMPLATE: &str = "[%L] %M";

/// Derived substrings for one wall-clock second.
///
/// Recomputation publishes a whole new snapshot; fields are never mutated
/// in place while readers may hold the previous snapshot.
struct TimeCache {
    secs: i64,
    long_time: String,
    short_time: String,
    long_date: String,
    short_date: String,
    long_zone: String,
    short_zone: String,
}

impl TimeCache {
    fn compute(t: &DateTime<Local>, secs: i64) -> Self {
        Self {
            secs,
            long_time: format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second()),
            short_time: format!("{:02}:{:02}", t.hour(), t.minute()),
            long_date: format!("{:04}/{:02}/{:02}", t.year(), t.month(), t.day()),
            short_date: format!("{:02}/{:02}/{:02}", t.day(), t.month(), t.year() % 100),
            long_zone: t.format("%z").to_string(),
            short_zone: t.format("%Z").to_string(),
        }
    }
}

static TIME_CACHE: Lazy<RwLock<Arc<TimeCache>>> = Lazy::new(|| {
    RwLock::new(Arc::new(TimeCache {
        secs: i64::MIN,
        long_time: String::new(),
        short_time: String::new(),
        long_date: String::new(),
        short_date: String::new(),
        long_zone: String::new(),
        short_zone: String::new(),
    }))
});

/// Returns the cache snapshot for the record's whole second, recomputing
/// and publishing a fresh snapshot only when the second has advanced.
fn snapshot_for(t: &DateTime<Local>) -> Arc<TimeCache> {
    let secs = t.timestamp();
    {
        let current = TIME_CACHE.read();
        if current.secs == secs {
            return Arc::clone(&current);
        }
    }
    let fresh = Arc::new(TimeCache::compute(t, secs));
    *TIME_CACHE.write() = Arc::clone(&fresh);
    fresh
}

/// Returns the source substring after the last path separator.
fn short_source(source: &str) -> &str {
    source.rsplit('/').next().unwrap_or(source)
}

/// Returns the short source without its extension.
fn extra_short_source(source: &str) -> &str {
    let short = short_source(source);
    match short.rfind('.') {
        Some(0) | None => short,
        Some(idx) => &short[..idx],
    }
}

/// Renders `record` through `template`.
///
/// Pure with respect to the record: a fixed record and template always
/// produce the same output, whether or not the time cache was warm.
/// An empty template renders the empty string; every other rendering ends
/// in exactly one newline.
#[must_use]
pub fn format_record(template: &str, record: &LogRecord) -> String {
    if template.is_empty() {
        return String::new();
    }

    let cache = snapshot_for(&record.created);
    let mut out = String::with_capacity(template.len() + record.message.len() + 16);

    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('T') => out.push_str(&cache.long_time),
            Some('t') => out.push_str(&cache.short_time),
            Some('D') => out.push_str(&cache.long_date),
            Some('d') => out.push_str(&cache.short_date),
            Some('Z') => out.push_str(&cache.long_zone),
            Some('z') => out.push_str(&cache.short_zone),
            Some('L') => out.push_str(record.level.mnemonic()),
            Some('S') => out.push_str(&record.source),
            Some('s') => out.push_str(short_source(&record.source)),
            Some('x') => out.push_str(extra_short_source(&record.source)),
            Some('M') => out.push_str(&record.message),
            // Unknown directive or trailing '%': dropped.
            Some(_) | None => {}
        }
    }

    out.push('\n');
    out
}
