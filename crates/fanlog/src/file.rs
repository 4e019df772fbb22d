//! Buffered rotating file sink.
//!
//! This module provides:
//! - [`FileSink`] — Queues formatted records to a dedicated writer thread
//!   that owns the file handle, flushes when idle, and rotates on both
//!   size and elapsed-time triggers
//! - [`FileWriter`] — The lazily-opened file handle with optional
//!   write buffering and a tracked byte offset
//!
//! One writer thread per sink. Callers block only when the bounded message
//! queue is at capacity; a capacity of 0 makes delivery synchronous.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::{Receiver, Sender, bounded, select};
use parking_lot::Mutex;
use tracing::error;

use crate::error::{LogError, Result};
use crate::format::{DEFAULT_TEMPLATE, format_record};
use crate::options::{
    BYTE_SUFFIX_BASE, COUNT_SUFFIX_BASE, OptionValue, parse_duration_secs, parse_size,
};
use crate::record::{Level, LogRecord};
use crate::rotate::SegmentRotator;
use crate::sink::Sink;

/// Default capacity of the internal message queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Default seconds between time-triggered rotations (one day).
const DEFAULT_CYCLE_SECS: i64 = 86400;

/// Default byte threshold for size-triggered rotation.
const DEFAULT_MAX_SIZE: i64 = 10 * 1024 * 1024;

/// Default buffering size in bytes; 0 disables buffering.
const DEFAULT_FLUSH_BYTES: i64 = 4096;

/// Smallest accepted rotation cycle.
const MIN_CYCLE_SECS: i64 = 2;

enum FileBackend {
    Plain(File),
    Buffered(BufWriter<File>),
}

/// The live file handle: opened lazily on first write, closed on rotation,
/// reopened transparently by the next write.
pub struct FileWriter {
    filename: PathBuf,
    flush_bytes: i64,
    backend: Option<FileBackend>,
    offset: u64,
}

impl FileWriter {
    fn new(filename: PathBuf, flush_bytes: i64) -> Self {
        Self {
            filename,
            flush_bytes,
            backend: None,
            offset: 0,
        }
    }

    /// Path of the live file.
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Current size of the live file in bytes.
    ///
    /// While the handle is open this is the tracked offset (which, unlike a
    /// seek, also counts still-buffered bytes); otherwise the on-disk size.
    #[must_use]
    pub fn size(&self) -> u64 {
        if self.backend.is_some() {
            self.offset
        } else {
            fs::metadata(&self.filename).map(|m| m.len()).unwrap_or(0)
        }
    }

    fn open(&mut self) -> io::Result<()> {
        if let Some(parent) = self.filename.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.filename)?;
        self.offset = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.backend = Some(if self.flush_bytes > 0 {
            FileBackend::Buffered(BufWriter::with_capacity(self.flush_bytes as usize, file))
        } else {
            FileBackend::Plain(file)
        });
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        if self.backend.is_none() {
            self.open()?;
        }
        if let Some(backend) = self.backend.as_mut() {
            match backend {
                FileBackend::Plain(f) => f.write_all(s.as_bytes())?,
                FileBackend::Buffered(w) => w.write_all(s.as_bytes())?,
            }
            self.offset += s.len() as u64;
        }
        Ok(())
    }

    fn flush(&mut self) {
        match self.backend.as_mut() {
            Some(FileBackend::Buffered(w)) => {
                let _ = w.flush();
            }
            Some(FileBackend::Plain(f)) => {
                let _ = f.sync_all();
            }
            None => {}
        }
    }

    fn close(&mut self) {
        if let Some(backend) = self.backend.take() {
            match backend {
                FileBackend::Buffered(mut w) => {
                    let _ = w.flush();
                }
                FileBackend::Plain(f) => {
                    let _ = f.sync_all();
                }
            }
        }
        self.offset = 0;
    }

    fn set_filename(&mut self, filename: PathBuf) {
        self.close();
        self.filename = filename;
    }

    fn set_flush_bytes(&mut self, flush_bytes: i64) {
        self.close();
        self.flush_bytes = flush_bytes;
    }
}

/// Header/footer templates, rendered with a blank record at emit time.
#[derive(Default)]
struct Framing {
    header: String,
    footer: String,
}

/// State shared between the sink handle and its writer thread.
///
/// The handle mutex is the single guard for handle swaps during option
/// changes and rotation; everything else crossing the thread boundary is
/// atomic or message-passed.
struct Shared {
    writer: Mutex<FileWriter>,
    framing: Mutex<Framing>,
    rotate_count: AtomicI64,
    max_size: AtomicI64,
}

impl Shared {
    fn blank_record() -> LogRecord {
        LogRecord::new(Level::Finest, "", "")
    }

    /// Writes one formatted line, emitting the header first when the
    /// target file is still empty.
    fn write_message(&self, line: &str) {
        if line.is_empty() {
            return;
        }
        let mut writer = self.writer.lock();
        let header = {
            let framing = self.framing.lock();
            if framing.header.is_empty() || writer.size() > 0 {
                None
            } else {
                Some(format_record(&framing.header, &Self::blank_record()))
            }
        };
        if let Some(header) = header {
            if let Err(e) = writer.write_str(&header) {
                error!(file = %writer.filename().display(), error = %e, "header write failed");
            }
        }
        if let Err(e) = writer.write_str(line) {
            error!(file = %writer.filename().display(), error = %e, "log write failed");
        }
    }

    /// Rotates the live file if it has outgrown the size threshold.
    ///
    /// No-op when the file is empty or within bounds. With a retention
    /// count of zero the file is deleted outright; otherwise it is renamed
    /// to a timestamped segment and handed to the rotator asynchronously.
    fn rotate(&self, rotator: &SegmentRotator) {
        let mut writer = self.writer.lock();
        let size = writer.size();
        let threshold = self.max_size.load(Ordering::Acquire).max(0) as u64;
        if size == 0 || size <= threshold {
            return;
        }

        {
            let framing = self.framing.lock();
            if !framing.footer.is_empty() {
                let footer = format_record(&framing.footer, &Self::blank_record());
                let _ = writer.write_str(&footer);
            }
        }
        writer.close();

        let filename = writer.filename().to_path_buf();
        let rotate_count = self.rotate_count.load(Ordering::Acquire);
        if rotate_count <= 0 {
            if let Err(e) = fs::remove_file(&filename) {
                error!(file = %filename.display(), error = %e, "failed to delete rotated file");
            }
            return;
        }

        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        // Same-second rotations must not clobber a segment still waiting in
        // the rotator queue.
        let mut segment = PathBuf::from(format!("{}.{stamp}", filename.display()));
        let mut seq = 1;
        while segment.exists() {
            segment = PathBuf::from(format!("{}.{stamp}-{seq}", filename.display()));
            seq += 1;
        }
        match fs::rename(&filename, &segment) {
            Ok(()) => rotator.request(&filename, rotate_count as usize, segment),
            Err(e) => {
                // Rotation abandoned for this cycle; keep writing to the
                // original path.
                error!(file = %filename.display(), to = %segment.display(), error = %e, "rotation rename failed");
            }
        }
    }

    /// Final drain step: footer (if the file has content) and handle release.
    fn finish(&self) {
        let mut writer = self.writer.lock();
        if writer.size() > 0 {
            let framing = self.framing.lock();
            if !framing.footer.is_empty() {
                let footer = format_record(&framing.footer, &Self::blank_record());
                let _ = writer.write_str(&footer);
            }
        }
        writer.close();
    }
}

/// Computes the next absolute rotation instant.
///
/// `delay0 < 0` anchors at `now + cycle`; otherwise at the next local
/// midnight plus `delay0` seconds.
fn next_rotate_instant(cycle: i64, delay0: i64) -> Instant {
    let now = Local::now();
    let target = if delay0 < 0 {
        now + chrono::Duration::seconds(cycle)
    } else {
        now.date_naive()
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|ndt| ndt.and_local_timezone(Local).earliest())
            .map_or_else(
                || now + chrono::Duration::seconds(cycle),
                |midnight| midnight + chrono::Duration::seconds(delay0),
            )
    };
    let until = (target - now).to_std().unwrap_or(Duration::ZERO);
    Instant::now() + until
}

/// The writer thread: services messages, the rotation timer, and policy
/// changes in one cooperative loop, then drains and closes on shutdown.
fn write_loop(
    shared: &Shared,
    rotator: &SegmentRotator,
    messages: &Receiver<String>,
    resets: &Receiver<(i64, i64)>,
    mut cycle: i64,
    mut delay0: i64,
) {
    let mut deadline = next_rotate_instant(cycle, delay0);

    loop {
        let timeout = deadline.saturating_duration_since(Instant::now());
        select! {
            recv(messages) -> msg => {
                match msg {
                    Ok(line) => {
                        shared.write_message(&line);
                        // Bounded staleness: no unflushed data survives an
                        // idle queue.
                        if messages.is_empty() {
                            shared.writer.lock().flush();
                        }
                        let max_size = shared.max_size.load(Ordering::Acquire);
                        if max_size > 0 && shared.writer.lock().size() > max_size as u64 {
                            shared.rotate(rotator);
                        }
                    }
                    // Queue closed; crossbeam delivers every queued message
                    // before disconnecting, so the drain is already complete.
                    Err(_) => break,
                }
            },
            recv(resets) -> msg => {
                if let Ok((new_cycle, new_delay0)) = msg {
                    if new_cycle != cycle || new_delay0 != delay0 {
                        cycle = new_cycle.max(MIN_CYCLE_SECS);
                        delay0 = new_delay0;
                        deadline = next_rotate_instant(cycle, delay0);
                    }
                }
            },
            default(timeout) => {
                shared.rotate(rotator);
                deadline += Duration::from_secs(cycle.max(MIN_CYCLE_SECS) as u64);
            },
        }
    }

    shared.finish();
}

/// Default log filename for declaratively-configured file sinks:
/// the executable's stem with a `.log` extension.
#[must_use]
pub fn default_filename() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| {
            exe.file_stem()
                .map(|stem| PathBuf::from(format!("{}.log", stem.to_string_lossy())))
        })
        .unwrap_or_else(|| PathBuf::from("fanlog.log"))
}

/// A sink that writes formatted records to a rotating log file through a
/// dedicated writer thread.
pub struct FileSink {
    shared: Arc<Shared>,
    rotator: SegmentRotator,
    format: String,
    queue_capacity: usize,
    cycle: i64,
    delay0: i64,
    sender: Option<Sender<String>>,
    reset_sender: Option<Sender<(i64, i64)>>,
    worker: Option<JoinHandle<()>>,
    closed: bool,
}

impl FileSink {
    /// Creates a file sink for `filename`, retaining `rotate` historical
    /// segments (0 = delete on rotation instead of keeping history).
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>, rotate: i64) -> Self {
        Self {
            shared: Arc::new(Shared {
                writer: Mutex::new(FileWriter::new(filename.into(), DEFAULT_FLUSH_BYTES)),
                framing: Mutex::new(Framing::default()),
                rotate_count: AtomicI64::new(rotate),
                max_size: AtomicI64::new(DEFAULT_MAX_SIZE),
            }),
            rotator: SegmentRotator::new(),
            format: DEFAULT_TEMPLATE.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            cycle: DEFAULT_CYCLE_SECS,
            delay0: 0,
            sender: None,
            reset_sender: None,
            worker: None,
            closed: false,
        }
    }

    /// A file sink preconfigured to frame records as an XML log document.
    #[must_use]
    pub fn xml(filename: impl Into<PathBuf>, rotate: i64) -> Self {
        let sink = Self::new(filename, rotate).with_format(
            "\t<record level=\"%L\">\n\
             \t\t<timestamp>%D %T</timestamp>\n\
             \t\t<source>%S</source>\n\
             \t\t<message>%M</message>\n\
             \t</record>",
        );
        {
            let mut framing = sink.shared.framing.lock();
            framing.header = "<log created=\"%D %T\">".to_string();
            framing.footer = "</log>".to_string();
        }
        sink
    }

    /// Sets the format template.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Sets the message queue capacity; 0 makes delivery synchronous.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the size-rotation threshold in bytes; ≤ 0 disables the size
    /// trigger on the write path.
    #[must_use]
    pub fn with_max_size(self, max_size: i64) -> Self {
        self.shared.max_size.store(max_size, Ordering::Release);
        self
    }

    /// Sets the buffering size in bytes; 0 means every write reaches the OS.
    #[must_use]
    pub fn with_flush_bytes(self, flush_bytes: i64) -> Self {
        self.shared.writer.lock().set_flush_bytes(flush_bytes.max(0));
        self
    }

    /// Sets the header template, written whenever an empty file gains its
    /// first line.
    #[must_use]
    pub fn with_header(self, header: impl Into<String>) -> Self {
        self.shared.framing.lock().header = header.into();
        self
    }

    /// Sets the footer template, written before rotation and on close.
    #[must_use]
    pub fn with_footer(self, footer: impl Into<String>) -> Self {
        self.shared.framing.lock().footer = footer.into();
        self
    }

    /// Sets the rotation cycle in seconds (clamped to a 2-second minimum).
    #[must_use]
    pub fn with_cycle_secs(mut self, cycle: i64) -> Self {
        self.cycle = cycle.max(MIN_CYCLE_SECS);
        self
    }

    /// Sets the midnight-anchoring delay in seconds; negative anchors the
    /// first rotation at `now + cycle` instead.
    #[must_use]
    pub const fn with_midnight_delay_secs(mut self, delay0: i64) -> Self {
        self.delay0 = delay0;
        self
    }

    fn ensure_worker(&mut self) {
        if self.worker.is_some() || self.closed {
            return;
        }
        let (sender, receiver) = bounded(self.queue_capacity);
        let (reset_sender, reset_receiver) = bounded(5);
        let shared = Arc::clone(&self.shared);
        let rotator = self.rotator.clone();
        let (cycle, delay0) = (self.cycle, self.delay0);
        self.worker = Some(std::thread::spawn(move || {
            write_loop(&shared, &rotator, &receiver, &reset_receiver, cycle, delay0);
        }));
        self.sender = Some(sender);
        self.reset_sender = Some(reset_sender);
    }

    /// Signals the running writer loop that cycle/delay changed.
    fn signal_policy_change(&self) {
        if let Some(reset) = &self.reset_sender {
            let _ = reset.try_send((self.cycle, self.delay0));
        }
    }
}

impl Sink for FileSink {
    /// Formats the record and enqueues it for the writer thread, spawning
    /// the thread on first use. Blocks only while the queue is full.
    /// Records written after `close` are dropped.
    fn write(&mut self, record: &LogRecord) {
        if self.closed {
            return;
        }
        let line = format_record(&self.format, record);
        self.ensure_worker();
        if let Some(sender) = &self.sender {
            let _ = sender.send(line);
        }
    }

    /// Stops intake, drains every queued record to disk, writes the footer,
    /// releases the handle, and drains the segment rotator. Idempotent.
    fn close(&mut self) {
        self.sender.take();
        self.reset_sender.take();
        // A sink that never wrote has no worker and nothing to drain.
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        let _ = self.rotator.close_and_drain();
        self.closed = true;
    }

    fn set_option(&mut self, name: &str, value: &OptionValue) -> Result<()> {
        match name {
            "filename" => {
                let filename = value.expect_str("filename")?;
                if filename.is_empty() {
                    return Err(LogError::bad_value("filename", "empty path"));
                }
                let path = PathBuf::from(filename);
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                self.shared.writer.lock().set_filename(path);
                Ok(())
            }
            "flush" => {
                let bytes = parse_size(value, BYTE_SUFFIX_BASE, "flush")?;
                self.shared.writer.lock().set_flush_bytes(bytes.max(0));
                Ok(())
            }
            "rotate" => {
                let count = parse_size(value, COUNT_SUFFIX_BASE, "rotate")?;
                self.shared.rotate_count.store(count, Ordering::Release);
                Ok(())
            }
            "maxsize" => {
                let bytes = parse_size(value, BYTE_SUFFIX_BASE, "maxsize")?;
                self.shared.max_size.store(bytes, Ordering::Release);
                Ok(())
            }
            "cycle" => {
                let secs = parse_duration_secs(value, "cycle")?;
                self.cycle = secs.max(MIN_CYCLE_SECS);
                self.signal_policy_change();
                Ok(())
            }
            "delay0" => {
                let secs = parse_duration_secs(value, "delay0")?;
                self.delay0 = secs;
                self.signal_policy_change();
                Ok(())
            }
            "format" => {
                self.format = value.expect_str("format")?.to_string();
                Ok(())
            }
            "head" => {
                self.shared.framing.lock().header = value.expect_str("head")?.to_string();
                Ok(())
            }
            "foot" => {
                self.shared.framing.lock().footer = value.expect_str("foot")?.to_string();
                Ok(())
            }
            other => Err(LogError::BadOption(other.to_string())),
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if !self.closed {
            self.close();
        }
    }
}
