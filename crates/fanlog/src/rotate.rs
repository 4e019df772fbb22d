//! Segment renumbering for rotated log files.
//!
//! This module provides:
//! - [`SegmentRotator`] — Renames just-closed log files into numbered
//!   historical slots (`<stem>.001<ext>` is always the most recent),
//!   pruning the oldest slot when the retention cap is reached
//!
//! At most one rotation worker per sink is active at a time; requests
//! arriving while one is in flight are queued into a small bounded queue
//! and merged into the running worker's loop.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

/// Maximum number of rotation requests that may wait for the worker.
const PENDING_CAPACITY: usize = 5;

/// One queued rotation request.
#[derive(Debug)]
struct PendingSegment {
    /// The live log filename the slots are derived from.
    filename: PathBuf,
    /// How many historical slots to retain.
    retain: usize,
    /// The transient, timestamp-named segment awaiting a slot.
    segment: PathBuf,
}

struct RotatorInner {
    pending: Mutex<VecDeque<PendingSegment>>,
    busy: AtomicBool,
    closed: AtomicBool,
}

/// Serializes segment renumbering for one file sink.
#[derive(Clone)]
pub struct SegmentRotator {
    inner: Arc<RotatorInner>,
}

impl Default for SegmentRotator {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentRotator {
    /// Creates an idle rotator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RotatorInner {
                pending: Mutex::new(VecDeque::new()),
                busy: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Queues `segment` for renumbering under `filename`'s slot sequence.
    ///
    /// Returns immediately; the rename work happens on the rotator's worker
    /// thread. A request that cannot be queued (rotator closed or queue at
    /// capacity) is reported and the segment is left under its transient
    /// name.
    pub fn request(&self, filename: &Path, retain: usize, segment: PathBuf) {
        if self.inner.closed.load(Ordering::Acquire) {
            warn!(segment = %segment.display(), "rotator closed, segment not renumbered");
            return;
        }

        {
            let mut pending = self.inner.pending.lock();
            if pending.len() >= PENDING_CAPACITY {
                warn!(segment = %segment.display(), "rotation queue full, segment not renumbered");
                return;
            }
            pending.push_back(PendingSegment {
                filename: filename.to_path_buf(),
                retain,
                segment,
            });
        }

        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let inner = Arc::clone(&self.inner);
            thread::spawn(move || worker_loop(&inner));
        }
    }

    /// Returns true while a worker is draining the queue.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// Waits (bounded retries) for the in-flight worker, then refuses
    /// further queuing.
    ///
    /// Any requests still queued are reported and returned as un-rotated
    /// segment paths.
    pub fn close_and_drain(&self) -> Vec<PathBuf> {
        for _ in 0..10 {
            if !self.inner.busy.load(Ordering::Acquire) {
                break;
            }
            thread::sleep(Duration::from_millis(100));
        }
        self.inner.closed.store(true, Ordering::Release);

        let mut leftover = Vec::new();
        let mut pending = self.inner.pending.lock();
        while let Some(job) = pending.pop_front() {
            warn!(segment = %job.segment.display(), "segment not rotated at shutdown");
            leftover.push(job.segment);
        }
        leftover
    }
}

fn worker_loop(inner: &RotatorInner) {
    loop {
        let job = inner.pending.lock().pop_front();
        match job {
            Some(job) => renumber_segment(&job.filename, job.retain, &job.segment),
            None => {
                inner.busy.store(false, Ordering::Release);
                // A request may have slipped in between the pop and the
                // store; reclaim the worker role or leave it to the spawner.
                if inner.pending.lock().is_empty()
                    || inner
                        .busy
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                {
                    return;
                }
            }
        }
    }
}

/// Builds the path of historical slot `n` for `filename`.
fn slot_path(filename: &Path, n: usize) -> PathBuf {
    let ext = filename
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stem = filename.with_extension("");
    PathBuf::from(format!("{}.{n:03}{ext}", stem.display()))
}

/// Places `segment` at slot 1, shifting existing slots up and pruning the
/// oldest when all `retain` slots are occupied.
fn renumber_segment(filename: &Path, retain: usize, segment: &Path) {
    if retain == 0 {
        return;
    }

    // First unoccupied slot, or the last one after pruning.
    let mut n = 1;
    while n <= retain && slot_path(filename, n).exists() {
        n += 1;
    }
    if n > retain {
        let oldest = slot_path(filename, retain);
        if let Err(e) = std::fs::remove_file(&oldest) {
            warn!(slot = %oldest.display(), error = %e, "failed to prune oldest segment");
        }
        n = retain;
    }

    // Shift occupied slots up by one, newest last so nothing is clobbered.
    while n > 1 {
        let prev = slot_path(filename, n - 1);
        let next = slot_path(filename, n);
        if let Err(e) = std::fs::rename(&prev, &next) {
            warn!(from = %prev.display(), to = %next.display(), error = %e, "segment shift failed");
        }
        n -= 1;
    }

    let first = slot_path(filename, 1);
    if let Err(e) = std::fs::rename(segment, &first) {
        warn!(segment = %segment.display(), slot = %first.display(), error = %e, "segment rename failed");
    }
}
