//! Progress reporting for downloads (bytes done, ETA, rate).
//!
//! Workers push snapshots through a bounded tokio channel with `try_send`,
//! so a slow consumer drops updates instead of stalling a transfer. Updates
//! closer together than [`MIN_REPORT_INTERVAL_MS`] are coalesced. The final
//! snapshot is always delivered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::mpsc::Sender;

use crate::table::BlockTable;

/// Snapshot of download progress (CLI-friendly).
#[derive(Debug, Clone)]
pub struct ProgressStats {
    /// Bytes persisted so far across all workers.
    pub bytes_done: u64,
    /// Total resource size in bytes.
    pub total_bytes: u64,
    /// Elapsed time since download start (seconds).
    pub elapsed_secs: f64,
    /// Workers still holding a block.
    pub active_workers: usize,
    /// Steals performed so far.
    pub steals: u64,
}

impl ProgressStats {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_done >= self.total_bytes
    }
}

/// Intermediate snapshots closer together than this are dropped.
pub const MIN_REPORT_INTERVAL_MS: u64 = 100;

const NEVER: u64 = u64::MAX;

/// Sends snapshots of a [`BlockTable`] to an optional consumer.
#[derive(Debug)]
pub(crate) struct ProgressReporter {
    tx: Option<Sender<ProgressStats>>,
    started: Instant,
    /// Milliseconds since `started` of the last intermediate send.
    last_sent_ms: AtomicU64,
}

impl ProgressReporter {
    pub(crate) fn new(tx: Option<Sender<ProgressStats>>) -> Self {
        Self {
            tx,
            started: Instant::now(),
            last_sent_ms: AtomicU64::new(NEVER),
        }
    }

    fn snapshot(&self, table: &BlockTable) -> ProgressStats {
        ProgressStats {
            bytes_done: table.total_downloaded(),
            total_bytes: table.size(),
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            active_workers: table.active_workers().unwrap_or(0),
            steals: table.steals().unwrap_or(0),
        }
    }

    /// Claims the next send slot; false if another report went out less than
    /// [`MIN_REPORT_INTERVAL_MS`] ago.
    fn due(&self) -> bool {
        let now = self.started.elapsed().as_millis() as u64;
        let last = self.last_sent_ms.load(Ordering::Relaxed);
        if last != NEVER && now.saturating_sub(last) < MIN_REPORT_INTERVAL_MS {
            return false;
        }
        self.last_sent_ms
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }

    /// Intermediate snapshot from a worker. Never blocks.
    pub(crate) fn report(&self, table: &BlockTable) {
        let Some(tx) = &self.tx else { return };
        if self.due() {
            let _ = tx.try_send(self.snapshot(table));
        }
    }

    /// Final snapshot, waiting for channel capacity if needed.
    ///
    /// Must not be called from an async context; `download` runs on a plain
    /// or `spawn_blocking` thread.
    pub(crate) fn finish(&self, table: &BlockTable) {
        let Some(tx) = &self.tx else { return };
        // Err only if the receiver is gone.
        let _ = tx.blocking_send(self.snapshot(table));
    }
}
