//! Download orchestration: partition, launch workers, join, assemble.
//!
//! [`download`] drives an arbitrary [`RangeFetcher`] over a resource of known
//! size. [`download_url`] adds the probe and working-directory layout used
//! by the CLI.

mod run;
mod url;

pub use url::{download_url, working_dir};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::assembler;
use crate::config::DsbConfig;
use crate::error::{AllocationError, DownloadError};
use crate::fetcher::RangeFetcher;
use crate::part_store::PartStore;
use crate::progress::{ProgressReporter, ProgressStats};
use crate::range::plan_blocks;
use crate::retry::RetryPolicy;
use crate::table::BlockTable;

/// Scheduler knobs for one download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub max_workers: usize,
    pub chunk_size: u64,
    pub min_block_size: u64,
    pub retry: RetryPolicy,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::from_config(&DsbConfig::default())
    }
}

impl DownloadOptions {
    /// Rejects knobs the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.max_workers == 0 {
            return Err(DownloadError::InvalidOptions("max_workers must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(DownloadError::InvalidOptions("chunk_size must be at least 1 byte"));
        }
        if self.min_block_size == 0 {
            return Err(DownloadError::InvalidOptions("min_block_size must be at least 1 byte"));
        }
        if self.retry.max_attempts == 0 {
            return Err(DownloadError::InvalidOptions("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }

    pub fn from_config(cfg: &DsbConfig) -> Self {
        Self {
            max_workers: cfg.max_workers,
            chunk_size: cfg.chunk_size,
            min_block_size: cfg.min_block_size,
            retry: cfg.retry_policy(),
        }
    }
}

/// Outcome of a completed download.
#[derive(Debug, Clone)]
pub struct DownloadSummary {
    pub output: PathBuf,
    pub total_bytes: u64,
    pub workers: usize,
    pub steals: u64,
    /// Failed fetch attempts that were retried, across all workers.
    pub retries: u64,
    pub elapsed: Duration,
}

/// Downloads `size` bytes through `fetcher` into `output`.
///
/// Part files are written to `work_dir` and removed by the assembler once
/// every worker has terminated. On failure the parts are left in place and
/// the first fatal worker error is returned.
///
/// Blocks until done; call it from a plain thread or `spawn_blocking`, not
/// from an async task.
pub fn download<F>(
    fetcher: F,
    size: u64,
    work_dir: &Path,
    output: &Path,
    opts: &DownloadOptions,
    progress_tx: Option<tokio::sync::mpsc::Sender<ProgressStats>>,
) -> Result<DownloadSummary, DownloadError>
where
    F: RangeFetcher + 'static,
{
    opts.validate()?;
    let started = Instant::now();
    let blocks = plan_blocks(size, opts.max_workers, opts.min_block_size);
    let table = BlockTable::new(size, opts.chunk_size, &blocks)?;
    let store = PartStore::create(work_dir).map_err(|source| DownloadError::WorkDir {
        path: work_dir.to_path_buf(),
        source,
    })?;
    tracing::info!(
        size,
        workers = blocks.len(),
        chunk_size = opts.chunk_size,
        "starting download"
    );

    let joined = run::spawn_and_join(
        fetcher,
        table,
        store,
        opts.retry,
        ProgressReporter::new(progress_tx),
        blocks.len(),
    )?;

    let done = joined.shared.table.total_downloaded();
    if done != size {
        return Err(AllocationError::Coverage { covered: done, size }.into());
    }

    let written = assembler::assemble(&joined.shared.store, output, size)?;
    joined.shared.progress.finish(&joined.shared.table);

    let summary = DownloadSummary {
        output: output.to_path_buf(),
        total_bytes: written,
        workers: blocks.len(),
        steals: joined.shared.table.steals()?,
        retries: joined.reports.iter().map(|r| r.retries as u64).sum(),
        elapsed: started.elapsed(),
    };
    tracing::info!(
        bytes = summary.total_bytes,
        steals = summary.steals,
        retries = summary.retries,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "download complete"
    );
    Ok(summary)
}
