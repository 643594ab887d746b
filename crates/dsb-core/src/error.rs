//! Error taxonomy for the download engine.
//!
//! Transient fetch failures (`FetchError`) are retried where they happen and
//! only reach this level once the retry ceiling is exhausted. Allocation and
//! assembly errors mean the block bookkeeping is broken and always abort the
//! whole download.

use thiserror::Error;

use crate::fetcher::FetchError;
use crate::range::ByteRange;
use crate::table::WorkerId;

/// Block Table invariant violation.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("worker {0} has no block assigned")]
    UnknownWorker(WorkerId),
    #[error("worker {worker} advanced {bytes} bytes past its block {block} (already had {downloaded})")]
    AdvancePastEnd {
        worker: WorkerId,
        block: ByteRange,
        downloaded: u64,
        bytes: u64,
    },
    #[error("initial blocks {first} and {second} do not tile the resource")]
    BadPartition { first: ByteRange, second: ByteRange },
    #[error("initial blocks cover {covered} bytes, resource has {size}")]
    Coverage { covered: u64, size: u64 },
    #[error("block table lock poisoned")]
    Poisoned,
}

/// Part files do not tile the resource at join time.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("no part covers bytes {0}")]
    Missing(ByteRange),
    #[error("parts {first} and {second} overlap")]
    Overlap { first: ByteRange, second: ByteRange },
    #[error("assembled {actual} bytes, expected {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("assembly I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal outcome of a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid download options: {0}")]
    InvalidOptions(&'static str),
    #[error("worker {worker} gave up on {range} after {attempts} attempts: {source}")]
    Transport {
        worker: WorkerId,
        range: ByteRange,
        attempts: u32,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error("worker {worker} could not persist {range}: {source}")]
    Storage {
        worker: WorkerId,
        range: ByteRange,
        #[source]
        source: std::io::Error,
    },
    #[error("working directory {}: {source}", .path.display())]
    WorkDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("worker {0} panicked")]
    WorkerPanicked(WorkerId),
    #[error("could not start worker: {0}")]
    Spawn(#[source] std::io::Error),
}

impl DownloadError {
    /// True for errors that indicate broken block bookkeeping rather than a
    /// failing server or disk.
    pub fn is_scheduler_bug(&self) -> bool {
        match self {
            DownloadError::Allocation(_) => true,
            DownloadError::Assembly(e) => !matches!(e, AssemblyError::Io(_)),
            _ => false,
        }
    }
}
