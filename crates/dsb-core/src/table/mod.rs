//! Block Table: who owns which byte range, and the stealing protocol.
//!
//! All reads and writes go through one mutex and each operation holds it
//! only for its own duration, never across a network request. Because
//! `advance` and `try_steal_for` share the lock, a steal always sees the
//! donor's latest progress.

mod block;

pub use block::{split_point, Block};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::AllocationError;
use crate::range::ByteRange;

/// Identifier of a worker; stable for the worker's whole life, across steals.
pub type WorkerId = usize;

#[derive(Debug, Default)]
struct Inner {
    blocks: BTreeMap<WorkerId, Block>,
    steals: u64,
}

/// Shared record of block ownership and progress.
#[derive(Debug)]
pub struct BlockTable {
    inner: Mutex<Inner>,
    total_downloaded: AtomicU64,
    size: u64,
    chunk_size: u64,
}

impl BlockTable {
    /// Builds the table from the initial partition; worker `i` owns
    /// `initial[i]`. The blocks must tile `[0, size-1]` in order.
    pub fn new(size: u64, chunk_size: u64, initial: &[ByteRange]) -> Result<Self, AllocationError> {
        let mut next = 0u64;
        let mut prev: Option<ByteRange> = None;
        for r in initial {
            if r.is_empty() || r.start != next {
                let first = prev.unwrap_or(ByteRange::new(0, next.saturating_sub(1)));
                return Err(AllocationError::BadPartition { first, second: *r });
            }
            next = r.end + 1;
            prev = Some(*r);
        }
        if next != size {
            return Err(AllocationError::Coverage {
                covered: next,
                size,
            });
        }

        let blocks = initial
            .iter()
            .enumerate()
            .map(|(id, r)| (id, Block::fresh(*r)))
            .collect();
        Ok(Self {
            inner: Mutex::new(Inner { blocks, steals: 0 }),
            total_downloaded: AtomicU64::new(0),
            size,
            chunk_size,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AllocationError> {
        self.inner.lock().map_err(|_| AllocationError::Poisoned)
    }

    /// Current range of `worker`.
    pub fn assignment(&self, worker: WorkerId) -> Result<ByteRange, AllocationError> {
        let inner = self.lock()?;
        inner
            .blocks
            .get(&worker)
            .map(Block::range)
            .ok_or(AllocationError::UnknownWorker(worker))
    }

    /// Records `bytes` persisted by `worker` and returns its current `end`,
    /// which a steal may have moved since the worker last looked.
    pub fn advance(&self, worker: WorkerId, bytes: u64) -> Result<u64, AllocationError> {
        let mut inner = self.lock()?;
        let block = inner
            .blocks
            .get_mut(&worker)
            .ok_or(AllocationError::UnknownWorker(worker))?;
        if bytes > block.remaining() {
            return Err(AllocationError::AdvancePastEnd {
                worker,
                block: block.range(),
                downloaded: block.downloaded,
                bytes,
            });
        }
        block.downloaded += bytes;
        self.total_downloaded.fetch_add(bytes, Ordering::Relaxed);
        Ok(block.end)
    }

    /// Gives `worker` half of the largest unfetched remainder held by any
    /// other worker.
    ///
    /// Returns `None` when no donor has more than two chunks left; the
    /// worker's entry is then removed and it must terminate.
    pub fn try_steal_for(&self, worker: WorkerId) -> Result<Option<ByteRange>, AllocationError> {
        let mut inner = self.lock()?;

        // Strictly-greater comparison over ascending ids: ties go to the
        // lowest worker id.
        let mut donor: Option<(WorkerId, Block)> = None;
        for (&id, block) in inner.blocks.iter() {
            if id == worker {
                continue;
            }
            match donor {
                Some((_, best)) if block.remaining() <= best.remaining() => {}
                _ => donor = Some((id, *block)),
            }
        }

        let split = donor.and_then(|(id, block)| split_point(&block, self.chunk_size).map(|mid| (id, block, mid)));
        let Some((donor_id, donor_block, mid)) = split else {
            inner.blocks.remove(&worker);
            tracing::debug!(worker, "no donor left, worker retires");
            return Ok(None);
        };

        let stolen = ByteRange::new(mid + 1, donor_block.end);
        if let Some(d) = inner.blocks.get_mut(&donor_id) {
            d.end = mid;
        }
        inner.blocks.insert(worker, Block::fresh(stolen));
        inner.steals += 1;
        tracing::debug!(
            worker,
            donor = donor_id,
            donor_remaining = donor_block.remaining(),
            stolen = %stolen,
            "stole range"
        );
        Ok(Some(stolen))
    }

    /// Sum of bytes persisted by all workers.
    pub fn total_downloaded(&self) -> u64 {
        self.total_downloaded.load(Ordering::Relaxed)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Number of successful steals so far.
    pub fn steals(&self) -> Result<u64, AllocationError> {
        Ok(self.lock()?.steals)
    }

    /// Workers that still hold an entry.
    pub fn active_workers(&self) -> Result<usize, AllocationError> {
        Ok(self.lock()?.blocks.len())
    }

    /// Consistent copy of every entry, ordered by worker id.
    pub fn snapshot(&self) -> Result<Vec<(WorkerId, Block)>, AllocationError> {
        Ok(self
            .lock()?
            .blocks
            .iter()
            .map(|(id, b)| (*id, *b))
            .collect())
    }

    /// Unfetched tails of every block, sorted by offset.
    pub fn unfetched(&self) -> Result<Vec<ByteRange>, AllocationError> {
        let mut out: Vec<ByteRange> = self
            .lock()?
            .blocks
            .values()
            .filter_map(Block::unfetched)
            .collect();
        out.sort();
        Ok(out)
    }

    #[cfg(test)]
    fn with_blocks(size: u64, chunk_size: u64, blocks: Vec<(WorkerId, Block)>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                blocks: blocks.into_iter().collect(),
                steals: 0,
            }),
            total_downloaded: AtomicU64::new(0),
            size,
            chunk_size,
        }
    }
}

/// Checks that `ranges` tile `[0, size-1]` exactly once. Returns the first
/// gap or overlap found.
pub fn check_tiling(size: u64, ranges: &[ByteRange]) -> Result<(), AllocationError> {
    let mut sorted: Vec<ByteRange> = ranges.iter().copied().filter(|r| !r.is_empty()).collect();
    sorted.sort();
    let mut next = 0u64;
    let mut prev = ByteRange::new(0, 0);
    for r in sorted {
        if r.start != next {
            return Err(AllocationError::BadPartition { first: prev, second: r });
        }
        next = r.end + 1;
        prev = r;
    }
    if next != size {
        return Err(AllocationError::Coverage { covered: next, size });
    }
    Ok(())
}
