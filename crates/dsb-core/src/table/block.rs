//! One worker's current assignment and the steal split rule.

use crate::range::ByteRange;

/// Contiguous range currently assigned to a worker plus its progress on it.
///
/// `downloaded` counts bytes persisted for this assignment only; it starts at
/// zero again when the worker receives a stolen range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: u64,
    pub end: u64,
    pub downloaded: u64,
}

impl Block {
    pub fn fresh(range: ByteRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
            downloaded: 0,
        }
    }

    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.start, self.end)
    }

    /// Bytes assigned but not yet persisted.
    pub fn remaining(&self) -> u64 {
        self.range().len().saturating_sub(self.downloaded)
    }

    /// Next offset to fetch.
    pub fn cursor(&self) -> u64 {
        self.start + self.downloaded
    }

    /// The unfetched tail, if any.
    pub fn unfetched(&self) -> Option<ByteRange> {
        if self.remaining() == 0 {
            None
        } else {
            Some(ByteRange::new(self.cursor(), self.end))
        }
    }
}

/// Where to cut a donor block, or `None` when its remainder is too small to
/// share.
///
/// A block is split only when more than two chunks remain, so the donor
/// keeps at least one full chunk beyond whatever it has in flight and the
/// thief gets a non-trivial range. The cut is the midpoint of the unfetched
/// part: the donor keeps `[cursor, mid]`, the thief gets `[mid + 1, end]`.
pub fn split_point(block: &Block, chunk_size: u64) -> Option<u64> {
    let remaining = block.remaining();
    if remaining <= chunk_size.saturating_mul(2) {
        return None;
    }
    Some(block.start + block.downloaded + (block.end - block.start - block.downloaded) / 2)
}
