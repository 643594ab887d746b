//! Byte range math and the initial block partition.
//!
//! Every range in this crate is inclusive on both ends, matching the HTTP
//! `Range: bytes=a-b` form sent on the wire.

use std::fmt;

/// Inclusive byte range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteRange {
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered. A range with `end < start` is empty.
    pub fn len(&self) -> u64 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset <= self.end
    }

    pub fn overlaps(&self, other: &ByteRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start <= other.end && other.start <= self.end
    }

    /// The chunk a fetch at `cursor` should request: at most `chunk_size`
    /// bytes, never past `end`.
    pub fn chunk_at(&self, cursor: u64, chunk_size: u64) -> ByteRange {
        let last = cursor.saturating_add(chunk_size.max(1) - 1).min(self.end);
        ByteRange::new(cursor, last)
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }

    /// Value for curl's `CURLOPT_RANGE`, which omits the `bytes=` unit.
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Number of workers to launch for a resource of `size` bytes.
///
/// Each worker gets at least `min_block_size` bytes unless that would leave
/// no worker at all; never more than `max_workers`.
pub fn worker_count(size: u64, max_workers: usize, min_block_size: u64) -> usize {
    if size == 0 || max_workers == 0 {
        return 0;
    }
    let by_size = size / min_block_size.max(1);
    (by_size.min(max_workers as u64) as usize).max(1)
}

/// Splits `[0, size-1]` into the initial blocks, one per worker.
///
/// Blocks are `size / n` bytes; the last one absorbs the remainder and ends
/// at `size - 1`. Returns an empty vec for an empty resource.
pub fn plan_blocks(size: u64, max_workers: usize, min_block_size: u64) -> Vec<ByteRange> {
    let n = worker_count(size, max_workers, min_block_size);
    if n == 0 {
        return Vec::new();
    }

    let per = size / n as u64;
    let mut out = Vec::with_capacity(n);
    for i in 0..n as u64 {
        let start = i * per;
        let end = if i + 1 == n as u64 {
            size - 1
        } else {
            (i + 1) * per - 1
        };
        out.push(ByteRange::new(start, end));
    }
    out
}
