//! In-memory `RangeFetcher` with fault injection and a slow worker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use dsb_core::{ByteRange, FetchError, RangeFetcher};

#[derive(Default)]
pub struct MemoryFetcher {
    data: Arc<Vec<u8>>,
    /// Fetches issued from this thread name sleep for `slow_delay` first.
    slow_thread: Option<String>,
    slow_delay: Duration,
    /// Chunk start -> remaining failures. `u32::MAX` never recovers.
    failures: Mutex<HashMap<u64, u32>>,
    /// Chunk starts that get a truncated body once.
    short_once: Mutex<Vec<u64>>,
    calls: AtomicU64,
    served: Mutex<Vec<ByteRange>>,
}

impl MemoryFetcher {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            ..Self::default()
        }
    }

    /// Slows down every fetch made by worker `id`.
    pub fn slow_worker(mut self, id: usize, delay: Duration) -> Self {
        self.slow_thread = Some(format!("dsb-worker-{}", id));
        self.slow_delay = delay;
        self
    }

    /// The chunk starting at `start` fails `times` times with a connection error.
    pub fn fail_at(self, start: u64, times: u32) -> Self {
        self.failures.lock().unwrap().insert(start, times);
        self
    }

    pub fn short_once_at(self, start: u64) -> Self {
        self.short_once.lock().unwrap().push(start);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Ranges answered successfully, in completion order.
    pub fn served(&self) -> Vec<ByteRange> {
        self.served.lock().unwrap().clone()
    }
}

impl RangeFetcher for MemoryFetcher {
    fn fetch(&self, range: ByteRange) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(slow) = &self.slow_thread {
            if thread::current().name() == Some(slow.as_str()) {
                thread::sleep(self.slow_delay);
            }
        }
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(left) = failures.get_mut(&range.start) {
                if *left > 0 {
                    if *left != u32::MAX {
                        *left -= 1;
                    }
                    return Err(FetchError::Connection(format!("injected failure at {}", range.start)));
                }
            }
        }
        let mut body = self.data[range.start as usize..=range.end as usize].to_vec();
        {
            let mut short = self.short_once.lock().unwrap();
            if let Some(pos) = short.iter().position(|s| *s == range.start) {
                short.remove(pos);
                body.truncate(body.len() / 2);
                return Ok(body);
            }
        }
        self.served.lock().unwrap().push(range);
        Ok(body)
    }
}
