//! Shared helpers for dsb-core integration tests.

#![allow(dead_code)]

pub mod memory_fetcher;
pub mod range_server;

/// Deterministic, non-periodic-looking test payload.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len as u64)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
        .collect()
}
