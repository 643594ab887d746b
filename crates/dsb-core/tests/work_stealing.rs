//! End-to-end downloads through the in-memory fetcher: stealing, retries,
//! permanent failure and progress reporting.

mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use common::memory_fetcher::MemoryFetcher;
use dsb_core::retry::RetryPolicy;
use dsb_core::{download, ByteRange, DownloadError, DownloadOptions, FetchError};
use tempfile::tempdir;

fn options(max_workers: usize, chunk_size: u64, min_block_size: u64) -> DownloadOptions {
    DownloadOptions {
        max_workers,
        chunk_size,
        min_block_size,
        retry: RetryPolicy::immediate(5),
    }
}

/// Successful fetches must tile `[0, size-1]`: nothing requested twice,
/// nothing skipped.
fn assert_tiles(mut served: Vec<ByteRange>, size: u64) {
    served.sort();
    let mut next = 0;
    for r in &served {
        assert_eq!(r.start, next, "gap or overlap at {}", r);
        next = r.end + 1;
    }
    assert_eq!(next, size);
}

#[test]
fn slow_worker_gets_robbed_and_file_matches() {
    let size = 10 * 1024 * 1024;
    let data = common::pattern(size);
    let fetcher = Arc::new(
        MemoryFetcher::new(data.clone()).slow_worker(0, Duration::from_millis(20)),
    );
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let output = work.join("out.bin");

    let summary = download(
        Arc::clone(&fetcher),
        size as u64,
        &work,
        &output,
        &options(4, 64 * 1024, 100 * 1024),
        None,
    )
    .unwrap();

    assert_eq!(summary.workers, 4);
    assert!(summary.steals >= 1, "slow worker should have been robbed");
    assert_eq!(summary.total_bytes, size as u64);
    assert_eq!(fs::read(&output).unwrap(), data);
    assert_tiles(fetcher.served(), size as u64);
    // Only the artifact is left behind.
    let left: Vec<_> = fs::read_dir(&work).unwrap().flatten().collect();
    assert_eq!(left.len(), 1);
}

#[test]
fn five_million_bytes_with_one_megabyte_chunks() {
    let size = 5_000_000;
    let data = common::pattern(size);
    let fetcher = Arc::new(
        MemoryFetcher::new(data.clone()).slow_worker(0, Duration::from_millis(150)),
    );
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let output = work.join("out.bin");

    let summary = download(
        Arc::clone(&fetcher),
        size as u64,
        &work,
        &output,
        &options(4, 1_000_000, 100_000),
        None,
    )
    .unwrap();

    // Blocks of 1,250,000 bytes never hold more than two 1 MB chunks, so
    // they are never split however slow worker 0 is.
    assert_eq!(summary.workers, 4);
    assert_eq!(summary.steals, 0);
    assert_eq!(fs::metadata(&output).unwrap().len(), 5_000_000);
    assert_eq!(fs::read(&output).unwrap(), data);
    assert_tiles(fetcher.served(), size as u64);
}

#[test]
fn five_million_bytes_slow_first_block_is_split() {
    let size = 5_000_000;
    let data = common::pattern(size);
    let fetcher = Arc::new(
        MemoryFetcher::new(data.clone()).slow_worker(0, Duration::from_millis(150)),
    );
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let output = work.join("out.bin");

    let summary = download(
        Arc::clone(&fetcher),
        size as u64,
        &work,
        &output,
        &options(4, 500_000, 100_000),
        None,
    )
    .unwrap();

    assert_eq!(summary.workers, 4);
    assert!(summary.steals >= 1, "worker 0's block should have been split");
    // The first thief takes the back half of [0, 1249999].
    assert!(fetcher.served().iter().any(|r| r.start == 625_000));
    assert_eq!(fs::metadata(&output).unwrap().len(), 5_000_000);
    assert_eq!(fs::read(&output).unwrap(), data);
    assert_tiles(fetcher.served(), size as u64);
}

#[test]
fn transient_failures_are_retried_without_duplicating_bytes() {
    let size = 256 * 1024;
    let data = common::pattern(size);
    let fetcher = Arc::new(
        MemoryFetcher::new(data.clone())
            .fail_at(16 * 1024, 3)
            .short_once_at(0),
    );
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let output = work.join("out.bin");

    let summary = download(
        Arc::clone(&fetcher),
        size as u64,
        &work,
        &output,
        &options(1, 16 * 1024, 100 * 1024),
        None,
    )
    .unwrap();

    assert_eq!(summary.retries, 4);
    assert_eq!(fs::read(&output).unwrap(), data);
    assert_tiles(fetcher.served(), size as u64);
}

// Retries are bounded: a chunk that never succeeds fails the download
// instead of spinning forever.
#[test]
fn permanent_failure_aborts_after_bounded_attempts() {
    let size = 400 * 1024;
    let fetcher = Arc::new(MemoryFetcher::new(common::pattern(size)).fail_at(102_400, u32::MAX));
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let output = work.join("out.bin");

    let mut opts = options(4, 16 * 1024, 100 * 1024);
    opts.retry = RetryPolicy::immediate(3);
    let err = download(Arc::clone(&fetcher), size as u64, &work, &output, &opts, None).unwrap_err();

    match err {
        DownloadError::Transport {
            worker,
            range,
            attempts,
            source,
        } => {
            assert_eq!(worker, 1);
            assert_eq!(range, ByteRange::new(102_400, 102_400 + 16 * 1024 - 1));
            assert_eq!(attempts, 3);
            assert!(matches!(source, FetchError::Connection(_)));
        }
        other => panic!("expected Transport, got {:?}", other),
    }
    assert!(!output.exists());
    // Parts stay on disk for inspection.
    assert!(fs::read_dir(&work).unwrap().flatten().count() > 0);
}

#[test]
fn empty_resource_produces_empty_file() {
    let fetcher = Arc::new(MemoryFetcher::new(Vec::new()));
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let output = work.join("empty.bin");

    let summary = download(
        Arc::clone(&fetcher),
        0,
        &work,
        &output,
        &options(4, 1024, 1024),
        None,
    )
    .unwrap();

    assert_eq!(summary.workers, 0);
    assert_eq!(summary.total_bytes, 0);
    assert_eq!(fs::metadata(&output).unwrap().len(), 0);
    assert_eq!(fetcher.calls(), 0);
}

#[test]
fn existing_part_file_is_not_clobbered() {
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    fs::create_dir(&work).unwrap();
    fs::write(work.join("0.part"), b"stale").unwrap();

    let fetcher = MemoryFetcher::new(common::pattern(4096));
    let err = download(
        fetcher,
        4096,
        &work,
        &work.join("out.bin"),
        &options(1, 1024, 1024),
        None,
    )
    .unwrap_err();

    assert!(matches!(err, DownloadError::Storage { worker: 0, .. }));
    assert_eq!(fs::read(work.join("0.part")).unwrap(), b"stale");
}

#[test]
fn invalid_options_are_rejected_before_any_work() {
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let bad = [
        options(0, 1024, 1024),
        options(4, 0, 1024),
        options(4, 1024, 0),
        DownloadOptions {
            retry: RetryPolicy::immediate(0),
            ..options(4, 1024, 1024)
        },
    ];
    for opts in &bad {
        let fetcher = Arc::new(MemoryFetcher::new(common::pattern(100)));
        let err = download(Arc::clone(&fetcher), 100, &work, &work.join("out.bin"), opts, None)
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidOptions(_)), "{:?}", err);
        assert!(!err.is_scheduler_bug());
        assert_eq!(fetcher.calls(), 0);
        assert!(!work.exists());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn progress_is_reported_until_complete() {
    let size = 1024 * 1024;
    let data = common::pattern(size);
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let output = work.join("out.bin");
    let (tx, mut rx) = tokio::sync::mpsc::channel(4096);

    let handle = tokio::task::spawn_blocking(move || {
        download(
            MemoryFetcher::new(data),
            size as u64,
            &work,
            &output,
            &options(4, 16 * 1024, 64 * 1024),
            Some(tx),
        )
    });

    let mut seen = Vec::new();
    while let Some(stats) = rx.recv().await {
        seen.push(stats);
    }
    let summary = handle.await.unwrap().unwrap();

    assert_eq!(summary.total_bytes, size as u64);
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|s| s.bytes_done <= s.total_bytes));
    let last = seen.last().unwrap();
    assert!(last.is_complete());
    assert_eq!(last.total_bytes, size as u64);
    assert_eq!(last.active_workers, 0);
}
