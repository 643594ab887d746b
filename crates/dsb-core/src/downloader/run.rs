//! Launch one thread per worker and join them all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DownloadError;
use crate::fetcher::RangeFetcher;
use crate::part_store::PartStore;
use crate::progress::ProgressReporter;
use crate::retry::RetryPolicy;
use crate::table::BlockTable;
use crate::worker::{Shared, Worker, WorkerReport};

/// Shared state after every worker has returned, with their reports.
pub(super) struct Joined<F> {
    pub(super) shared: Arc<Shared<F>>,
    pub(super) reports: Vec<WorkerReport>,
}

/// Spawns `worker_count` named threads and waits for all of them. Returns
/// the first fatal worker error, if any, only after every thread is joined.
pub(super) fn spawn_and_join<F>(
    fetcher: F,
    table: BlockTable,
    store: PartStore,
    policy: RetryPolicy,
    progress: ProgressReporter,
    worker_count: usize,
) -> Result<Joined<F>, DownloadError>
where
    F: RangeFetcher + 'static,
{
    let shared = Arc::new(Shared {
        table,
        fetcher,
        store,
        policy,
        abort: AtomicBool::new(false),
        progress,
    });

    let mut handles = Vec::with_capacity(worker_count);
    let mut first_error: Option<DownloadError> = None;
    for id in 0..worker_count {
        let sh = Arc::clone(&shared);
        let spawned = std::thread::Builder::new()
            .name(format!("dsb-worker-{}", id))
            .spawn(move || Worker::new(id, sh).run());
        match spawned {
            Ok(h) => handles.push((id, h)),
            Err(e) => {
                // Workers already running stop at their next chunk.
                shared.abort.store(true, Ordering::Relaxed);
                first_error = Some(DownloadError::Spawn(e));
                break;
            }
        }
    }

    let mut reports = Vec::with_capacity(handles.len());
    for (id, h) in handles {
        match h.join() {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(_) => {
                shared.abort.store(true, Ordering::Relaxed);
                if first_error.is_none() {
                    first_error = Some(DownloadError::WorkerPanicked(id));
                }
            }
        }
    }

    if let Some(e) = first_error {
        tracing::error!("download failed: {}", e);
        return Err(e);
    }
    Ok(Joined { shared, reports })
}
