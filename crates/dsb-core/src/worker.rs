//! Worker: fetches its block chunk by chunk, then steals until nothing is left.
//!
//! ```text
//! Fetching -> Persisting -> Checking -> Fetching | Stealing
//! Stealing -> Fetching (new run) | Terminated
//! ```
//!
//! A failed fetch is retried at the same offset, so bytes already written
//! are never requested again. A worker keeps its id across steals; a steal
//! reassigns the running loop instead of spawning a new one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DownloadError;
use crate::fetcher::{check_body, RangeFetcher};
use crate::part_store::{PartStore, PartWriter};
use crate::progress::ProgressReporter;
use crate::range::ByteRange;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::table::{BlockTable, WorkerId};

/// State shared by every worker of one download.
pub(crate) struct Shared<F> {
    pub(crate) table: BlockTable,
    pub(crate) fetcher: F,
    pub(crate) store: PartStore,
    pub(crate) policy: RetryPolicy,
    /// Raised by the first worker that fails fatally.
    pub(crate) abort: AtomicBool,
    pub(crate) progress: ProgressReporter,
}

/// What one worker did before terminating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: WorkerId,
    pub bytes: u64,
    /// Part files this worker started.
    pub runs: u32,
    pub steals: u32,
    /// Failed fetch attempts that were retried.
    pub retries: u32,
    /// True when the worker stopped because another worker failed.
    pub aborted: bool,
}

#[derive(Debug)]
enum State {
    Fetching,
    Persisting(Vec<u8>),
    Checking(u64),
    Stealing,
    Terminated,
}

pub(crate) struct Worker<F> {
    id: WorkerId,
    shared: Arc<Shared<F>>,
}

impl<F: RangeFetcher> Worker<F> {
    pub(crate) fn new(id: WorkerId, shared: Arc<Shared<F>>) -> Self {
        Self { id, shared }
    }

    /// Runs the worker to termination. Any error raises the shared abort
    /// flag so the other workers stop too.
    pub(crate) fn run(self) -> Result<WorkerReport, DownloadError> {
        let span = tracing::debug_span!("worker", id = self.id);
        let _enter = span.enter();
        let result = self.run_states();
        if let Err(e) = &result {
            self.shared.abort.store(true, Ordering::Relaxed);
            tracing::error!("worker failed: {}", e);
        }
        result
    }

    fn storage_error(&self, range: ByteRange, source: std::io::Error) -> DownloadError {
        DownloadError::Storage {
            worker: self.id,
            range,
            source,
        }
    }

    fn open_run(&self, run_start: u64, end: u64) -> Result<PartWriter, DownloadError> {
        self.shared
            .store
            .start_run(run_start)
            .map_err(|e| self.storage_error(ByteRange::new(run_start, end), e))
    }

    fn run_states(&self) -> Result<WorkerReport, DownloadError> {
        let sh = &*self.shared;
        let chunk_size = sh.table.chunk_size();
        let mut report = WorkerReport {
            id: self.id,
            runs: 1,
            ..WorkerReport::default()
        };

        let assigned = sh.table.assignment(self.id)?;
        let mut cursor = assigned.start;
        let mut end = assigned.end;
        let mut part = self.open_run(cursor, end)?;
        tracing::debug!(block = %assigned, "worker started");

        let mut state = State::Fetching;
        loop {
            state = match state {
                State::Fetching => {
                    if sh.abort.load(Ordering::Relaxed) {
                        report.aborted = true;
                        State::Terminated
                    } else {
                        let chunk = ByteRange::new(cursor, end).chunk_at(cursor, chunk_size);
                        let fetched = run_with_retry(&sh.policy, &chunk, || {
                            sh.fetcher.fetch(chunk).and_then(|body| check_body(chunk, body))
                        });
                        match fetched {
                            Ok((body, failed)) => {
                                report.retries += failed;
                                State::Persisting(body)
                            }
                            Err(exhausted) => {
                                return Err(DownloadError::Transport {
                                    worker: self.id,
                                    range: chunk,
                                    attempts: exhausted.attempts,
                                    source: exhausted.error,
                                })
                            }
                        }
                    }
                }
                State::Persisting(body) => {
                    let n = body.len() as u64;
                    part.append(&body)
                        .map_err(|e| self.storage_error(ByteRange::new(cursor, cursor + n - 1), e))?;
                    State::Checking(n)
                }
                State::Checking(n) => {
                    end = sh.table.advance(self.id, n)?;
                    cursor += n;
                    report.bytes += n;
                    sh.progress.report(&sh.table);
                    if cursor > end {
                        State::Stealing
                    } else {
                        State::Fetching
                    }
                }
                State::Stealing => match sh.table.try_steal_for(self.id)? {
                    Some(stolen) => {
                        if stolen.start != part.next_offset() {
                            part = self.open_run(stolen.start, stolen.end)?;
                            report.runs += 1;
                        }
                        cursor = stolen.start;
                        end = stolen.end;
                        report.steals += 1;
                        State::Fetching
                    }
                    None => State::Terminated,
                },
                State::Terminated => {
                    tracing::debug!(
                        bytes = report.bytes,
                        runs = report.runs,
                        steals = report.steals,
                        retries = report.retries,
                        aborted = report.aborted,
                        "worker terminated"
                    );
                    return Ok(report);
                }
            };
        }
    }
}
