//! Adaptive work-stealing HTTP range downloader.
//!
//! A resource of known size is split into one block per worker. Workers
//! fetch their block chunk by chunk into part files; a worker that runs out
//! of work steals the back half of the largest remaining block. When every
//! worker has terminated the parts are concatenated into the final file.

pub mod assembler;
pub mod config;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod naming;
pub mod part_store;
pub mod probe;
pub mod progress;
pub mod range;
pub mod retry;
pub mod table;
pub mod worker;

pub use config::DsbConfig;
pub use downloader::{download, download_url, DownloadOptions, DownloadSummary};
pub use error::{AllocationError, AssemblyError, DownloadError};
pub use fetcher::{CurlFetcher, CurlOptions, FetchError, RangeFetcher};
pub use progress::ProgressStats;
pub use range::ByteRange;
