//! URL front end: probe, working directory, curl-backed download.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{download, DownloadOptions, DownloadSummary};
use crate::config::DsbConfig;
use crate::fetcher::CurlFetcher;
use crate::probe;
use crate::progress::ProgressStats;

/// `<base>/<name>`: holds the part files, then the final artifact.
pub fn working_dir(base: &Path, name: &str) -> PathBuf {
    base.join(name)
}

/// Probes `url` and downloads it to `<base_dir>/<name>/<name>`.
///
/// Fails if the working directory already exists, so an earlier download of
/// the same name is never overwritten or mixed with new parts.
pub fn download_url(
    url: &str,
    cfg: &DsbConfig,
    base_dir: &Path,
    progress_tx: Option<tokio::sync::mpsc::Sender<ProgressStats>>,
) -> Result<DownloadSummary> {
    cfg.validate()?;
    let curl_opts = cfg.curl_options();
    let info = probe::probe(url, curl_opts.user_agent.as_deref())
        .with_context(|| format!("probing {}", url))?;
    if !info.accept_ranges {
        tracing::warn!(url, "server does not advertise Accept-Ranges: bytes; trying ranges anyway");
    }

    let dir = working_dir(base_dir, &info.name);
    fs::create_dir(&dir)
        .with_context(|| format!("creating working directory {}", dir.display()))?;
    let output = dir.join(&info.name);
    tracing::info!(url, name = %info.name, size = info.size, dir = %dir.display(), "downloading");

    let fetcher = CurlFetcher::new(info.final_url.clone(), curl_opts);
    let summary = download(
        fetcher,
        info.size,
        &dir,
        &output,
        &DownloadOptions::from_config(cfg),
        progress_tx,
    )
    .with_context(|| format!("downloading {}", url))?;
    Ok(summary)
}
