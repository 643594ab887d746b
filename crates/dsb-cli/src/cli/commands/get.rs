//! `dsb get` – download one URL with live progress.

use anyhow::{Context, Result};
use dsb_core::config::DsbConfig;
use dsb_core::{download_url, ProgressStats};
use std::path::PathBuf;
use std::time::Instant;

const PROGRESS_INTERVAL_MS: u128 = 500;
const MIB: f64 = 1_048_576.0;

fn progress_line(stats: &ProgressStats) -> String {
    let eta = stats
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    format!(
        "  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  workers {}  steals {}  ETA {}",
        stats.bytes_done as f64 / MIB,
        stats.total_bytes as f64 / MIB,
        stats.fraction() * 100.0,
        stats.bytes_per_sec() / MIB,
        stats.active_workers,
        stats.steals,
        eta
    )
}

pub async fn run_get(url: &str, cfg: DsbConfig, base_dir: PathBuf) -> Result<()> {
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
    let progress_handle = tokio::spawn(async move {
        let mut last_print: Option<Instant> = None;
        while let Some(stats) = progress_rx.recv().await {
            let due = last_print.map_or(true, |t| t.elapsed().as_millis() >= PROGRESS_INTERVAL_MS);
            if due || stats.is_complete() {
                println!("{}", progress_line(&stats));
                last_print = Some(Instant::now());
            }
        }
    });

    let url_owned = url.to_string();
    let result = tokio::task::spawn_blocking(move || {
        download_url(&url_owned, &cfg, &base_dir, Some(progress_tx))
    })
    .await
    .context("download task panicked")?;
    let _ = progress_handle.await;

    let summary = result?;
    println!("saved: {}", summary.output.display());
    println!(
        "took: {:.2}s  ({} bytes, {} workers, {} steals, {} retries)",
        summary.elapsed.as_secs_f64(),
        summary.total_bytes,
        summary.workers,
        summary.steals,
        summary.retries
    );
    tracing::info!(url, output = %summary.output.display(), "get finished");
    Ok(())
}
