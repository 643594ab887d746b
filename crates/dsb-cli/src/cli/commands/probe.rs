//! `dsb probe` – show what `dsb get` would download.

use anyhow::{Context, Result};
use dsb_core::config::DsbConfig;
use dsb_core::probe;

pub async fn run_probe(url: &str, cfg: &DsbConfig) -> Result<()> {
    let url_owned = url.to_string();
    let user_agent = cfg.curl_options().user_agent;
    let info = tokio::task::spawn_blocking(move || probe::probe(&url_owned, user_agent.as_deref()))
        .await
        .context("probe task panicked")??;

    println!("name:          {}", info.name);
    println!("size:          {} bytes", info.size);
    println!("accept-ranges: {}", if info.accept_ranges { "bytes" } else { "none" });
    if info.final_url != url {
        println!("redirected to: {}", info.final_url);
    }
    Ok(())
}
