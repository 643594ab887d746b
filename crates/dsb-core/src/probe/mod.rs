//! HTTP HEAD probing: size, name and range support of a remote resource.
//!
//! Runs in the current thread; call from `spawn_blocking` if used from async
//! code.

mod parse;

use anyhow::{Context, Result};
use std::str;
use std::time::Duration;

use crate::naming;

/// What the download needs to know before partitioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Total size in bytes (`Content-Length` of the final response).
    pub size: u64,
    /// Local name: working directory and final file name.
    pub name: String,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    /// URL after redirects; range requests go here.
    pub final_url: String,
}

/// Performs a HEAD request against `url`, following redirects.
pub fn probe(url: &str, user_agent: Option<&str>) -> Result<ResourceInfo> {
    let mut lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(30))?;
    if let Some(ua) = user_agent {
        easy.useragent(ua)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("HEAD {} returned HTTP {}", url, code);
    }
    let final_url = easy
        .effective_url()
        .ok()
        .flatten()
        .unwrap_or(url)
        .to_string();

    let head = parse::parse_headers(&lines);
    let size = head
        .content_length
        .with_context(|| format!("HEAD {} returned no Content-Length", url))?;
    let name = naming::resource_name(&final_url, head.content_disposition.as_deref());
    tracing::debug!(url, %final_url, size, %name, accept_ranges = head.accept_ranges, "probed");

    Ok(ResourceInfo {
        size,
        name,
        accept_ranges: head.accept_ranges,
        final_url,
    })
}
