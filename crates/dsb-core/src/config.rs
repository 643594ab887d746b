use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::CurlOptions;
use crate::retry::RetryPolicy;

/// Browser-like UA; some mirrors throttle or refuse unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per chunk (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            max_attempts: p.max_attempts,
            base_delay_secs: p.base_delay.as_secs_f64(),
            max_delay_secs: p.max_delay.as_secs(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(c: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: c.max_attempts.max(1),
            // Out-of-range values are rejected by `DsbConfig::validate`;
            // unvalidated ones fall back to the cap.
            base_delay: Duration::try_from_secs_f64(c.base_delay_secs.max(0.0))
                .unwrap_or(Duration::from_secs(c.max_delay_secs)),
            max_delay: Duration::from_secs(c.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/dsb/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DsbConfig {
    /// Upper bound on parallel workers.
    pub max_workers: usize,
    /// Bytes requested per fetch call.
    pub chunk_size: u64,
    /// Minimum bytes per initial worker before using fewer than `max_workers`.
    pub min_block_size: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// User-Agent sent with every request; None = built-in browser UA.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Connect timeout per request in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Stall detection: abort a request slower than this many bytes/s...
    #[serde(default = "default_low_speed_limit")]
    pub low_speed_limit: u32,
    /// ...for this many seconds.
    #[serde(default = "default_low_speed_time_secs")]
    pub low_speed_time_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_low_speed_limit() -> u32 {
    1024
}

fn default_low_speed_time_secs() -> u64 {
    60
}

impl Default for DsbConfig {
    fn default() -> Self {
        Self {
            max_workers: 16,
            chunk_size: 1024 * 1024,
            min_block_size: 100 * 1024,
            retry: None,
            user_agent: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            low_speed_limit: default_low_speed_limit(),
            low_speed_time_secs: default_low_speed_time_secs(),
        }
    }
}

impl DsbConfig {
    /// Rejects values the scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        if self.chunk_size == 0 {
            bail!("chunk_size must be at least 1 byte");
        }
        if self.min_block_size == 0 {
            bail!("min_block_size must be at least 1 byte");
        }
        if let Some(retry) = &self.retry {
            if retry.max_attempts == 0 {
                bail!("retry.max_attempts must be at least 1");
            }
            if let Err(e) = Duration::try_from_secs_f64(retry.base_delay_secs) {
                bail!(
                    "retry.base_delay_secs = {} is not a valid delay: {}",
                    retry.base_delay_secs,
                    e
                );
            }
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            low_speed_limit: self.low_speed_limit,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            user_agent: Some(
                self.user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            ),
            ..CurlOptions::default()
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dsb")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DsbConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DsbConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DsbConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
