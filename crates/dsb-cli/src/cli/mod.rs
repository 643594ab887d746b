//! CLI for the DSB work-stealing range downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dsb_core::config::{self, DsbConfig};
use std::path::PathBuf;

use commands::{run_get, run_probe};

/// Top-level CLI for the DSB downloader.
#[derive(Debug, Parser)]
#[command(name = "dsb")]
#[command(about = "DSB: parallel HTTP range downloader with work stealing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL into `<DIR>/<name>/<name>`.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,
        /// Base directory (default: current directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Maximum parallel workers (overrides config).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Bytes per range request (overrides config).
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<u64>,
        /// Minimum initial block per worker (overrides config).
        #[arg(long, value_name = "BYTES")]
        min_block_size: Option<u64>,
    },

    /// Show the name, size and range support of a URL without downloading.
    Probe {
        /// Direct HTTP/HTTPS URL to probe.
        url: String,
    },
}

/// Command-line values that replace config file settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub chunk_size: Option<u64>,
    pub min_block_size: Option<u64>,
}

impl Overrides {
    pub fn apply(self, mut cfg: DsbConfig) -> Result<DsbConfig> {
        if let Some(n) = self.workers {
            cfg.max_workers = n;
        }
        if let Some(n) = self.chunk_size {
            cfg.chunk_size = n;
        }
        if let Some(n) = self.min_block_size {
            cfg.min_block_size = n;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                url,
                dir,
                workers,
                chunk_size,
                min_block_size,
            } => {
                let cfg = Overrides {
                    workers,
                    chunk_size,
                    min_block_size,
                }
                .apply(cfg)?;
                let base_dir = match dir {
                    Some(d) => d,
                    None => std::env::current_dir()?,
                };
                run_get(&url, cfg, base_dir).await?;
            }
            CliCommand::Probe { url } => run_probe(&url, &cfg).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
