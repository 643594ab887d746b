//! CLI parse and override tests.

use super::{Cli, CliCommand, Overrides};
use clap::Parser;
use dsb_core::config::DsbConfig;
use std::path::Path;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_get_defaults() {
    match parse(&["dsb", "get", "https://example.com/file.iso"]) {
        CliCommand::Get {
            url,
            dir,
            workers,
            chunk_size,
            min_block_size,
        } => {
            assert_eq!(url, "https://example.com/file.iso");
            assert!(dir.is_none());
            assert!(workers.is_none());
            assert!(chunk_size.is_none());
            assert!(min_block_size.is_none());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_all_flags() {
    match parse(&[
        "dsb",
        "get",
        "https://example.com/x",
        "--dir",
        "/tmp",
        "--workers",
        "8",
        "--chunk-size",
        "65536",
        "--min-block-size",
        "4096",
    ]) {
        CliCommand::Get {
            url,
            dir,
            workers,
            chunk_size,
            min_block_size,
        } => {
            assert_eq!(url, "https://example.com/x");
            assert_eq!(dir.as_deref(), Some(Path::new("/tmp")));
            assert_eq!(workers, Some(8));
            assert_eq!(chunk_size, Some(65_536));
            assert_eq!(min_block_size, Some(4096));
        }
        _ => panic!("expected Get with flags"),
    }
}

#[test]
fn cli_parse_probe() {
    match parse(&["dsb", "probe", "https://example.com/a.bin"]) {
        CliCommand::Probe { url } => assert_eq!(url, "https://example.com/a.bin"),
        _ => panic!("expected Probe"),
    }
}

#[test]
fn cli_rejects_missing_url_and_bad_numbers() {
    assert!(Cli::try_parse_from(["dsb", "get"]).is_err());
    assert!(Cli::try_parse_from(["dsb", "get", "u", "--workers", "many"]).is_err());
    assert!(Cli::try_parse_from(["dsb"]).is_err());
}

#[test]
fn overrides_replace_config_values() {
    let cfg = Overrides {
        workers: Some(2),
        chunk_size: Some(4096),
        min_block_size: None,
    }
    .apply(DsbConfig::default())
    .unwrap();
    assert_eq!(cfg.max_workers, 2);
    assert_eq!(cfg.chunk_size, 4096);
    assert_eq!(cfg.min_block_size, DsbConfig::default().min_block_size);
}

#[test]
fn overrides_are_validated() {
    let zero_workers = Overrides {
        workers: Some(0),
        ..Overrides::default()
    };
    assert!(zero_workers.apply(DsbConfig::default()).is_err());
}
