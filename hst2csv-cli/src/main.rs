//! hst2csv CLI — convert an HST history archive into a CSV table.
//!
//! Usage: `hst2csv <SOURCE> <DEST> [--threads N] [--chunk-records N]
//! [--config FILE] [--utc] [--json-header] [-v]`
//!
//! Prints the archive header, converts every record in parallel while
//! keeping input order, then prints the processing time.

mod report;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser};
use hst2csv_core::{Pipeline, PipelineConfig, TimestampStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hst2csv",
    about = "Hst2Csv — convert an HST history file into CSV",
    version
)]
struct Cli {
    /// HST source file.
    source: PathBuf,

    /// CSV destination file (truncated if it exists).
    dest: PathBuf,

    /// Worker threads. Defaults to the available hardware parallelism.
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Records decoded per chunk.
    #[arg(long)]
    chunk_records: Option<usize>,

    /// TOML pipeline config; command-line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render timestamps in UTC instead of local time.
    #[arg(long, default_value_t = false)]
    utc: bool,

    /// Print the header as JSON instead of the framed summary.
    #[arg(long, default_value_t = false)]
    json_header: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if is_argument_count_error(&e) => {
            // Wrong number of paths: show usage and leave without converting.
            e.print()?;
            return Ok(());
        }
        Err(e) => e.exit(),
    };

    init_tracing(cli.verbose);

    let started = Instant::now();
    let config = build_config(&cli)?;
    let style = config.timestamps;
    let json_header = cli.json_header;
    let pipeline = Pipeline::new(config)?;

    let summary = pipeline
        .convert_file(&cli.source, &cli.dest, |header| {
            if json_header {
                match serde_json::to_string_pretty(&header) {
                    Ok(json) => println!("{json}"),
                    Err(e) => tracing::warn!(error = %e, "could not serialize header"),
                }
            } else {
                print!("{}", report::header_summary(&header, style));
            }
        })
        .with_context(|| {
            format!(
                "converting {} -> {}",
                cli.source.display(),
                cli.dest.display()
            )
        })?;

    tracing::info!(
        records = summary.records,
        chunks = summary.chunks,
        workers = summary.workers,
        "done"
    );
    println!("processingTime(ms): {}", started.elapsed().as_millis());
    Ok(())
}

/// Too few or too many paths. A mistyped option is not one of these.
fn is_argument_count_error(err: &clap::Error) -> bool {
    match err.kind() {
        ErrorKind::MissingRequiredArgument => true,
        // clap reports a surplus positional as an unknown argument.
        ErrorKind::UnknownArgument => matches!(
            err.get(ContextKind::InvalidArg),
            Some(ContextValue::String(arg)) if !arg.starts_with('-')
        ),
        _ => false,
    }
}

/// Config file first, then command-line overrides.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config = config.with_workers(threads);
    }
    if let Some(chunk_records) = cli.chunk_records {
        config = config.with_chunk_records(chunk_records);
    }
    if cli.utc {
        config = config.with_timestamps(TimestampStyle::Utc);
    }
    Ok(config)
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_positionals_parse() {
        let cli = Cli::try_parse_from(["hst2csv", "in.hst", "out.csv"]).unwrap();
        assert_eq!(cli.source, PathBuf::from("in.hst"));
        assert_eq!(cli.dest, PathBuf::from("out.csv"));
        assert!(cli.threads.is_none());
        assert!(!cli.utc);
    }

    #[test]
    fn missing_dest_is_an_argument_count_error() {
        let err = Cli::try_parse_from(["hst2csv", "in.hst"]).unwrap_err();
        assert!(is_argument_count_error(&err));
    }

    #[test]
    fn extra_positional_is_an_argument_count_error() {
        let err = Cli::try_parse_from(["hst2csv", "a", "b", "c"]).unwrap_err();
        assert!(is_argument_count_error(&err));
    }

    #[test]
    fn mistyped_option_is_not_an_argument_count_error() {
        let err = Cli::try_parse_from(["hst2csv", "in.hst", "out.csv", "--thread", "4"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert!(!is_argument_count_error(&err));

        let err = Cli::try_parse_from(["hst2csv", "in.hst", "out.csv", "-x"]).unwrap_err();
        assert!(!is_argument_count_error(&err));
    }

    #[test]
    fn zero_threads_is_rejected() {
        let err = Cli::try_parse_from(["hst2csv", "a", "b", "--threads", "0"]).unwrap_err();
        assert!(!is_argument_count_error(&err));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "workers = 2\nchunk_records = 64\n").unwrap();

        let path = path.to_str().unwrap();
        let cli = Cli::try_parse_from([
            "hst2csv", "a", "b", "--config", path, "--threads", "6", "--utc",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();

        assert_eq!(config.worker_count(), 6);
        assert_eq!(config.chunk_records, 64);
        assert_eq!(config.timestamps, TimestampStyle::Utc);
    }
}
