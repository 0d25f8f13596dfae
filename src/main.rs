//! Archive crawler main entry point
//!
//! This is the command-line interface for the concurrent news archive crawler.

use archive_crawler::calendar::CalendarDate;
use archive_crawler::config::{load_config_with_hash, Config};
use archive_crawler::crawler::{crawl, CrawlTarget};
use archive_crawler::output::{print_summary, write_tsv_file, RunSummary};
use archive_crawler::CrawlError;
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Archive Crawler: a concurrent news archive scraper
///
/// Walks the day-by-day archive of a news site from START to FINISH (both
/// included, YYYY-MM-DD), fetches every article and writes one
/// tab-separated record per article, in chronological order.
#[derive(Parser, Debug)]
#[command(name = "archive-crawler")]
#[command(version)]
#[command(about = "A concurrent news archive crawler", long_about = None)]
struct Cli {
    /// First archive day (YYYY-MM-DD)
    #[arg(value_name = "START", required_unless_present = "links_file")]
    start: Option<String>,

    /// Last archive day (YYYY-MM-DD)
    #[arg(value_name = "FINISH", required_unless_present = "links_file")]
    finish: Option<String>,

    /// Crawl the listing URLs in FILE (one per line) instead of a date range
    #[arg(long, value_name = "FILE", conflicts_with_all = ["start", "finish"])]
    links_file: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output file (overrides `result-path` from the configuration)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("archive_crawler=info,warn"),
            1 => EnvFilter::new("archive_crawler=debug,info"),
            2 => EnvFilter::new("archive_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the crawl described by the command line
///
/// Returns the process exit code once the merged output is written. Errors
/// are returned only when nothing was written.
async fn run(cli: Cli) -> Result<ExitCode, CrawlError> {
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(output) = cli.output {
        config.output.result_path = output;
    }

    let target = match &cli.links_file {
        Some(path) => CrawlTarget::Links(read_links(path)?),
        None => CrawlTarget::Range {
            start: CalendarDate::parse(cli.start.as_deref().unwrap_or_default())?,
            end: CalendarDate::parse(cli.finish.as_deref().unwrap_or_default())?,
        },
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling workers");
            interrupt.cancel();
        }
    });

    let started_at = Utc::now();
    let output = crawl(&config, target, cancel).await?;

    let path = config.output.result_path.clone();
    write_tsv_file(&path, &output.records)?;

    if !cli.quiet {
        let summary = RunSummary::from_output(&output, started_at, config_hash, path);
        print_summary(&summary);
    }

    match output.aggregate_error() {
        Some(e) => {
            tracing::error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
        None => {
            tracing::info!("Crawl completed successfully");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Reads listing URLs from a file, one per line, skipping blank lines
fn read_links(path: &Path) -> Result<Vec<String>, CrawlError> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
