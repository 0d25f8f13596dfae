//! Crawler module for archive fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and backoff
//! - Listing and article parsing
//! - Listing pagination
//! - Workers that fill one sink per range
//! - Scheduling workers and merging their output

mod fetcher;
mod paginator;
mod parser;
mod scheduler;
mod worker;

pub use fetcher::{build_http_client, Fetcher, RetryPolicy};
pub use paginator::{page_url, ListingWalk, Paginator};
pub use parser::{ItemRef, ListingPage, PageParser, SelectorParser};
pub use scheduler::{merge, validate_range, FailedRange, MergedOutput, Scheduler};
pub use worker::{Worker, WorkerReport};

use crate::calendar::CalendarDate;
use crate::config::Config;
use crate::CrawlError;
use tokio_util::sync::CancellationToken;

/// What a crawl run walks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlTarget {
    /// Every archive day from `start` to `end`, both included
    Range {
        start: CalendarDate,
        end: CalendarDate,
    },

    /// An explicit list of listing URLs
    Links(Vec<String>),
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client, parser and sink factory from `config`
/// 2. Validate the target
/// 3. Partition the work and run one worker per range
/// 4. Merge the worker sinks in range order
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `target` - Date range or link list to crawl
/// * `cancel` - Stops all workers when triggered
///
/// # Returns
///
/// * `Ok(MergedOutput)` - The merged records; failed ranges are listed in it
/// * `Err(CrawlError)` - The run could not start
pub async fn crawl(
    config: &Config,
    target: CrawlTarget,
    cancel: CancellationToken,
) -> Result<MergedOutput, CrawlError> {
    let scheduler = Scheduler::from_config(config, cancel)?;
    match target {
        CrawlTarget::Range { start, end } => scheduler.run(start, end).await,
        CrawlTarget::Links(links) => scheduler.run_links(links).await,
    }
}
