//! Scheduler and merger
//!
//! This module handles:
//! - Validating the requested date range
//! - Partitioning work into ranges and creating one sink per range
//! - Running one worker per range, at most `max_concurrent` at a time
//! - Merging the sinks of finished workers in partition order
//! - Reporting failed ranges without discarding the successful ones

use crate::calendar::CalendarDate;
use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::paginator::Paginator;
use crate::crawler::parser::SelectorParser;
use crate::crawler::worker::{Worker, WorkerReport};
use crate::output::Record;
use crate::partition::{self, WorkAssignment};
use crate::sink::{self, SinkFactory};
use crate::{CrawlError, ValidationError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A range whose records are missing from the merged output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRange {
    /// Partition index of the range
    pub index: usize,

    /// Human readable label of the range
    pub label: String,

    /// Why the range failed
    pub reason: String,
}

impl FailedRange {
    /// Formats a list of failed ranges on one line
    pub fn list(failed: &[FailedRange]) -> String {
        failed
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FailedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({}): {}", self.index, self.label, self.reason)
    }
}

/// The merged result of a crawl run
#[derive(Debug, Default)]
pub struct MergedOutput {
    /// Records of every successful range, in partition order
    pub records: Vec<Record>,

    /// Ranges that failed, in partition order
    pub failed: Vec<FailedRange>,

    /// Number of ranges the work was split into
    pub ranges_total: usize,

    /// Articles skipped across all ranges
    pub items_skipped: usize,
}

impl MergedOutput {
    /// Returns true if every range succeeded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the aggregate error describing failed ranges, if any
    pub fn aggregate_error(&self) -> Option<CrawlError> {
        if self.failed.is_empty() {
            return None;
        }
        Some(CrawlError::Aggregate {
            failed: self.failed.clone(),
            total: self.ranges_total,
        })
    }
}

/// Checks that both ends of a date range are archive days
///
/// Ordering is checked later, when the range is partitioned.
pub fn validate_range(start: CalendarDate, end: CalendarDate) -> Result<(), CrawlError> {
    for date in [start, end] {
        if !date.is_valid() {
            return Err(ValidationError::InvalidDate(date).into());
        }
    }
    Ok(())
}

/// Runs workers over partitioned ranges and merges their output
pub struct Scheduler {
    paginator: Paginator,
    sinks: Arc<dyn SinkFactory>,
    listing_template: Arc<str>,
    max_concurrent: usize,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `paginator` - Shared listing walker
    /// * `sinks` - Creates one sink per range
    /// * `listing_template` - Listing URL with a `{date}` placeholder
    /// * `max_concurrent` - Upper bound on workers running at once
    /// * `cancel` - Stops every worker when triggered
    pub fn new(
        paginator: Paginator,
        sinks: Arc<dyn SinkFactory>,
        listing_template: impl Into<Arc<str>>,
        max_concurrent: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            paginator,
            sinks,
            listing_template: listing_template.into(),
            max_concurrent: max_concurrent.max(1),
            cancel,
        }
    }

    /// Builds a scheduler with the fetcher, parser and sinks described by `config`
    pub fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::from_config(&config.fetch, &config.user_agent, cancel.clone())?;
        let parser = SelectorParser::from_config(&config.site)?;
        let paginator = Paginator::new(
            Arc::new(fetcher),
            Arc::new(parser),
            config.site.page_scheme,
            config.crawler.max_pages_per_listing,
        );
        let sinks = sink::factory_for(&config.output)?;

        Ok(Self::new(
            paginator,
            sinks,
            config.site.listing_template.as_str(),
            config.crawler.max_concurrent_workers as usize,
            cancel,
        ))
    }

    /// Returns a handle that cancels every worker of this scheduler
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Crawls every archive day from `start` to `end`, both included
    ///
    /// # Errors
    ///
    /// Returns a validation error before any work starts if a date is not an
    /// archive day, `start` is not before `end`, or the listing template has
    /// no `{date}` placeholder. Failed ranges do not produce an error here;
    /// they are reported in [`MergedOutput::failed`].
    pub async fn run(&self, start: CalendarDate, end: CalendarDate) -> Result<MergedOutput, CrawlError> {
        validate_range(start, end)?;
        if !self.listing_template.contains("{date}") {
            return Err(crate::ConfigError::Validation(format!(
                "listing template '{}' has no {{date}} placeholder",
                self.listing_template
            ))
            .into());
        }

        let ranges = partition::partition_days(start, end)?;
        tracing::info!(
            "Crawling {} to {} with {} workers",
            start,
            end,
            ranges.len()
        );

        let assignments = ranges.into_iter().map(WorkAssignment::Days).collect();
        Ok(self.run_assignments(assignments).await)
    }

    /// Crawls an explicit list of listing URLs
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyLinkList` for an empty list.
    pub async fn run_links(&self, links: Vec<String>) -> Result<MergedOutput, CrawlError> {
        if links.is_empty() {
            return Err(ValidationError::EmptyLinkList.into());
        }

        let ranges = partition::partition_links(links)?;
        tracing::info!("Crawling link list with {} workers", ranges.len());

        let assignments = ranges.into_iter().map(WorkAssignment::Links).collect();
        Ok(self.run_assignments(assignments).await)
    }

    /// Runs one worker per assignment and merges the results
    ///
    /// A worker whose sink cannot be created fails without running. A worker
    /// task that panics is reported as a failed range.
    pub async fn run_assignments(&self, assignments: Vec<WorkAssignment>) -> MergedOutput {
        let total = assignments.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let mut reports = Vec::with_capacity(total);
        let mut labels = BTreeMap::new();

        for assignment in assignments {
            labels.insert(assignment.index(), assignment.label());

            let sink = match self.sinks.create(&assignment) {
                Ok(sink) => sink,
                Err(e) => {
                    tracing::error!("Cannot create sink for {}: {}", assignment.label(), e);
                    reports.push(WorkerReport::not_started(&assignment, e.to_string()));
                    continue;
                }
            };

            let worker = Worker::new(
                assignment,
                sink,
                self.paginator.clone(),
                Arc::clone(&self.listing_template),
            );
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                worker.run().await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("Worker task aborted: {}", e),
            }
        }

        // Ranges with no report belong to a task that panicked
        for report in &reports {
            labels.remove(&report.index);
        }
        for (index, label) in labels {
            reports.push(WorkerReport {
                index,
                label,
                state: crate::WorkerState::Failed,
                records: 0,
                items_skipped: 0,
                sink: None,
                error: Some("worker task aborted".to_string()),
            });
        }

        merge(reports, total)
    }
}

/// Merges worker reports into one output, in partition order
///
/// Sinks of successful workers are drained; sinks of failed workers are
/// discarded. A sink that cannot be drained turns its range into a failure.
pub fn merge(mut reports: Vec<WorkerReport>, total: usize) -> MergedOutput {
    reports.sort_by_key(|report| report.index);

    let mut output = MergedOutput {
        ranges_total: total,
        ..MergedOutput::default()
    };

    for report in reports {
        output.items_skipped += report.items_skipped;

        let failure = |reason: String| FailedRange {
            index: report.index,
            label: report.label.clone(),
            reason,
        };

        if !report.state.is_success() {
            if let Some(sink) = report.sink {
                if let Err(e) = sink.discard() {
                    tracing::warn!("Failed to discard sink of {}: {}", report.label, e);
                }
            }
            let reason = report.error.clone().unwrap_or_else(|| report.state.to_string());
            output.failed.push(failure(reason));
            continue;
        }

        let Some(sink) = report.sink else {
            output.failed.push(failure("sink missing".to_string()));
            continue;
        };

        match sink.drain() {
            Ok(records) => output.records.extend(records),
            Err(e) => {
                tracing::error!("Failed to drain sink of {}: {}", report.label, e);
                output.failed.push(failure(e.to_string()));
            }
        }
    }

    if output.failed.is_empty() {
        tracing::info!(
            "Merged {} records from {} ranges",
            output.records.len(),
            total
        );
    } else {
        tracing::warn!(
            "Merged {} records; {} of {} ranges failed",
            output.records.len(),
            output.failed.len(),
            total
        );
    }

    output
}
