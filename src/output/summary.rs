//! Run summary reporting
//!
//! Collects the outcome of a crawl run and prints it to stdout once the
//! merged result file has been written.

use crate::crawler::{FailedRange, MergedOutput};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Summary of a finished crawl run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the merge finished
    pub finished_at: DateTime<Utc>,

    /// SHA-256 of the configuration file, if one was used
    pub config_hash: Option<String>,

    /// Number of ranges the work was split into
    pub ranges_total: usize,

    /// Ranges that failed and are missing from the output
    pub failed: Vec<FailedRange>,

    /// Records in the merged output
    pub records: usize,

    /// Items skipped because their page could not be fetched or parsed
    pub items_skipped: usize,

    /// Where the merged output was written
    pub output_path: PathBuf,
}

impl RunSummary {
    /// Builds a summary from a merged crawl output
    pub fn from_output(
        output: &MergedOutput,
        started_at: DateTime<Utc>,
        config_hash: Option<String>,
        output_path: PathBuf,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            config_hash,
            ranges_total: output.ranges_total,
            failed: output.failed.clone(),
            records: output.records.len(),
            items_skipped: output.items_skipped,
            output_path,
        }
    }

    /// Returns the number of ranges that finished
    pub fn ranges_succeeded(&self) -> usize {
        self.ranges_total - self.failed.len()
    }

    /// Returns the run duration in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Returns the share of ranges that finished, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.ranges_total == 0 {
            return 0.0;
        }
        (self.ranges_succeeded() as f64 / self.ranges_total as f64) * 100.0
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {} seconds", summary.duration_seconds());
    if let Some(hash) = &summary.config_hash {
        println!("  Config hash: {}", hash);
    }
    println!();

    println!("Ranges:");
    println!("  Total: {}", summary.ranges_total);
    println!(
        "  Succeeded: {} ({:.1}%)",
        summary.ranges_succeeded(),
        summary.success_rate()
    );
    println!("  Failed: {}", summary.failed.len());
    for failed in &summary.failed {
        println!("    - {}", failed);
    }
    println!();

    println!("Records:");
    println!("  Written: {}", summary.records);
    println!("  Skipped items: {}", summary.items_skipped);
    println!("  Output: {}", summary.output_path.display());
}
