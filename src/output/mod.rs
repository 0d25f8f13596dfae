//! Output module for crawl results
//!
//! This module handles:
//! - The [`Record`] type produced for every article
//! - Writing the merged, tab-separated result file
//! - Printing the run summary

mod record;
pub mod summary;
mod tsv;

pub use record::Record;
pub use summary::{print_summary, RunSummary};
pub use tsv::{write_records, write_tsv_file};
