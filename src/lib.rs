//! Archive Crawler: a concurrent news archive scraper
//!
//! This crate walks the day-by-day archive of a news site, splits the
//! requested date range (or a list of archive links) across concurrent
//! workers, parses every article into a [`Record`] and merges the results
//! into a single tab-separated file in chronological order.

pub mod calendar;
pub mod config;
pub mod crawler;
pub mod output;
pub mod partition;
pub mod sink;
pub mod state;

use calendar::{CalendarDate, CalendarError};
use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("{} of {} ranges failed: {}", .failed.len(), .total, crawler::FailedRange::list(.failed))]
    Aggregate {
        failed: Vec<crawler::FailedRange>,
        total: usize,
    },

    #[error("Invalid worker state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::WorkerState,
        to: state::WorkerState,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CalendarError> for CrawlError {
    fn from(err: CalendarError) -> Self {
        Self::Validation(ValidationError::Date(err))
    }
}

/// Errors in user supplied input, raised before any work starts
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Date(#[from] CalendarError),

    #[error("Date is incorrect: {0}")]
    InvalidDate(CalendarDate),

    #[error("Link list is empty")]
    EmptyLinkList,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Cannot partition an empty range")]
    EmptyRange,
}

/// Network errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transient failure fetching {url}: {reason}")]
    Transient { url: String, reason: String },

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    #[error("Fetch of {url} cancelled")]
    Cancelled { url: String },
}

/// Markup shape mismatches
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Missing {what} in {url}")]
    MissingElement { url: String, what: String },

    #[error("Empty {field} in {url}")]
    EmptyField { url: String, field: &'static str },

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{MergedOutput, Scheduler};
pub use output::Record;
pub use state::WorkerState;
