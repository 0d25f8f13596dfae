use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for the archive crawler
///
/// Every section has defaults, so an empty file (or no file at all) crawls
/// the gazetazp.ru daily archive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Worker scheduling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of workers running at the same time
    #[serde(rename = "max-concurrent-workers")]
    pub max_concurrent_workers: u32,

    /// Upper bound on pages walked for a single listing
    #[serde(rename = "max-pages-per-listing")]
    pub max_pages_per_listing: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_workers: 32,
            max_pages_per_listing: 100,
        }
    }
}

/// HTTP fetch and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Attempts per URL before giving up; 0 retries forever
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First backoff delay (milliseconds)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Backoff ceiling (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            max_attempts: 10,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "archive-crawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the merged TSV file
    #[serde(rename = "result-path")]
    pub result_path: PathBuf,

    /// Directory for per-worker sink files; in-memory sinks when unset
    #[serde(rename = "sink-dir")]
    pub sink_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_path: PathBuf::from("result.tsv"),
            sink_dir: None,
        }
    }
}

/// How follow-up pages of a listing are addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageScheme {
    /// `<listing>?page=N`
    Query,

    /// `<listing>/page/N/`
    Path,
}

/// Site-specific markup and addressing rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Listing URL for one archive day; `{date}` becomes `YYYY-MM-DD`
    #[serde(rename = "listing-template")]
    pub listing_template: String,

    /// Pagination addressing
    #[serde(rename = "page-scheme")]
    pub page_scheme: PageScheme,

    /// Number of items on a full listing page
    #[serde(rename = "page-size")]
    pub page_size: usize,

    /// Selector for article links on a listing page
    #[serde(rename = "item-selector")]
    pub item_selector: String,

    /// Selector for the pagination control
    #[serde(rename = "pagination-selector")]
    pub pagination_selector: String,

    /// Selector for the article headline
    #[serde(rename = "title-selector")]
    pub title_selector: String,

    /// Selector for the publication time element
    #[serde(rename = "timestamp-selector")]
    pub timestamp_selector: String,

    /// Attribute holding the publication time; element text when unset
    #[serde(rename = "timestamp-attr")]
    pub timestamp_attr: Option<String>,

    /// Selectors for article text blocks, concatenated in order
    #[serde(rename = "body-selectors")]
    pub body_selectors: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            listing_template: "https://gazetazp.ru/archive/{date}".to_string(),
            page_scheme: PageScheme::Query,
            page_size: 27,
            item_selector: "h3 a[href]".to_string(),
            pagination_selector: "ul.paginator".to_string(),
            title_selector: "div.head-post h2".to_string(),
            timestamp_selector: "span.time".to_string(),
            timestamp_attr: Some("title".to_string()),
            body_selectors: vec![
                "div.head-post div:not([class])".to_string(),
                "div.entry-post p:not([class])".to_string(),
            ],
        }
    }
}
