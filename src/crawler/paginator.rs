//! Listing pagination
//!
//! A listing (one archive day, or one explicit link) may span several pages.
//! The paginator requests page 1, 2, 3, ... until the parser reports that
//! no further page exists, and yields the article references of each page in
//! order.

use crate::config::PageScheme;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{ItemRef, PageParser};
use crate::{CrawlError, ParseError};
use std::sync::Arc;
use url::Url;

/// Builds the URL of page `page` of a listing
///
/// Page 1 is always the listing URL itself.
///
/// # Arguments
///
/// * `base` - The listing URL
/// * `page` - 1-based page number
/// * `scheme` - How follow-up pages are addressed
///
/// # Example
///
/// ```
/// use archive_crawler::config::PageScheme;
/// use archive_crawler::crawler::page_url;
///
/// let url = "https://news.example/archive/2024-01-01";
/// assert_eq!(page_url(url, 1, PageScheme::Query), url);
/// assert_eq!(
///     page_url(url, 3, PageScheme::Query),
///     "https://news.example/archive/2024-01-01?page=3"
/// );
/// assert_eq!(
///     page_url(url, 3, PageScheme::Path),
///     "https://news.example/archive/2024-01-01/page/3/"
/// );
/// ```
pub fn page_url(base: &str, page: u32, scheme: PageScheme) -> String {
    if page <= 1 {
        return base.to_string();
    }

    match scheme {
        PageScheme::Query => {
            let separator = if base.contains('?') { '&' } else { '?' };
            format!("{}{}page={}", base, separator, page)
        }
        PageScheme::Path => format!("{}/page/{}/", base.trim_end_matches('/'), page),
    }
}

/// Walks the pages of listings
#[derive(Clone)]
pub struct Paginator {
    fetcher: Arc<Fetcher>,
    parser: Arc<dyn PageParser>,
    scheme: PageScheme,
    max_pages: u32,
}

impl Paginator {
    /// Creates a paginator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared page fetcher
    /// * `parser` - Shared site parser
    /// * `scheme` - Pagination addressing of the site
    /// * `max_pages` - Upper bound on pages walked per listing
    pub fn new(
        fetcher: Arc<Fetcher>,
        parser: Arc<dyn PageParser>,
        scheme: PageScheme,
        max_pages: u32,
    ) -> Self {
        Self {
            fetcher,
            parser,
            scheme,
            max_pages,
        }
    }

    /// Returns the fetcher shared with workers
    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    /// Returns the parser shared with workers
    pub fn parser(&self) -> &Arc<dyn PageParser> {
        &self.parser
    }

    /// Starts a lazy walk over the pages of `listing_url`
    pub fn walk(&self, listing_url: &str) -> ListingWalk {
        ListingWalk {
            paginator: self.clone(),
            base: listing_url.to_string(),
            page: 1,
            finished: false,
        }
    }

    /// Collects every article reference of a listing, in page order
    ///
    /// # Errors
    ///
    /// Returns the first fetch or parse error; references gathered from
    /// earlier pages are dropped.
    pub async fn list_items(&self, listing_url: &str) -> Result<Vec<ItemRef>, CrawlError> {
        let mut walk = self.walk(listing_url);
        let mut items = Vec::new();
        while let Some(page) = walk.next_page().await {
            items.extend(page?);
        }
        Ok(items)
    }
}

/// Iteration state over the pages of a single listing
pub struct ListingWalk {
    paginator: Paginator,
    base: String,
    page: u32,
    finished: bool,
}

impl ListingWalk {
    /// Number of the page the next call will request
    pub fn current_page(&self) -> u32 {
        self.page
    }

    /// Fetches and parses the next page
    ///
    /// # Returns
    ///
    /// * `Some(Ok(items))` - Article references of the page
    /// * `Some(Err(e))` - The page could not be fetched or parsed; the walk ends
    /// * `None` - The previous page was the last one
    pub async fn next_page(&mut self) -> Option<Result<Vec<ItemRef>, CrawlError>> {
        if self.finished {
            return None;
        }

        if self.page > self.paginator.max_pages {
            tracing::warn!(
                "Listing {} still reports more pages after {}, stopping",
                self.base,
                self.paginator.max_pages
            );
            self.finished = true;
            return None;
        }

        let page = self.page;
        let url = page_url(&self.base, page, self.paginator.scheme);
        let result = self.fetch_page(&url, page).await;

        match &result {
            Ok((_, true)) => self.page += 1,
            _ => self.finished = true,
        }

        Some(result.map(|(items, _)| items))
    }

    async fn fetch_page(&self, url: &str, page: u32) -> Result<(Vec<ItemRef>, bool), CrawlError> {
        let parsed = Url::parse(url).map_err(|e| ParseError::InvalidUrl(format!("{}: {}", url, e)))?;

        tracing::debug!("Fetching listing page {}", url);
        let html = self.paginator.fetcher.fetch(url).await?;
        let listing = self.paginator.parser.parse_listing(&html, &parsed)?;

        tracing::debug!(
            "Listing page {} yielded {} items (more: {})",
            url,
            listing.items.len(),
            listing.has_more
        );

        let items = listing
            .items
            .into_iter()
            .map(|url| ItemRef { url, page })
            .collect();
        Ok((items, listing.has_more))
    }
}
