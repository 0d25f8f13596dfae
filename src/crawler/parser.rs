//! HTML parsing for listing and article pages
//!
//! This module defines the [`PageParser`] seam between the crawl core and the
//! markup of a particular site, plus [`SelectorParser`], a parser driven by
//! the CSS selectors in the `[site]` configuration section.

use crate::config::SiteConfig;
use crate::output::Record;
use crate::{ConfigError, ParseError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A reference to one article found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    /// Absolute article URL
    pub url: String,

    /// Listing page the reference was found on (1-based)
    pub page: u32,
}

/// Items and pagination signal extracted from one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Article URLs in page order
    pub items: Vec<String>,

    /// True if another page should be requested
    pub has_more: bool,
}

/// Site-specific markup extraction
///
/// Implementations must be shareable across workers.
pub trait PageParser: Send + Sync {
    /// Extracts article links and the "has more pages" signal from a listing page
    ///
    /// # Arguments
    ///
    /// * `html` - The listing page body
    /// * `page_url` - URL the page was fetched from, for resolving relative links
    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<ListingPage, ParseError>;

    /// Extracts a record from an article page
    ///
    /// # Arguments
    ///
    /// * `html` - The article page body
    /// * `article_url` - URL the article was fetched from
    fn parse_article(&self, html: &str, article_url: &str) -> Result<Record, ParseError>;
}

/// Characters that already end a sentence-like text block
const TERMINATORS: [char; 9] = ['.', '?', '!', ';', ',', '-', ':', '"', '\''];

/// [`PageParser`] driven by CSS selectors
#[derive(Debug)]
pub struct SelectorParser {
    item: Selector,
    pagination: Selector,
    title: Selector,
    timestamp: Selector,
    timestamp_attr: Option<String>,
    body: Vec<Selector>,
    page_size: usize,
}

impl SelectorParser {
    /// Compiles the selectors of a site configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSelector` if any selector fails to parse.
    pub fn from_config(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            item: compile(&site.item_selector)?,
            pagination: compile(&site.pagination_selector)?,
            title: compile(&site.title_selector)?,
            timestamp: compile(&site.timestamp_selector)?,
            timestamp_attr: site.timestamp_attr.clone(),
            body: site
                .body_selectors
                .iter()
                .map(|s| compile(s))
                .collect::<Result<_, _>>()?,
            page_size: site.page_size,
        })
    }

    fn extract_timestamp(&self, element: ElementRef<'_>) -> String {
        let raw = self
            .timestamp_attr
            .as_deref()
            .and_then(|attr| element.value().attr(attr))
            .map(str::to_string)
            .unwrap_or_else(|| element.text().collect());
        clean_text(&raw)
    }

    fn extract_body(&self, document: &Html) -> String {
        let mut blocks = Vec::new();
        for selector in &self.body {
            for element in document.select(selector) {
                let text = clean_text(&element.text().collect::<String>());
                if text.is_empty() {
                    continue;
                }
                blocks.push(terminate(text));
            }
        }
        blocks.join(" ")
    }
}

impl PageParser for SelectorParser {
    fn parse_listing(&self, html: &str, page_url: &Url) -> Result<ListingPage, ParseError> {
        let document = Html::parse_document(html);

        let entries: Vec<ElementRef<'_>> = document.select(&self.item).collect();

        // Fullness counts every matched entry, including links filtered out below
        let has_pagination = document.select(&self.pagination).next().is_some();
        let has_more = has_pagination && entries.len() >= self.page_size;

        let items = entries
            .iter()
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(href, page_url))
            .collect();

        Ok(ListingPage { items, has_more })
    }

    fn parse_article(&self, html: &str, article_url: &str) -> Result<Record, ParseError> {
        if article_url.trim().is_empty() {
            return Err(ParseError::EmptyField {
                url: article_url.to_string(),
                field: "url",
            });
        }

        let document = Html::parse_document(html);
        let missing = |what: &str| ParseError::MissingElement {
            url: article_url.to_string(),
            what: what.to_string(),
        };

        let title = document
            .select(&self.title)
            .next()
            .map(|element| clean_text(&element.text().collect::<String>()))
            .ok_or_else(|| missing("title"))?;
        if title.is_empty() {
            return Err(ParseError::EmptyField {
                url: article_url.to_string(),
                field: "title",
            });
        }

        let timestamp = document
            .select(&self.timestamp)
            .next()
            .map(|element| self.extract_timestamp(element))
            .ok_or_else(|| missing("timestamp"))?;

        let body = self.extract_body(&document);

        Ok(Record {
            title,
            timestamp,
            url: article_url.to_string(),
            body,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Removes line breaks and tabs, then trims surrounding whitespace
fn clean_text(text: &str) -> String {
    text.replace(['\n', '\t', '\r'], "").trim().to_string()
}

/// Appends a period unless the block already ends with punctuation
fn terminate(mut text: String) -> String {
    if !text.ends_with(TERMINATORS) {
        text.push('.');
    }
    text
}

/// Resolves an item href against the listing page URL
///
/// Returns None for empty, fragment-only and non-HTTP links.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute.to_string())
    } else {
        None
    }
}
