//! Work partitioning across crawl workers
//!
//! This module splits a unit of work into contiguous, ordered chunks:
//! - A date range becomes a list of [`WorkRange`]s, one per worker
//! - A list of archive links becomes a list of [`LinkRange`]s
//!
//! Both use the same chunk-size policy, derived from the total amount of
//! work. Every chunk holds `chunk_size` units except the last one, which
//! absorbs the remainder. Concatenating the chunks in index order always
//! reproduces the original work with no gap or overlap.

use crate::calendar::CalendarDate;
use crate::{ConfigError, ConfigResult, CrawlError};
use std::fmt;

/// Returns the number of units one worker should own for `total` units
///
/// | Total | Chunk size |
/// |-------|------------|
/// | < 31 | 1 |
/// | < 100 | 3 |
/// | < 300 | 10 |
/// | < 1000 | 31 |
/// | otherwise | 50 per full thousand |
///
/// # Errors
///
/// Returns `ConfigError::EmptyRange` when `total` is 0.
pub fn chunk_size(total: u32) -> ConfigResult<u32> {
    match total {
        0 => Err(ConfigError::EmptyRange),
        1..=30 => Ok(1),
        31..=99 => Ok(3),
        100..=299 => Ok(10),
        300..=999 => Ok(31),
        _ => Ok(50 * (total / 1000)),
    }
}

/// Returns how many workers `total` units are split across
pub fn worker_count(total: u32) -> ConfigResult<u32> {
    let chunk = chunk_size(total)?;
    Ok(total.div_ceil(chunk))
}

/// A contiguous span of days owned by exactly one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    /// Position of this range in partition order
    pub index: usize,

    /// First day of the range
    pub start: CalendarDate,

    /// Number of days in the range (always >= 1)
    pub length: u32,
}

impl WorkRange {
    /// Iterates over the days of this range in order
    pub fn days(&self) -> impl Iterator<Item = CalendarDate> {
        self.start.iter_days(self.length)
    }

    /// Returns the last day covered by this range
    pub fn last_day(&self) -> CalendarDate {
        self.start.advance(self.length.saturating_sub(1))
    }
}

impl fmt::Display for WorkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.length == 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..{}", self.start, self.last_day())
        }
    }
}

/// A contiguous slice of archive links owned by exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRange {
    /// Position of this range in partition order
    pub index: usize,

    /// Offset of the first link in the original list
    pub offset: usize,

    /// Listing URLs, in original order
    pub links: Vec<String>,
}

/// The work handed to a single worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkAssignment {
    /// Walk the archive day by day
    Days(WorkRange),

    /// Walk an explicit list of listing pages
    Links(LinkRange),
}

impl WorkAssignment {
    /// Returns the partition index of this assignment
    pub fn index(&self) -> usize {
        match self {
            Self::Days(range) => range.index,
            Self::Links(range) => range.index,
        }
    }

    /// Returns a short human readable label, also used to key sinks
    pub fn label(&self) -> String {
        match self {
            Self::Days(range) => range.to_string(),
            Self::Links(range) => format!(
                "links {}..{}",
                range.offset,
                range.offset + range.links.len()
            ),
        }
    }

    /// Expands the assignment into the listing URLs to walk, in order
    ///
    /// For day ranges every `{date}` in `listing_template` is replaced by the
    /// `YYYY-MM-DD` form of each day.
    pub fn listing_urls(&self, listing_template: &str) -> Vec<String> {
        match self {
            Self::Days(range) => range
                .days()
                .map(|day| listing_template.replace("{date}", &day.to_string()))
                .collect(),
            Self::Links(range) => range.links.clone(),
        }
    }
}

/// Splits the inclusive date range `[start, end]` into worker ranges
///
/// The total is counted with [`CalendarDate::days_between`]. The last range is
/// sized by counting again from its own start to `end` rather than by
/// subtraction.
///
/// # Errors
///
/// * `CrawlError::Validation` if `start >= end` or a date is not a calendar day
/// * `CrawlError::Config` if the range is empty
pub fn partition_days(start: CalendarDate, end: CalendarDate) -> Result<Vec<WorkRange>, CrawlError> {
    let total = start.days_between(&end)?;
    let chunk = chunk_size(total)?;
    let count = total.div_ceil(chunk) as usize;

    let mut ranges = Vec::with_capacity(count);
    let mut cursor = start;
    for index in 0..count {
        let length = if index + 1 == count {
            remaining_days(cursor, end)?
        } else {
            chunk
        };
        ranges.push(WorkRange {
            index,
            start: cursor,
            length,
        });
        cursor = cursor.advance(chunk);
    }

    tracing::debug!(
        "Partitioned {} days from {} into {} ranges of {} days",
        total,
        start,
        ranges.len(),
        chunk
    );

    Ok(ranges)
}

/// Inclusive day count from `from` to `to`, where `from == to` counts as one day
fn remaining_days(from: CalendarDate, to: CalendarDate) -> Result<u32, CrawlError> {
    if from == to {
        return Ok(1);
    }
    Ok(from.days_between(&to)?)
}

/// Splits a list of listing links into worker ranges
///
/// # Errors
///
/// Returns `ConfigError::EmptyRange` for an empty list.
pub fn partition_links(links: Vec<String>) -> ConfigResult<Vec<LinkRange>> {
    let total = u32::try_from(links.len())
        .map_err(|_| ConfigError::Validation(format!("too many links: {}", links.len())))?;
    let chunk = chunk_size(total)? as usize;

    let ranges = links
        .chunks(chunk)
        .enumerate()
        .map(|(index, slice)| LinkRange {
            index,
            offset: index * chunk,
            links: slice.to_vec(),
        })
        .collect();

    Ok(ranges)
}
