//! Calendar days for archive crawling
//!
//! This module provides the minimal date type the crawler needs to walk a
//! news archive one day at a time:
//! - Parsing and formatting `YYYY-MM-DD`
//! - Validity checks against the archive floor year
//! - Single-day stepping with month/year rollover
//! - Inclusive day counting between two dates

mod date;

pub use date::{days_in_month, CalendarDate, CalendarError, FIRST_ARCHIVE_YEAR};
