//! Calendar date used to address archive days
//!
//! Dates are stepped one day at a time, the same way the archive is walked,
//! so `advance` and `days_between` are linear in the number of days.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Earliest year any supported archive publishes
pub const FIRST_ARCHIVE_YEAR: i32 = 1997;

/// Errors produced by calendar operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("Incorrect date '{input}': expected YYYY-MM-DD")]
    WrongFieldCount { input: String },

    #[error("Incorrect date '{input}': field '{field}' is not a number")]
    NotNumeric { input: String, field: String },

    #[error("Start date {start} must be earlier than finish date {end}")]
    NotBefore {
        start: CalendarDate,
        end: CalendarDate,
    },

    #[error("{0} is not a calendar day")]
    NotACalendarDay(CalendarDate),
}

/// A single day: year, month (1..=12) and day of month
///
/// Ordering is lexicographic on (year, month, day), which the derived
/// implementations provide through field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Returns the number of days in `month` of `year`
///
/// Leap years are every year divisible by 4. The century exception of the
/// Gregorian calendar is intentionally not applied, so 2100-02-29 counts as a
/// real day. Returns 0 for months outside 1..=12.
pub fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if year % 4 == 0 => 29,
        2 => 28,
        _ => 0,
    }
}

impl CalendarDate {
    /// Creates a date without checking it
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Parses a `YYYY-MM-DD` string
    ///
    /// Only the shape is checked here; use [`CalendarDate::is_valid`] for
    /// range checks.
    ///
    /// # Example
    ///
    /// ```
    /// use archive_crawler::calendar::CalendarDate;
    ///
    /// let date = CalendarDate::parse("2024-02-28").unwrap();
    /// assert_eq!(date, CalendarDate::new(2024, 2, 28));
    /// assert!(CalendarDate::parse("2024-02").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, CalendarError> {
        let fields: Vec<&str> = text.split('-').collect();
        if fields.len() != 3 {
            return Err(CalendarError::WrongFieldCount {
                input: text.to_string(),
            });
        }

        let not_numeric = |field: &str| CalendarError::NotNumeric {
            input: text.to_string(),
            field: field.to_string(),
        };

        let year = fields[0]
            .trim()
            .parse::<i32>()
            .map_err(|_| not_numeric(fields[0]))?;
        let month = fields[1]
            .trim()
            .parse::<u32>()
            .map_err(|_| not_numeric(fields[1]))?;
        let day = fields[2]
            .trim()
            .parse::<u32>()
            .map_err(|_| not_numeric(fields[2]))?;

        Ok(Self { year, month, day })
    }

    /// Returns true if the date is a real day no earlier than the archive floor
    pub fn is_valid(&self) -> bool {
        self.year >= FIRST_ARCHIVE_YEAR && self.is_calendar_day()
    }

    /// Month and day are in range, regardless of year
    fn is_calendar_day(&self) -> bool {
        (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.month, self.year)
    }

    /// Returns the date `days` days later
    pub fn advance(&self, days: u32) -> Self {
        let mut date = *self;
        for _ in 0..days {
            date.step();
        }
        date
    }

    /// Moves forward by a single day, rolling over month and year
    pub fn step(&mut self) {
        self.day += 1;
        if self.day > days_in_month(self.month, self.year) {
            self.day = 1;
            self.month += 1;
            if self.month > 12 {
                self.month = 1;
                self.year += 1;
            }
        }
    }

    /// Counts the days from `self` to `other`, both ends included
    ///
    /// The count starts at 1 for `self`, so the next day yields 2 and
    /// `a.days_between(&a.advance(n)) == n + 1`.
    ///
    /// # Errors
    ///
    /// * `CalendarError::NotBefore` if `self >= other`
    /// * `CalendarError::NotACalendarDay` if either date has an out-of-range
    ///   month or day
    pub fn days_between(&self, other: &Self) -> Result<u32, CalendarError> {
        if self >= other {
            return Err(CalendarError::NotBefore {
                start: *self,
                end: *other,
            });
        }
        for date in [self, other] {
            if !date.is_calendar_day() {
                return Err(CalendarError::NotACalendarDay(*date));
            }
        }

        let mut current = *self;
        let mut days = 1;
        while current != *other {
            current.step();
            days += 1;
        }
        Ok(days)
    }

    /// Iterates over `count` consecutive days starting at `self`
    pub fn iter_days(&self, count: u32) -> impl Iterator<Item = CalendarDate> {
        let mut current = *self;
        (0..count).map(move |offset| {
            if offset > 0 {
                current.step();
            }
            current
        })
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for CalendarDate {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
