//! Calendar-month arithmetic and strict date parsing.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing or constructing calendar values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonthError {
    #[error("month must be between 1 and 12, got {0}")]
    MonthOutOfRange(u32),
    #[error("year {0} is outside the supported calendar")]
    YearOutOfRange(i32),
    #[error("malformed month `{0}` (expected YYYY-MM)")]
    MalformedMonth(String),
    #[error("malformed date `{0}` (expected YYYY-MM-DD)")]
    MalformedDate(String),
}

/// One calendar month. Budgets, targets and reports are all keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BudgetMonth {
    year: i32,
    month: u32,
}

impl BudgetMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthError> {
        if !(1..=12).contains(&month) {
            return Err(MonthError::MonthOutOfRange(month));
        }
        // Both ends of the month must be representable.
        if NaiveDate::from_ymd_opt(year, month, 1).is_none()
            || NaiveDate::from_ymd_opt(year + 1, 1, 1).is_none()
        {
            return Err(MonthError::YearOutOfRange(year));
        }
        Ok(Self { year, month })
    }

    /// Parses `YYYY-MM`.
    pub fn parse(raw: &str) -> Result<Self, MonthError> {
        let trimmed = raw.trim();
        let malformed = || MonthError::MalformedMonth(raw.to_string());
        let (year, month) = trimmed.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every day of the month in chronological order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day();
        (0..self.days_in_month()).map(move |offset| first + Duration::days(offset as i64))
    }

    /// Where a reference date sits relative to this month.
    pub fn position_of(&self, reference: NaiveDate) -> MonthPosition {
        if reference < self.first_day() {
            MonthPosition::Future
        } else if reference > self.last_day() {
            MonthPosition::Past
        } else {
            MonthPosition::Current
        }
    }
}

impl fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for BudgetMonth {
    type Error = MonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BudgetMonth> for String {
    fn from(month: BudgetMonth) -> Self {
        month.to_string()
    }
}

impl FromStr for BudgetMonth {
    type Err = MonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Position of a month relative to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthPosition {
    /// The whole month lies before the reference date.
    Past,
    Current,
    /// The month has not started yet.
    Future,
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, MonthError> {
    let trimmed = raw.trim();
    if trimmed.len() != 10 {
        return Err(MonthError::MalformedDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| MonthError::MalformedDate(raw.to_string()))
}
