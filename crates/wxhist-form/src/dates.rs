//! Date parsing and date-range policy.
//!
//! All span math is calendar aware: whole months are counted by calendar
//! field subtraction and the remainder is measured against the length of the
//! month that follows, so leap days never skew the result.

use chrono::{Datelike, Months, NaiveDate};
use thiserror::Error;

use crate::error::DateParseError;

/// Canonical text format for dates (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Earliest date the archive has coverage for.
pub const MINIMUM_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1940, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Longest allowed range, in fractional calendar years.
pub const MAX_SPAN_YEARS: f64 = 1.0;

/// Parse canonical `YYYY-MM-DD` text into a calendar date.
///
/// Stricter than chrono's `%Y-%m-%d`: the year must be exactly four digits
/// and month and day zero padded.
pub fn parse_date(text: &str) -> Result<NaiveDate, DateParseError> {
    let bytes = text.as_bytes();
    let well_shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_shaped {
        return Err(DateParseError::Format(text.to_string()));
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| DateParseError::NotACalendarDate(text.to_string()))
}

/// True unless both dates are present and either fails to parse or `end`
/// comes before `start`.
///
/// Absent or blank values pass: requiring them is the presence check's job.
pub fn is_chronologically_valid(start: Option<&str>, end: Option<&str>) -> bool {
    let blank = |s: &&str| s.trim().is_empty();
    let (Some(start), Some(end)) = (start.filter(|s| !blank(s)), end.filter(|s| !blank(s))) else {
        return true;
    };
    match (parse_date(start), parse_date(end)) {
        (Ok(start), Ok(end)) => end >= start,
        _ => false,
    }
}

/// True if `end` is at most one calendar year after `start`.
pub fn is_within_allowed_span(start: NaiveDate, end: NaiveDate) -> bool {
    years_between(start, end) <= MAX_SPAN_YEARS
}

/// True if `start` is on or after [`MINIMUM_DATE`].
pub fn is_on_or_after_floor(start: NaiveDate) -> bool {
    start >= MINIMUM_DATE
}

/// Fractional calendar years from `start` to `end`; negative if `end` is
/// earlier.
pub fn years_between(start: NaiveDate, end: NaiveDate) -> f64 {
    if end < start {
        return -years_between(end, start);
    }

    let mut whole = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let mut anchor = add_months(start, whole);
    if anchor > end {
        whole -= 1;
        anchor = add_months(start, whole);
    }

    let next = add_months(start, whole + 1);
    let month_days = (next - anchor).num_days();
    let fraction = if month_days > 0 {
        (end - anchor).num_days() as f64 / month_days as f64
    } else {
        0.0
    };

    (f64::from(whole) + fraction) / 12.0
}

// Month-end clamped, e.g. Jan 31 + 1 month = Feb 28.
fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    u32::try_from(months)
        .ok()
        .and_then(|m| date.checked_add_months(Months::new(m)))
        .unwrap_or(NaiveDate::MAX)
}

/// Ordered date pair; `end` is never before `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("end date {end} is before start date {start}")]
pub struct DateRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// Caller guarantees `start <= end`.
    pub(crate) fn from_ordered(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn years(&self) -> f64 {
        years_between(self.start, self.end)
    }

    pub fn is_within_allowed_span(&self) -> bool {
        self.years() <= MAX_SPAN_YEARS
    }

    /// Every date in the range, both ends included.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
