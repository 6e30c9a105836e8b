use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The first day of the week used for weekly reporting periods when none is configured.
pub const DEFAULT_WEEK_START: Weekday = Weekday::Sat;

// Month length lookups. Index 0 is January.
const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const MONTH_LENGTHS_LEAP: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Error, Debug, PartialEq)]
pub enum CalendarError {
    #[error("'{0}' is not a known reporting period")]
    UnknownPeriod(String),
}

/// A named reporting period, resolved relative to "now"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
}

/// A closed `[from, to]` interval of calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Returns the number of days in `month` (January = 1) of `year`, or `None` if
/// `month` is not in `1..=12`.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let index = month.checked_sub(1)? as usize;
    month_lengths(year).get(index).copied()
}

/// Advance `date` by `n` calendar months (`n` may be negative).
///
/// If the day of month doesn't exist in the target month, the result is clamped to
/// that month's last day, so 31 January + 1 month is 28 (or 29) February. Results
/// beyond the range `chrono` can represent saturate at `NaiveDate::MIN`/`MAX`.
pub fn add_months(date: NaiveDate, n: i32) -> NaiveDate {
    let months = Months::new(n.unsigned_abs());
    if n < 0 {
        date.checked_sub_months(months).unwrap_or(NaiveDate::MIN)
    } else {
        date.checked_add_months(months).unwrap_or(NaiveDate::MAX)
    }
}

/// Truncate the time of day, leaving midnight on the same calendar day.
pub fn start_of_day(datetime: NaiveDateTime) -> NaiveDateTime {
    datetime.date().and_time(NaiveTime::MIN)
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

pub(crate) fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first + Duration::days(month_length(date) as i64 - 1)
}

/// The number of days in the month `date` falls in
pub(crate) fn month_length(date: NaiveDate) -> u32 {
    month_lengths(date.year())[date.month0() as usize]
}

fn month_lengths(year: i32) -> &'static [u32; 12] {
    if is_leap_year(year) {
        &MONTH_LENGTHS_LEAP
    } else {
        &MONTH_LENGTHS
    }
}

impl Period {
    /// Resolve this period to a date range.
    ///
    /// Weeks begin on `week_start`. `now` defaults to today's local date and exists so
    /// callers (and tests) can pin the anchor.
    pub fn range(&self, week_start: Weekday, now: Option<NaiveDate>) -> DateRange {
        let now = now.unwrap_or_else(today);

        match *self {
            Period::ThisWeek => week_containing(now, week_start),
            Period::LastWeek => week_containing(now - Duration::weeks(1), week_start),
            Period::ThisMonth => month_containing(now),
            Period::LastMonth => month_containing(add_months(now, -1)),
            Period::ThisYear => {
                let from = now - Duration::days(now.ordinal0() as i64);
                let length = if is_leap_year(now.year()) { 366 } else { 365 };
                DateRange {
                    from,
                    to: from + Duration::days(length - 1),
                }
            }
        }
    }
}

impl FromStr for Period {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thisWeek" => Ok(Period::ThisWeek),
            "lastWeek" => Ok(Period::LastWeek),
            "thisMonth" => Ok(Period::ThisMonth),
            "lastMonth" => Ok(Period::LastMonth),
            "thisYear" => Ok(Period::ThisYear),
            _ => Err(CalendarError::UnknownPeriod(s.into())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Period::ThisWeek => "thisWeek",
            Period::LastWeek => "lastWeek",
            Period::ThisMonth => "thisMonth",
            Period::LastMonth => "lastMonth",
            Period::ThisYear => "thisYear",
        };
        f.write_str(name)
    }
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

// Find the week (starting on `week_start`) that contains `date`. This always looks
// backwards, so a date that is itself a `week_start` begins its own week.
fn week_containing(date: NaiveDate, week_start: Weekday) -> DateRange {
    let offset =
        (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    let from = date - Duration::days(offset as i64);

    DateRange {
        from,
        to: from + Duration::days(6),
    }
}

fn month_containing(date: NaiveDate) -> DateRange {
    DateRange {
        from: first_of_month(date),
        to: last_of_month(date),
    }
}
