//! Calendar math for bucket keys
//!
//! One place owns week numbering, month lengths, and slot labels so the
//! three granularities cannot drift apart. All positions are taken from
//! the UTC calendar.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weekday slot labels, Monday first
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Month slot labels
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Aggregation granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(format!("unknown granularity: {}", other)),
        }
    }
}

/// Identity of one aggregation bucket
///
/// Ordering sorts by year, then sub-period, which keeps bucket maps
/// chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl PeriodKey {
    /// Key of the bucket containing `start` at the given granularity
    ///
    /// A session spanning midnight or a week boundary belongs wholly to
    /// the bucket of its start.
    pub fn for_start(start: DateTime<Utc>, granularity: Granularity) -> Self {
        let date = start.date_naive();
        match granularity {
            Granularity::Weekly => Self::Week {
                year: date.year(),
                week: week_of_year(date),
            },
            Granularity::Monthly => Self::Month {
                year: date.year(),
                month: date.month(),
            },
            Granularity::Yearly => Self::Year { year: date.year() },
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            Self::Week { year, .. } | Self::Month { year, .. } | Self::Year { year } => *year,
        }
    }

    /// Week or month number within the year
    pub fn sub_period(&self) -> Option<u32> {
        match self {
            Self::Week { week, .. } => Some(*week),
            Self::Month { month, .. } => Some(*month),
            Self::Year { .. } => None,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Week { year, week } => write!(f, "{}-W{}", year, week),
            Self::Month { year, month } => write!(f, "{}-{:02}", year, month),
            Self::Year { year } => write!(f, "{}", year),
        }
    }
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Week number within the calendar year
///
/// Weeks start on Monday and week 1 is the week containing January 1.
/// This is not ISO 8601: a date keeps its calendar year, so the week
/// around New Year splits across two keys.
pub fn week_of_year(date: NaiveDate) -> u32 {
    let Some(jan1) = NaiveDate::from_ymd_opt(date.year(), 1, 1) else {
        return 1;
    };
    let whole_weeks = (week_start(date) - week_start(jan1)).num_days() / 7;
    (whole_weeks + 1) as u32
}

/// Monday and Sunday bounding a numbered week
pub fn week_bounds(year: i32, week: u32) -> Option<(NaiveDate, NaiveDate)> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = i64::from(week.checked_sub(1)?) * 7;
    let monday = week_start(jan1) + Duration::days(offset);
    Some((monday, monday + Duration::days(6)))
}

/// Number of days in a month, leap-aware
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// Slot index within a weekly chart (0 = Monday)
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}
