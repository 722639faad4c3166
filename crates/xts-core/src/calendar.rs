//! Local-calendar boundaries: midnights, months and reporting windows.

use std::fmt;

use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, Months, NaiveDate, NaiveTime, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

/// Seconds in a calendar day without DST adjustment.
pub const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time.
pub fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // Midnight fell into a spring-forward gap; 1am exists in every zone we know of.
            let one_am = midnight + Duration::hours(1);
            Local.from_local_datetime(&one_am).earliest().map_or_else(
                || Utc.from_utc_datetime(&midnight),
                |dt| dt.with_timezone(&Utc),
            )
        }
    }
}

/// Local calendar date of an instant.
pub fn local_date(when: DateTime<Utc>) -> NaiveDate {
    when.with_timezone(&Local).date_naive()
}

/// Start of the local day containing `when`.
pub fn midnight(when: DateTime<Utc>) -> DateTime<Utc> {
    local_midnight(local_date(when))
}

/// Start of the local month containing `when`.
pub fn first_of_month(when: DateTime<Utc>) -> DateTime<Utc> {
    local_midnight(month_start_date(local_date(when)))
}

fn month_start_date(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Which weekday a reporting week begins on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    fn days_into_week(self, date: NaiveDate) -> u32 {
        match self {
            Self::Sunday => date.weekday().num_days_from_sunday(),
            Self::Monday => date.weekday().num_days_from_monday(),
        }
    }
}

/// A half-open reporting window `[begin, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// The 7-day week containing `date`.
    pub fn week_of(date: NaiveDate, week_start: WeekStart) -> Self {
        let first = date - Duration::days(i64::from(week_start.days_into_week(date)));
        Self {
            begin: local_midnight(first),
            end: local_midnight(first + Duration::days(7)),
        }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let first = month_start_date(date);
        let next = first
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self {
            begin: local_midnight(first),
            end: local_midnight(next),
        }
    }

    /// Whether an interval lies inside the window.
    ///
    /// The interval must start at or after `begin` and stop before `end`.
    pub fn contains(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> bool {
        start >= self.begin && stop < self.end
    }

    /// First local date of the window.
    pub fn first_day(&self) -> NaiveDate {
        local_date(self.begin)
    }

    /// Local date at which the window stops (exclusive).
    pub fn end_day(&self) -> NaiveDate {
        local_date(self.end)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -- {}",
            self.first_day().format("%Y/%m/%d"),
            self.end_day().format("%Y/%m/%d")
        )
    }
}
