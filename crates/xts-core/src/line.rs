//! Timesheet line classification.
//!
//! A sheet is plain text, one record per line. Each line is one of:
//!
//! ```text
//! rate:<float>
//! project:<name>
//! invoice            (or) billed
//! YYYY/MM/DD HHMMSS -- HHMMSS
//! YYYYMMDDHHMMSS -- HHMMSS
//! YYYYMMDD
//! \tHHMM -- HHMM
//! ```
//!
//! Keywords match case-insensitively. Interval formats are recognised purely
//! by position: every byte must be a digit or the exact separator expected at
//! that offset, otherwise the next format is tried. Anything left over is
//! [`Line::Unrecognized`] and ignored by the accumulator.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

use crate::calendar::{local_midnight, midnight};

/// Errors raised while classifying a line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An interval whose stop time is before its start time.
    ///
    /// Sheets are hand-edited, so this means the file needs fixing before any
    /// total computed from it can be trusted.
    #[error("interval stops before it starts: {line:?}")]
    StopBeforeStart { line: String },
}

/// A work interval decoded from one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInterval {
    /// Absolute start and stop instants.
    Absolute {
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    },
    /// Seconds since the most recent midnight seen in the sheet.
    Relative { start: u32, stop: u32 },
    /// A bare date: a zero-length interval at that day's midnight.
    DayMarker(DateTime<Utc>),
}

impl TimeInterval {
    /// Elapsed seconds.
    pub fn seconds(&self) -> i64 {
        match *self {
            Self::Absolute { start, stop } => (stop - start).num_seconds(),
            Self::Relative { start, stop } => i64::from(stop) - i64::from(start),
            Self::DayMarker(_) => 0,
        }
    }

    /// The midnight this interval establishes, if it carries a date.
    pub fn midnight(&self) -> Option<DateTime<Utc>> {
        match *self {
            Self::Absolute { start, .. } => Some(midnight(start)),
            Self::DayMarker(day) => Some(day),
            Self::Relative { .. } => None,
        }
    }

    /// Absolute `(start, stop)`; relative offsets are added to `anchor`.
    pub fn anchored(&self, anchor: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match *self {
            Self::Absolute { start, stop } => (start, stop),
            Self::Relative { start, stop } => (
                anchor + Duration::seconds(i64::from(start)),
                anchor + Duration::seconds(i64::from(stop)),
            ),
            Self::DayMarker(day) => (day, day),
        }
    }

    pub const fn is_relative(&self) -> bool {
        matches!(self, Self::Relative { .. })
    }
}

/// A classified sheet line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// `rate:` declaration; `None` when the value is not a number.
    Rate(Option<f64>),
    /// `project:` declaration, trimmed.
    Project(String),
    /// `invoice` or `billed` marker.
    Invoice,
    Interval(TimeInterval),
    Unrecognized,
}

/// Classifies one line. A trailing newline is tolerated.
pub fn classify(line: &str) -> Result<Line, ParseError> {
    if let Some(rest) = strip_keyword(line, "rate:") {
        return Ok(Line::Rate(rest.trim().parse::<f64>().ok()));
    }
    if let Some(rest) = strip_keyword(line, "project:") {
        return Ok(Line::Project(rest.trim().to_string()));
    }
    if strip_keyword(line, "invoice").is_some() || strip_keyword(line, "billed").is_some() {
        return Ok(Line::Invoice);
    }
    Ok(parse_interval(line)?.map_or(Line::Unrecognized, Line::Interval))
}

/// Decodes a work interval, or `None` if the line is not one.
pub fn parse_interval(line: &str) -> Result<Option<TimeInterval>, ParseError> {
    let b = line.as_bytes();

    if is_slashed_interval(b) {
        // YYYY/MM/DD HHMMSS -- HHMMSS
        let (Some(day), Some(start), Some(stop)) =
            (decode_date(line, b, 0, 5, 8), hhmmss(line, b, 11), hhmmss(line, b, 21))
        else {
            return Ok(None);
        };
        return absolute(line, day, start, stop).map(Some);
    }

    if is_compact_interval(b) {
        // YYYYMMDDHHMMSS -- HHMMSS
        let (Some(day), Some(start), Some(stop)) =
            (decode_date(line, b, 0, 4, 6), hhmmss(line, b, 8), hhmmss(line, b, 18))
        else {
            return Ok(None);
        };
        return absolute(line, day, start, stop).map(Some);
    }

    if b.starts_with(b"20") && digits(b, 0, 8) {
        // YYYYMMDD
        return Ok(decode_date(line, b, 0, 4, 6).map(TimeInterval::DayMarker));
    }

    if is_relative_interval(b) {
        // \tHHMM -- HHMM
        let (Some(start), Some(stop)) = (hhmm(line, b, 1), hhmm(line, b, 9)) else {
            return Ok(None);
        };
        if stop <= start {
            return Err(ParseError::StopBeforeStart {
                line: line.trim_end().to_string(),
            });
        }
        return Ok(Some(TimeInterval::Relative { start, stop }));
    }

    Ok(None)
}

fn is_slashed_interval(b: &[u8]) -> bool {
    digits(b, 0, 4)
        && byte_is(b, 4, b'/')
        && digits(b, 5, 2)
        && byte_is(b, 7, b'/')
        && digits(b, 8, 2)
        && space_at(b, 10)
        && digits(b, 11, 6)
        && separator_at(b, 17)
        && digits(b, 21, 6)
}

fn is_compact_interval(b: &[u8]) -> bool {
    digits(b, 0, 14) && separator_at(b, 14) && digits(b, 18, 6) && space_or_end(b, 24)
}

fn is_relative_interval(b: &[u8]) -> bool {
    byte_is(b, 0, b'\t') && digits(b, 1, 4) && separator_at(b, 5) && digits(b, 9, 4)
}

fn absolute(
    line: &str,
    day: DateTime<Utc>,
    start: u32,
    stop: u32,
) -> Result<TimeInterval, ParseError> {
    if stop < start {
        return Err(ParseError::StopBeforeStart {
            line: line.trim_end().to_string(),
        });
    }
    Ok(TimeInterval::Absolute {
        start: day + Duration::seconds(i64::from(start)),
        stop: day + Duration::seconds(i64::from(stop)),
    })
}

/// Local midnight of the date whose year, month and day start at the given
/// offsets. Digit-valid but impossible dates are treated as unrecognised.
fn decode_date(line: &str, b: &[u8], year: usize, month: usize, day: usize) -> Option<DateTime<Utc>> {
    let y = i32::try_from(number(b, year, 4)).ok()?;
    let Some(date) = NaiveDate::from_ymd_opt(y, number(b, month, 2), number(b, day, 2)) else {
        tracing::warn!(line = line.trim_end(), "ignoring line with an invalid calendar date");
        return None;
    };
    Some(local_midnight(date))
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let n = keyword.len();
    let head = line.as_bytes().get(..n)?;
    // The keyword is ASCII, so a match always ends on a char boundary.
    head.eq_ignore_ascii_case(keyword.as_bytes())
        .then(|| &line[n..])
}

/// `isspace` in the C locale, which also counts vertical tab.
const fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn digits(b: &[u8], at: usize, len: usize) -> bool {
    b.get(at..at + len)
        .is_some_and(|run| run.iter().all(u8::is_ascii_digit))
}

fn byte_is(b: &[u8], at: usize, want: u8) -> bool {
    b.get(at) == Some(&want)
}

fn space_at(b: &[u8], at: usize) -> bool {
    b.get(at).is_some_and(|&c| is_space(c))
}

fn space_or_end(b: &[u8], at: usize) -> bool {
    at >= b.len() || space_at(b, at)
}

/// Whitespace, `--`, whitespace.
fn separator_at(b: &[u8], at: usize) -> bool {
    space_at(b, at) && byte_is(b, at + 1, b'-') && byte_is(b, at + 2, b'-') && space_at(b, at + 3)
}

/// Decimal value of `len` digits; callers have already checked they are digits.
fn number(b: &[u8], at: usize, len: usize) -> u32 {
    b[at..at + len]
        .iter()
        .fold(0, |acc, &c| acc * 10 + u32::from(c - b'0'))
}

/// Seconds since midnight for a time of day, `None` past 23:59:59.
fn time_of_day(line: &str, hour: u32, minute: u32, second: u32) -> Option<u32> {
    if hour > 23 || minute > 59 || second > 59 {
        tracing::warn!(line = line.trim_end(), "ignoring line with an invalid time of day");
        return None;
    }
    Some(hour * 3600 + minute * 60 + second)
}

fn hhmmss(line: &str, b: &[u8], at: usize) -> Option<u32> {
    time_of_day(line, number(b, at, 2), number(b, at + 2, 2), number(b, at + 4, 2))
}

fn hhmm(line: &str, b: &[u8], at: usize) -> Option<u32> {
    time_of_day(line, number(b, at, 2), number(b, at + 2, 2), 0)
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveTime};

    use super::*;
    use crate::calendar::{SECONDS_PER_DAY, local_date};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn interval(line: &str) -> TimeInterval {
        parse_interval(line).unwrap().expect("line should be an interval")
    }

    // ========== Keyword Tests ==========

    #[test]
    fn rate_is_case_insensitive() {
        assert_eq!(classify("Rate: 100").unwrap(), Line::Rate(Some(100.0)));
        assert_eq!(classify("RATE:33.5\n").unwrap(), Line::Rate(Some(33.5)));
    }

    #[test]
    fn unparseable_rate_is_none() {
        assert_eq!(classify("rate: lots").unwrap(), Line::Rate(None));
        assert_eq!(classify("rate:").unwrap(), Line::Rate(None));
    }

    #[test]
    fn project_is_trimmed() {
        assert_eq!(
            classify("Project:   Test Bench  \n").unwrap(),
            Line::Project("Test Bench".to_string())
        );
    }

    #[test]
    fn invoice_and_billed_markers() {
        assert_eq!(classify("invoice").unwrap(), Line::Invoice);
        assert_eq!(classify("INVOICED 2024/01/31").unwrap(), Line::Invoice);
        assert_eq!(classify("Billed").unwrap(), Line::Invoice);
        assert_eq!(classify("bill").unwrap(), Line::Unrecognized);
    }

    #[test]
    fn keyword_needs_line_start() {
        assert_eq!(classify(" rate: 5").unwrap(), Line::Unrecognized);
    }

    #[test]
    fn non_ascii_lines_are_unrecognized() {
        assert_eq!(classify("ré").unwrap(), Line::Unrecognized);
        assert_eq!(classify("").unwrap(), Line::Unrecognized);
    }

    // ========== Slashed Format Tests ==========

    #[test]
    fn slashed_interval_decodes_local_date_and_offsets() {
        let TimeInterval::Absolute { start, stop } = interval("2024/01/15 093015 -- 171245") else {
            panic!("expected an absolute interval");
        };
        let day = local_midnight(date(2024, 1, 15));

        assert_eq!(local_date(start), date(2024, 1, 15));
        assert_eq!(local_date(stop), date(2024, 1, 15));
        assert_eq!((start - day).num_seconds(), 9 * 3600 + 30 * 60 + 15);
        assert_eq!((stop - day).num_seconds(), 17 * 3600 + 12 * 60 + 45);
    }

    #[test]
    fn slashed_interval_start_is_local_time_of_day() {
        let TimeInterval::Absolute { start, .. } = interval("2024/07/04 083000 -- 090000") else {
            panic!("expected an absolute interval");
        };
        assert_eq!(
            start.with_timezone(&Local).time(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );
    }

    #[test]
    fn logged_suffix_is_ignored() {
        let parsed = interval("2024/01/15 090000 -- 170000 ( 8.0)");
        assert_eq!(parsed.seconds(), 8 * 3600);
    }

    #[test]
    fn zero_length_interval_is_allowed() {
        assert_eq!(interval("2024/01/15 090000 -- 090000").seconds(), 0);
    }

    #[test]
    fn slashed_stop_before_start_is_an_error() {
        let err = parse_interval("2024/01/15 170000 -- 090000\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::StopBeforeStart {
                line: "2024/01/15 170000 -- 090000".to_string()
            }
        );
    }

    #[test]
    fn letter_in_digit_position_falls_through() {
        assert_eq!(classify("2024/01/15 09x000 -- 170000").unwrap(), Line::Unrecognized);
        assert_eq!(classify("2024/01/15 090000 -- Start").unwrap(), Line::Unrecognized);
        assert_eq!(classify("2024-01-15 090000 -- 170000").unwrap(), Line::Unrecognized);
    }

    #[test]
    fn invalid_calendar_date_is_unrecognized() {
        assert_eq!(classify("2024/13/40 090000 -- 170000").unwrap(), Line::Unrecognized);
    }

    #[test]
    fn out_of_range_time_of_day_is_unrecognized() {
        assert_eq!(classify("2024/01/15 230000 -- 250000").unwrap(), Line::Unrecognized);
        assert_eq!(classify("2024/01/15 096000 -- 100000").unwrap(), Line::Unrecognized);
        assert_eq!(classify("20240115090000 -- 100060").unwrap(), Line::Unrecognized);
        assert_eq!(classify("\t2300 -- 2500").unwrap(), Line::Unrecognized);
        assert_eq!(classify("\t0900 -- 0975").unwrap(), Line::Unrecognized);
        assert_eq!(interval("2024/01/15 000000 -- 235959").seconds(), 86399);
    }

    #[test]
    fn tab_is_accepted_as_separator_whitespace() {
        assert_eq!(interval("2024/01/15\t090000\t--\t100000").seconds(), 3600);
    }

    // ========== Compact Format Tests ==========

    #[test]
    fn compact_interval_uses_start_date() {
        let parsed = interval("20240115090000 -- 120000\n");
        let TimeInterval::Absolute { start, .. } = parsed else {
            panic!("expected an absolute interval");
        };
        assert_eq!(local_date(start), date(2024, 1, 15));
        assert_eq!(parsed.seconds(), 3 * 3600);
    }

    #[test]
    fn compact_interval_accepts_end_of_line() {
        assert_eq!(interval("20240115090000 -- 093000").seconds(), 1800);
    }

    #[test]
    fn compact_interval_needs_whitespace_after_stop() {
        // Falls through to the bare-date format.
        assert_eq!(
            interval("20240115090000 -- 0930001"),
            TimeInterval::DayMarker(local_midnight(date(2024, 1, 15)))
        );
    }

    #[test]
    fn compact_stop_before_start_is_an_error() {
        assert!(parse_interval("20240115120000 -- 090000").is_err());
    }

    // ========== Day Marker Tests ==========

    #[test]
    fn bare_date_is_day_marker() {
        let parsed = interval("20240116");
        assert_eq!(parsed, TimeInterval::DayMarker(local_midnight(date(2024, 1, 16))));
        assert_eq!(parsed.seconds(), 0);
        assert_eq!(parsed.midnight(), Some(local_midnight(date(2024, 1, 16))));
    }

    #[test]
    fn bare_date_must_start_with_20() {
        assert_eq!(classify("19991231").unwrap(), Line::Unrecognized);
        assert_eq!(classify("2024011").unwrap(), Line::Unrecognized);
    }

    // ========== Relative Format Tests ==========

    #[test]
    fn relative_interval_is_same_day_offset() {
        let parsed = interval("\t0900 -- 1130");
        assert_eq!(
            parsed,
            TimeInterval::Relative {
                start: 9 * 3600,
                stop: 11 * 3600 + 30 * 60
            }
        );
        let TimeInterval::Relative { start, stop } = parsed else {
            unreachable!()
        };
        assert!(i64::from(start) < SECONDS_PER_DAY);
        assert!(i64::from(stop) <= SECONDS_PER_DAY);
        assert_eq!(parsed.midnight(), None);
    }

    #[test]
    fn relative_interval_anchors_to_midnight() {
        let day = local_midnight(date(2024, 1, 15));
        let (start, stop) = interval("\t0900 -- 1000").anchored(day);
        assert_eq!(start, day + Duration::hours(9));
        assert_eq!(stop, day + Duration::hours(10));
    }

    #[test]
    fn relative_interval_rejects_equal_times() {
        assert!(parse_interval("\t0900 -- 0900").is_err());
        assert!(parse_interval("\t1000 -- 0900").is_err());
    }

    #[test]
    fn relative_interval_needs_leading_tab() {
        assert_eq!(classify(" 0900 -- 1000").unwrap(), Line::Unrecognized);
        assert_eq!(classify("\t0900 - 1000").unwrap(), Line::Unrecognized);
    }

    // ========== Purity ==========

    #[test]
    fn parsing_is_idempotent() {
        for line in [
            "2024/01/15 090000 -- 170000",
            "20240115090000 -- 170000 ",
            "20240115",
            "\t0800 -- 0915",
        ] {
            assert_eq!(parse_interval(line).unwrap(), parse_interval(line).unwrap());
        }
    }
}
