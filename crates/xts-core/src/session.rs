//! Clock state of a single sheet: what was billed, what is running today.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::accumulate::{Accumulator, AccumulatorConfig, BucketKind, Silent};
use crate::calendar::local_midnight;
use crate::line::{Line, TimeInterval, classify};
use crate::recorder;
use crate::sheet::{self, SheetError};
use crate::types::Tenths;

/// A project sheet loaded for clocking in and out.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub path: PathBuf,
    pub project: Option<String>,
    pub rate: f64,
    /// Rounded hours of every day before today.
    pub finalized: Tenths,
    /// Unrounded seconds logged today.
    pub today_seconds: i64,
    /// Start marker not yet followed by a finished interval.
    pub pending_start: Option<DateTime<Utc>>,
}

impl Session {
    /// Reads the sheet at `path`, treating `today` as the day still in progress.
    pub fn load(path: &Path, default_rate: f64, today: NaiveDate) -> Result<Self, SheetError> {
        let mut acc = Accumulator::new(AccumulatorConfig::new(BucketKind::Day).with_rate(default_rate));
        let mut pending_start = None;

        acc.begin_source();
        sheet::for_each_line(path, |text| {
            if let Some(start) = recorder::parse_start_marker(text) {
                pending_start = Some(start);
                return Ok(());
            }
            let line = classify(text)?;
            if matches!(line, Line::Interval(TimeInterval::Absolute { .. })) {
                pending_start = None;
            }
            acc.apply(line, &mut Silent);
            Ok(())
        })?;

        let today_key = local_midnight(today);
        let today_seconds = if acc.open_bucket().is_some_and(|open| open.key == today_key) {
            acc.take_open().map_or(0, |open| open.seconds)
        } else {
            0
        };
        let rate = acc.rate();
        let project = acc.project().map(str::to_string);
        let totals = acc.finish(&mut Silent);

        tracing::debug!(
            path = %path.display(),
            finalized = %totals.total(),
            today_seconds,
            pending = pending_start.is_some(),
            "loaded session"
        );
        Ok(Self {
            path: path.to_path_buf(),
            project,
            rate,
            finalized: totals.total(),
            today_seconds,
            pending_start,
        })
    }

    pub const fn is_working(&self) -> bool {
        self.pending_start.is_some()
    }

    /// Seconds worked today, including a running session.
    pub fn live_seconds(&self, now: DateTime<Utc>) -> i64 {
        let running = self
            .pending_start
            .map_or(0, |start| (now - start).num_seconds().max(0));
        self.today_seconds + running
    }

    /// Total billable hours as of `now`.
    pub fn hours(&self, now: DateTime<Utc>) -> Tenths {
        self.finalized + Tenths::from_seconds(self.live_seconds(now))
    }

    pub fn cost(&self, now: DateTime<Utc>) -> f64 {
        self.hours(now).hours() * self.rate
    }

    /// Writes a start marker.
    pub fn clock_in(&mut self, now: DateTime<Utc>) -> Result<(), SheetError> {
        if let Some(since) = self.pending_start {
            return Err(SheetError::AlreadyClockedIn {
                path: self.path.clone(),
                since: since.with_timezone(&Local).format("%Y/%m/%d %H:%M:%S").to_string(),
            });
        }
        recorder::note_start(&self.path, now)?;
        self.pending_start = Some(now);
        Ok(())
    }

    /// Writes the finished interval for the running session.
    ///
    /// A clock earlier than the start marker closes the session with a
    /// zero-length interval. Returns the seconds logged.
    pub fn clock_out(&mut self, now: DateTime<Utc>) -> Result<i64, SheetError> {
        let Some(start) = self.pending_start else {
            return Err(SheetError::NotClockedIn {
                path: self.path.clone(),
            });
        };
        let stop = now.max(start);
        recorder::log_interval(&self.path, start, stop)?;
        let seconds = stop.timestamp() - start.timestamp();
        self.today_seconds += seconds;
        self.pending_start = None;
        Ok(seconds)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
    }

    fn sheet(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn earlier_days_are_rounded_today_is_not() {
        let file = sheet(
            "Project: Test\nRate: 50\n\
             2024/01/15 090000 -- 091000\n\
             2024/01/16 090000 -- 090400\n\
             2024/01/16 100000 -- 100400\n",
        );
        let session = Session::load(file.path(), 225.0, today()).unwrap();

        assert_eq!(session.project.as_deref(), Some("Test"));
        assert!((session.rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(session.finalized, Tenths::new(2));
        assert_eq!(session.today_seconds, 480);
        assert!(!session.is_working());
    }

    #[test]
    fn nothing_today_leaves_zero_seconds() {
        let file = sheet("2024/01/15 090000 -- 100000\n");
        let session = Session::load(file.path(), 225.0, today()).unwrap();
        assert_eq!(session.finalized, Tenths::new(10));
        assert_eq!(session.today_seconds, 0);
    }

    #[test]
    fn start_marker_is_pending_until_closed() {
        let file = sheet("2024/01/16 090000 -- Start\n");
        let session = Session::load(file.path(), 225.0, today()).unwrap();
        assert_eq!(session.pending_start, Some(local(2024, 1, 16, 9, 0)));

        let file = sheet("2024/01/16 090000 -- Start\n2024/01/16 090000 -- 100000 ( 1.0)\n");
        let session = Session::load(file.path(), 225.0, today()).unwrap();
        assert_eq!(session.pending_start, None);
        assert_eq!(session.today_seconds, 3600);
    }

    #[test]
    fn live_hours_include_running_session() {
        let file = sheet("Rate: 100\n2024/01/16 080000 -- 090000\n2024/01/16 100000 -- Start\n");
        let session = Session::load(file.path(), 225.0, today()).unwrap();
        let now = local(2024, 1, 16, 10, 30);

        assert_eq!(session.live_seconds(now), 5400);
        assert_eq!(session.hours(now), Tenths::new(15));
        assert!((session.cost(now) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn clock_in_then_out_writes_interval() {
        let file = sheet("Project: Test\n");
        let mut session = Session::load(file.path(), 225.0, today()).unwrap();
        let start = local(2024, 1, 16, 9, 0);

        session.clock_in(start).unwrap();
        assert!(session.is_working());
        let logged = session.clock_out(start + Duration::minutes(42)).unwrap();

        assert_eq!(logged, 2520);
        assert_eq!(session.today_seconds, 2520);
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "Project: Test\n2024/01/16 090000 -- Start\n2024/01/16 090000 -- 094200 ( 0.7)\n"
        );

        let reloaded = Session::load(file.path(), 225.0, today()).unwrap();
        assert_eq!(reloaded.pending_start, None);
        assert_eq!(reloaded.today_seconds, 2520);
    }

    #[test]
    fn zero_length_clock_out_closes_the_session() {
        let file = sheet("Project: Test\n");
        let start = local(2024, 1, 16, 9, 0);
        let mut session = Session::load(file.path(), 225.0, today()).unwrap();
        session.clock_in(start).unwrap();

        let mut reloaded = Session::load(file.path(), 225.0, today()).unwrap();
        assert_eq!(reloaded.clock_out(start).unwrap(), 0);

        let mut reloaded = Session::load(file.path(), 225.0, today()).unwrap();
        assert!(!reloaded.is_working());
        assert_eq!(reloaded.today_seconds, 0);
        let err = reloaded.clock_out(start + Duration::hours(8)).unwrap_err();
        assert!(matches!(err, SheetError::NotClockedIn { .. }));
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "Project: Test\n2024/01/16 090000 -- Start\n2024/01/16 090000 -- 090000 ( 0.0)\n"
        );
    }

    #[test]
    fn double_clock_in_is_refused() {
        let file = sheet("2024/01/16 090000 -- Start\n");
        let mut session = Session::load(file.path(), 225.0, today()).unwrap();
        let err = session.clock_in(local(2024, 1, 16, 10, 0)).unwrap_err();
        assert!(matches!(err, SheetError::AlreadyClockedIn { .. }));
    }

    #[test]
    fn clock_out_without_start_is_refused() {
        let file = sheet("");
        let mut session = Session::load(file.path(), 225.0, today()).unwrap();
        let err = session.clock_out(local(2024, 1, 16, 10, 0)).unwrap_err();
        assert!(matches!(err, SheetError::NotClockedIn { .. }));
    }
}
