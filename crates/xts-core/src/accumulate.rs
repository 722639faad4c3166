//! Hour accumulation over classified sheet lines.
//!
//! The accumulator is a small state machine. It starts with no bucket open;
//! the first dated interval opens a bucket keyed by its day (or month), and
//! every later interval with a different key closes the open bucket before
//! opening the next one. Closing a bucket rounds its seconds to tenths of an
//! hour and folds the result into the run totals, so a grand total is always
//! a sum of independently rounded buckets.
//!
//! Reports are produced through [`ReportSink`]: each tool hands the
//! accumulator whatever sink prints its own format.

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::Serialize;

use crate::calendar::{Window, first_of_month, local_date, midnight};
use crate::line::{Line, ParseError, TimeInterval, classify};
use crate::types::Tenths;

/// Hourly rate used until a sheet declares its own.
pub const DEFAULT_RATE: f64 = 225.0;

/// How intervals are partitioned into buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    /// One bucket per local calendar day.
    Day,
    /// One bucket per local calendar month.
    Month,
    /// A single bucket for the whole run.
    Run,
}

impl BucketKind {
    /// Bucket key for an instant, or `None` when the kind never splits.
    fn boundary(self, when: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Day => Some(midnight(when)),
            Self::Month => Some(first_of_month(when)),
            Self::Run => None,
        }
    }
}

/// A finalized bucket, as handed to a [`ReportSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub kind: BucketKind,
    /// Start of the bucket's period.
    pub key: DateTime<Utc>,
    pub tenths: Tenths,
    /// Rate in effect when the bucket was closed.
    pub rate: f64,
    pub project: Option<String>,
}

impl Bucket {
    /// Rate times hours.
    pub fn fee(&self) -> f64 {
        self.rate * self.tenths.hours()
    }

    /// Local date the bucket's period starts on.
    pub fn date(&self) -> chrono::NaiveDate {
        local_date(self.key)
    }

    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.date().weekday())
    }
}

/// Full English weekday name.
pub const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Receives report events as the accumulator produces them.
pub trait ReportSink {
    /// A bucket with a nonzero rounded total was closed.
    fn bucket(&mut self, _bucket: &Bucket) {}

    /// An invoice marker was reached. `amount` is what it moved to invoiced,
    /// `None` when nothing had accumulated since the previous invoice.
    fn invoice(&mut self, _amount: Option<Tenths>) {}
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ReportSink for Silent {}

/// Run totals, in tenths of an hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Finalized hours not yet covered by an invoice marker.
    pub uninvoiced: Tenths,
    /// Hours moved by invoice markers.
    pub invoiced: Tenths,
    /// Number of invoice markers seen.
    pub invoices: usize,
    /// Number of buckets reported.
    pub buckets: usize,
}

impl Totals {
    pub fn total(&self) -> Tenths {
        self.invoiced + self.uninvoiced
    }
}

/// Accumulator settings chosen by each report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorConfig {
    pub kind: BucketKind,
    pub default_rate: f64,
    /// Only intervals inside this window are counted.
    pub window: Option<Window>,
    /// Whether invoice markers split the totals.
    pub track_invoices: bool,
}

impl AccumulatorConfig {
    pub const fn new(kind: BucketKind) -> Self {
        Self {
            kind,
            default_rate: DEFAULT_RATE,
            window: None,
            track_invoices: false,
        }
    }

    #[must_use]
    pub const fn with_rate(mut self, rate: f64) -> Self {
        self.default_rate = rate;
        self
    }

    #[must_use]
    pub const fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    #[must_use]
    pub const fn with_invoices(mut self) -> Self {
        self.track_invoices = true;
        self
    }
}

/// The bucket currently collecting seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBucket {
    pub key: DateTime<Utc>,
    pub seconds: i64,
}

/// Per-source line counts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub lines: usize,
    pub intervals: usize,
    pub excluded: usize,
    pub unrecognized: usize,
}

/// Line-by-line hour accumulator.
#[derive(Debug, Clone)]
pub struct Accumulator {
    config: AccumulatorConfig,
    open: Option<OpenBucket>,
    /// Last midnight seen, used to place relative intervals.
    anchor: Option<DateTime<Utc>>,
    rate: f64,
    project: Option<String>,
    totals: Totals,
    stats: SourceStats,
}

impl Accumulator {
    pub const fn new(config: AccumulatorConfig) -> Self {
        Self {
            config,
            open: None,
            anchor: None,
            rate: config.default_rate,
            project: None,
            totals: Totals {
                uninvoiced: Tenths::ZERO,
                invoiced: Tenths::ZERO,
                invoices: 0,
                buckets: 0,
            },
            stats: SourceStats {
                lines: 0,
                intervals: 0,
                excluded: 0,
                unrecognized: 0,
            },
        }
    }

    /// Current hourly rate.
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Project name declared by the current source.
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub const fn totals(&self) -> &Totals {
        &self.totals
    }

    pub const fn open_bucket(&self) -> Option<&OpenBucket> {
        self.open.as_ref()
    }

    pub const fn stats(&self) -> &SourceStats {
        &self.stats
    }

    /// Replaces the window. Seconds already accumulated are kept.
    pub fn set_window(&mut self, window: Window) {
        if self.open.is_some_and(|bucket| bucket.seconds > 0) {
            tracing::warn!(%window, "window changed after hours were already accumulated");
        }
        self.config.window = Some(window);
    }

    /// Prepares for a new source: rate and project go back to defaults.
    pub fn begin_source(&mut self) {
        self.rate = self.config.default_rate;
        self.project = None;
        self.anchor = None;
        self.stats = SourceStats::default();
    }

    /// Closes out a source. Day and month buckets never span sources.
    pub fn end_source<S: ReportSink + ?Sized>(&mut self, sink: &mut S) {
        if self.config.kind != BucketKind::Run {
            self.finalize(sink);
        }
    }

    /// Classifies and applies one line.
    pub fn feed_line<S: ReportSink + ?Sized>(
        &mut self,
        line: &str,
        sink: &mut S,
    ) -> Result<(), ParseError> {
        let classified = classify(line)?;
        match classified {
            Line::Rate(None) => {
                tracing::warn!(line = line.trim_end(), rate = self.rate, "unparseable rate, keeping current rate");
            }
            Line::Unrecognized => tracing::trace!(line = line.trim_end(), "skipping unrecognized line"),
            _ => {}
        }
        self.apply(classified, sink);
        Ok(())
    }

    /// Applies one classified line.
    pub fn apply<S: ReportSink + ?Sized>(&mut self, line: Line, sink: &mut S) {
        self.stats.lines += 1;
        match line {
            Line::Rate(Some(rate)) => self.rate = rate,
            Line::Project(name) if name.is_empty() => {}
            Line::Project(name) => self.project = Some(name),
            Line::Invoice if self.config.track_invoices => self.invoice(sink),
            Line::Rate(None) | Line::Invoice => {}
            Line::Interval(interval) => self.add_interval(interval, sink),
            Line::Unrecognized => self.stats.unrecognized += 1,
        }
    }

    /// Applies an already-decoded interval.
    pub fn add_interval<S: ReportSink + ?Sized>(&mut self, interval: TimeInterval, sink: &mut S) {
        if let Some(day) = interval.midnight() {
            self.anchor = Some(day);
        }
        let Some(anchor) = self.anchor else {
            tracing::warn!(?interval, "relative interval before any date, dropping it");
            self.stats.excluded += 1;
            return;
        };
        let (start, stop) = interval.anchored(anchor);

        if self.config.window.is_some_and(|window| !window.contains(start, stop)) {
            tracing::trace!(%start, %stop, "interval outside window");
            self.stats.excluded += 1;
            return;
        }

        let boundary = self.config.kind.boundary(start);
        let crossed = boundary.is_some_and(|key| self.open.is_some_and(|bucket| bucket.key != key));
        if crossed && !interval.is_relative() {
            self.finalize(sink);
        }

        let key = boundary
            .or_else(|| self.config.window.map(|w| w.begin))
            .unwrap_or(anchor);
        let bucket = self.open.get_or_insert(OpenBucket { key, seconds: 0 });
        bucket.seconds += (stop - start).num_seconds();
        self.stats.intervals += 1;
    }

    /// Closes the open bucket, if any, into the totals.
    pub fn finalize<S: ReportSink + ?Sized>(&mut self, sink: &mut S) {
        let Some(open) = self.open.take() else {
            return;
        };
        let tenths = Tenths::from_seconds(open.seconds);
        if tenths.is_zero() {
            return;
        }
        self.totals.uninvoiced += tenths;
        self.totals.buckets += 1;
        sink.bucket(&Bucket {
            kind: self.config.kind,
            key: open.key,
            tenths,
            rate: self.rate,
            project: self.project.clone(),
        });
    }

    /// Removes the open bucket without counting it.
    pub fn take_open(&mut self) -> Option<OpenBucket> {
        self.open.take()
    }

    fn invoice<S: ReportSink + ?Sized>(&mut self, sink: &mut S) {
        self.finalize(sink);
        let amount = self.totals.uninvoiced;
        self.totals.invoiced += amount;
        self.totals.uninvoiced = Tenths::ZERO;
        self.totals.invoices += 1;
        sink.invoice((!amount.is_zero()).then_some(amount));
    }

    /// Closes whatever is still open and returns the run totals.
    pub fn finish<S: ReportSink + ?Sized>(mut self, sink: &mut S) -> Totals {
        self.finalize(sink);
        self.totals
    }
}
