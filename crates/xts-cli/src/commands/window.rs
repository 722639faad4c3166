//! `xts this-week` and `xts this-month`: hours inside one calendar window.
//!
//! The window defaults to the one containing today. A date given by option,
//! or as a positional argument between sheets, selects another window from
//! that point on. Hours are rounded once, over the whole window.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use xts_core::{Accumulator, AccumulatorConfig, BucketKind, Silent, WeekStart, Window};

use super::util::{SourceArg, classify_source, load_lenient, load_tasks, parse_date, parse_month};
use crate::Config;

/// Which calendar window to total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week(WeekStart),
    Month,
}

impl Period {
    pub fn window_of(self, date: NaiveDate) -> Window {
        match self {
            Self::Week(week_start) => Window::week_of(date, week_start),
            Self::Month => Window::month_of(date),
        }
    }

    fn selector(self, arg: &str) -> Option<NaiveDate> {
        match self {
            Self::Week(_) => parse_date(arg),
            Self::Month => parse_month(arg),
        }
    }

    fn write_header<W: Write>(self, writer: &mut W, window: &Window) -> Result<()> {
        match self {
            Self::Week(_) => {
                writeln!(writer, "Week begins: {}", window.first_day().format("%Y/%m/%d"))?;
            }
            Self::Month => {
                writeln!(writer, "Month begins: {}", window.first_day().format("%Y/%m/%d"))?;
                writeln!(writer, "Month ends: {}", window.end_day().format("%Y/%m/%d"))?;
            }
        }
        Ok(())
    }
}

fn accumulator(config: &Config, window: Window) -> Accumulator {
    Accumulator::new(
        AccumulatorConfig::new(BucketKind::Run)
            .with_rate(config.default_rate)
            .with_window(window),
    )
}

/// Runs a window report.
///
/// `selected` is the date from the command-line option, if any. Unreadable
/// sheets are skipped with a warning.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    period: Period,
    selected: Option<NaiveDate>,
    sources: &[String],
    today: NaiveDate,
) -> Result<()> {
    let mut window = period.window_of(selected.unwrap_or(today));
    // The current week is always announced, a month only when chosen.
    if selected.is_some() || matches!(period, Period::Week(_)) {
        period.write_header(writer, &window)?;
    }
    let mut acc = accumulator(config, window);

    for arg in sources {
        match classify_source(arg, |s| period.selector(s)) {
            SourceArg::TaskList => {
                for path in load_tasks(config)?.sheets() {
                    load_lenient(path, &mut acc, &mut Silent)?;
                }
            }
            SourceArg::Sheet(path) => load_lenient(path, &mut acc, &mut Silent)?,
            SourceArg::Selector(date) => {
                let next = period.window_of(date);
                match period {
                    // A different week starts the count over.
                    Period::Week(_) if next != window => acc = accumulator(config, next),
                    Period::Week(_) => {}
                    Period::Month => acc.set_window(next),
                }
                window = next;
                period.write_header(writer, &window)?;
            }
        }
    }

    let totals = acc.finish(&mut Silent);
    writeln!(writer, "{} Hours", totals.total())?;
    Ok(())
}
