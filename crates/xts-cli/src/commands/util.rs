//! Shared utilities for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use xts_core::sheet::{self, SheetError};
use xts_core::{Accumulator, ProjectIndex, ReportSink, TaskList};

use crate::Config;

/// `YYYYMMDD` or `YYYY/MM/DD`.
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(?:(\d{2})(\d{2})|/(\d{2})/(\d{2}))$").unwrap());

/// `YYYYMM` or `YYYY/MM`.
static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})/?(\d{2})$").unwrap());

/// Parses a day selector.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(s.trim())?;
    let year = caps[1].parse().ok()?;
    let month = caps.get(2).or_else(|| caps.get(4))?.as_str().parse().ok()?;
    let day = caps.get(3).or_else(|| caps.get(5))?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses a month selector, returning the first of the month.
///
/// Full dates are accepted too and select the month they fall in.
pub fn parse_month(s: &str) -> Option<NaiveDate> {
    if let Some(date) = parse_date(s) {
        return date.with_day0(0);
    }
    let caps = MONTH_RE.captures(s.trim())?;
    NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 1)
}

/// Like [`parse_date`], for a required option value.
pub fn require_date(s: &str) -> Result<NaiveDate> {
    parse_date(s).with_context(|| format!("invalid date: {s}. Use YYYYMMDD or YYYY/MM/DD"))
}

/// Like [`parse_month`], for a required option value.
pub fn require_month(s: &str) -> Result<NaiveDate> {
    parse_month(s).with_context(|| format!("invalid month: {s}. Use YYYYMM, YYYY/MM or a full date"))
}

/// What a positional source argument refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceArg<'a> {
    /// `%`: every sheet in the task list.
    TaskList,
    /// A date selecting a different reporting window.
    Selector(NaiveDate),
    Sheet(&'a Path),
}

/// Classifies a source argument. An existing file always wins over a selector.
pub fn classify_source<F>(arg: &str, selector: F) -> SourceArg<'_>
where
    F: Fn(&str) -> Option<NaiveDate>,
{
    let path = Path::new(arg);
    if arg == "%" {
        SourceArg::TaskList
    } else if path.exists() {
        SourceArg::Sheet(path)
    } else {
        selector(arg).map_or(SourceArg::Sheet(path), SourceArg::Selector)
    }
}

/// Loads the configured task list.
pub fn load_tasks(config: &Config) -> Result<TaskList> {
    TaskList::load(&config.task_list)
        .with_context(|| format!("failed to read task list {}", config.task_list.display()))
}

/// Loads a sheet, warning about and skipping one that cannot be read.
pub fn load_lenient<S: ReportSink + ?Sized>(path: &Path, acc: &mut Accumulator, sink: &mut S) -> Result<()> {
    match sheet::load(path, acc, sink) {
        Ok(()) => Ok(()),
        Err(err @ SheetError::Read { .. }) => {
            tracing::warn!(error = %err, "skipping sheet");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Finds a sheet by path, or by project name in the task list.
pub fn resolve_sheet(arg: &str, config: &Config) -> Result<PathBuf> {
    let path = Path::new(arg);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    let index = ProjectIndex::build(&load_tasks(config)?);
    match index.lookup(arg) {
        Some(found) => {
            tracing::debug!(project = arg, path = %found.display(), "resolved project");
            Ok(found.to_path_buf())
        }
        None => bail!("no sheet or project named {arg}"),
    }
}
