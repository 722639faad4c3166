//! `xts start` and `xts stop`: clocking in and out of a sheet.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use xts_core::{Session, Tenths};

use crate::Config;

fn project_label(session: &Session) -> String {
    session
        .project
        .clone()
        .unwrap_or_else(|| session.path.display().to_string())
}

/// Writes a start marker to the sheet.
pub fn start<W: Write>(writer: &mut W, config: &Config, sheet: &Path, now: DateTime<Utc>) -> Result<()> {
    let mut session = Session::load(sheet, config.default_rate, now.with_timezone(&Local).date_naive())
        .with_context(|| format!("failed to load {}", sheet.display()))?;
    session.clock_in(now)?;

    writeln!(
        writer,
        "Clocked in to {} at {}",
        project_label(&session),
        now.with_timezone(&Local).format("%H:%M:%S")
    )?;
    Ok(())
}

/// Logs the interval since the start marker.
pub fn stop<W: Write>(writer: &mut W, config: &Config, sheet: &Path, now: DateTime<Utc>) -> Result<()> {
    let mut session = Session::load(sheet, config.default_rate, now.with_timezone(&Local).date_naive())
        .with_context(|| format!("failed to load {}", sheet.display()))?;
    let logged = session.clock_out(now)?;

    writeln!(
        writer,
        "Clocked out of {}: {} hours this session, {} today",
        project_label(&session),
        Tenths::from_seconds(logged),
        Tenths::from_seconds(session.today_seconds)
    )?;
    Ok(())
}
