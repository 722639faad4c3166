//! Status command for showing a sheet's running totals.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use xts_core::{Session, Tenths};

use crate::Config;

#[derive(Debug, Serialize)]
pub struct JsonStatus {
    pub path: String,
    pub project: Option<String>,
    pub rate: f64,
    pub hours: f64,
    pub cost: f64,
    pub today_hours: f64,
    pub working_since: Option<String>,
}

/// Formats the human-readable status.
pub fn format_status(session: &Session, now: DateTime<Utc>) -> String {
    let mut output = String::new();
    let project = session.project.as_deref().unwrap_or("(unnamed)");
    writeln!(output, "Project: {project}").unwrap();
    writeln!(output, "Sheet:   {}", session.path.display()).unwrap();
    writeln!(output, "Rate:    {:.2}", session.rate).unwrap();
    writeln!(output, "Hours:   {}", session.hours(now)).unwrap();
    writeln!(output, "Cost:    {:.2}", session.cost(now)).unwrap();
    writeln!(output, "Today:   {}", Tenths::from_seconds(session.live_seconds(now))).unwrap();
    match session.pending_start {
        Some(start) => writeln!(
            output,
            "Working since {}",
            start.with_timezone(&Local).format("%H:%M:%S")
        )
        .unwrap(),
        None => writeln!(output, "Not clocked in").unwrap(),
    }
    output
}

pub fn format_status_json(session: &Session, now: DateTime<Utc>) -> Result<String> {
    let status = JsonStatus {
        path: session.path.display().to_string(),
        project: session.project.clone(),
        rate: session.rate,
        hours: session.hours(now).hours(),
        cost: session.cost(now),
        today_hours: Tenths::from_seconds(session.live_seconds(now)).hours(),
        working_since: session.pending_start.map(|start| start.to_rfc3339()),
    };
    Ok(serde_json::to_string_pretty(&status)?)
}

pub fn run<W: Write>(writer: &mut W, config: &Config, sheet: &Path, json: bool, now: DateTime<Utc>) -> Result<()> {
    let session = Session::load(sheet, config.default_rate, now.with_timezone(&Local).date_naive())
        .with_context(|| format!("failed to load {}", sheet.display()))?;

    if json {
        writeln!(writer, "{}", format_status_json(&session, now)?)?;
    } else {
        write!(writer, "{}", format_status(&session, now))?;
    }
    Ok(())
}
