//! `xts new`: create a sheet for a new project.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use xts_core::parse_rate;
use xts_core::recorder::create_sheet;

pub fn run<W: Write>(writer: &mut W, project: &str, rate: &str, dir: Option<&Path>) -> Result<()> {
    let project = project.trim();
    parse_rate(rate)?;
    let dir = dir.unwrap_or_else(|| Path::new("."));

    let path = create_sheet(dir, project, rate.trim())
        .with_context(|| format!("failed to create a sheet for {project}"))?;

    writeln!(writer, "Created {}", path.display())?;
    Ok(())
}
