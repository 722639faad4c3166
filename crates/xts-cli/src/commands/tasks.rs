//! `xts tasks`: the projects named in the task list.

use std::io::Write;

use anyhow::Result;
use xts_core::ProjectIndex;

use super::util::load_tasks;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let tasks = load_tasks(config)?;
    let index = ProjectIndex::build(&tasks);

    if index.is_empty() {
        writeln!(writer, "No sheets in {}", config.task_list.display())?;
        return Ok(());
    }

    let width = index.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0);
    for (name, path) in index.iter() {
        writeln!(writer, "{name:<width$}  {}", path.display())?;
    }
    Ok(())
}
