//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Plain-text timesheets.
///
/// Totals hours logged in timesheet files by day, week or month, and clocks
/// in and out of a project's sheet.
#[derive(Debug, Parser)]
#[command(name = "xts", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format flags shared by the bucketed reports.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct FormatArgs {
    /// Emit one `\Fee{..}` LaTeX line per bucket.
    #[arg(short, long, conflicts_with = "json")]
    pub latex: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Hours worked per day.
    ByDay {
        #[command(flatten)]
        format: FormatArgs,

        /// Timesheet files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Hours worked per month, split at invoice markers.
    ByMonth {
        #[command(flatten)]
        format: FormatArgs,

        /// Timesheet files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Hours worked this week.
    ThisWeek {
        /// Any day of the week to total (YYYYMMDD or YYYY/MM/DD).
        #[arg(short, long)]
        date: Option<String>,

        /// Timesheet files, `%` for every sheet in the task list, or a date
        /// selecting a different week.
        sources: Vec<String>,
    },

    /// Hours worked this month.
    ThisMonth {
        /// Month to total (YYYYMM, YYYYMMDD or YYYY/MM).
        #[arg(short, long)]
        month: Option<String>,

        /// Timesheet files, `%` for every sheet in the task list, or a month
        /// selector.
        sources: Vec<String>,
    },

    /// All hours ever logged, and those since the last invoice.
    Total {
        /// Timesheet files, or `%` for every sheet in the task list.
        sources: Vec<String>,
    },

    /// Create a sheet for a new project.
    New {
        /// Project name.
        #[arg(short, long)]
        project: String,

        /// Hourly rate.
        #[arg(short, long)]
        rate: String,

        /// Directory for the new sheet (defaults to the current directory).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Clock in to a sheet.
    Start {
        /// Sheet path or project name from the task list.
        sheet: String,
    },

    /// Clock out of a sheet, logging the time since clocking in.
    Stop {
        /// Sheet path or project name from the task list.
        sheet: String,
    },

    /// Show a sheet's project, rate, hours and cost.
    Status {
        /// Sheet path or project name from the task list.
        sheet: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the projects in the task list.
    Tasks,
}
