use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use xts_cli::commands::report::OutputFormat;
use xts_cli::commands::util::{require_date, require_month, resolve_sheet};
use xts_cli::commands::window::Period;
use xts_cli::commands::{clock, new, report, status, tasks, total, window};
use xts_cli::{Cli, Commands, Config};
use xts_core::BucketKind;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::ByDay { format, files }) => {
            let format = OutputFormat::from_flags(format.latex, format.json);
            report::run(&mut out, &config, BucketKind::Day, files, format)?;
        }
        Some(Commands::ByMonth { format, files }) => {
            let format = OutputFormat::from_flags(format.latex, format.json);
            report::run(&mut out, &config, BucketKind::Month, files, format)?;
        }
        Some(Commands::ThisWeek { date, sources }) => {
            let selected = date.as_deref().map(require_date).transpose()?;
            let period = Period::Week(config.week_start);
            window::run(&mut out, &config, period, selected, sources, Local::now().date_naive())?;
        }
        Some(Commands::ThisMonth { month, sources }) => {
            let selected = month.as_deref().map(require_month).transpose()?;
            window::run(&mut out, &config, Period::Month, selected, sources, Local::now().date_naive())?;
        }
        Some(Commands::Total { sources }) => {
            total::run(&mut out, &config, sources)?;
        }
        Some(Commands::New { project, rate, dir }) => {
            new::run(&mut out, project, rate, dir.as_deref())?;
        }
        Some(Commands::Start { sheet }) => {
            let path = resolve_sheet(sheet, &config)?;
            clock::start(&mut out, &config, &path, Utc::now())?;
        }
        Some(Commands::Stop { sheet }) => {
            let path = resolve_sheet(sheet, &config)?;
            clock::stop(&mut out, &config, &path, Utc::now())?;
        }
        Some(Commands::Status { sheet, json }) => {
            let path = resolve_sheet(sheet, &config)?;
            status::run(&mut out, &config, &path, *json, Utc::now())?;
        }
        Some(Commands::Tasks) => {
            tasks::run(&mut out, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}
