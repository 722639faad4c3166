//! Timesheet CLI library.
//!
//! This crate provides the CLI interface for the timesheet tools.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, FormatArgs};
pub use config::Config;
