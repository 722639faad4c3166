//! CLI subcommand implementations.

pub mod clock;
pub mod new;
pub mod report;
pub mod status;
pub mod tasks;
pub mod total;
pub mod util;
pub mod window;
