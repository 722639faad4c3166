//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use xts_core::{DEFAULT_RATE, WeekStart};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Hourly rate for sheets that declare none.
    pub default_rate: f64,

    /// File listing every sheet, one path per line.
    pub task_list: PathBuf,

    /// First day of the week for `this-week`.
    pub week_start: WeekStart,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_rate: DEFAULT_RATE,
            task_list: default_task_list(),
            week_start: WeekStart::default(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // XTS_DEFAULT_RATE, XTS_TASK_LIST, XTS_WEEK_START
        figment = figment.merge(Env::prefixed("XTS_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for xts.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("xts"))
}

/// `~/.xtimesheet`, or a relative `.xtimesheet` when there is no home.
fn default_task_list() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".xtimesheet"), |home| home.join(".xtimesheet"))
}
