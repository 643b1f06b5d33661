//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tl_core::{DEFAULT_CHECKPOINT_INTERVAL_SECS, TrackerOptions};

/// Directory name used under the platform config and data directories.
const APP_DIR: &str = "timeline";

/// Database file name.
const DB_FILE: &str = "records.db";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Seconds between checkpoint writes of a running session.
    pub checkpoint_interval_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join(DB_FILE),
            checkpoint_interval_secs: DEFAULT_CHECKPOINT_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from default locations, optionally layering a specific file on top.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TIMELINE_*)
        figment = figment.merge(Env::prefixed("TIMELINE_"));

        figment.extract()
    }

    /// Session controller options derived from this configuration.
    pub const fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            checkpoint_interval_secs: self.checkpoint_interval_secs,
        }
    }
}

/// Returns the platform-specific config directory for the tracker.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Returns the platform-specific data directory for the tracker.
///
/// On Linux: `~/.local/share/timeline`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(APP_DIR))
}
