//! Configuration management for the PPK batch processor.
//!
//! This module provides:
//! - TOML-based settings with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults filled in and written back on load
//! - The small `config.json` recent-state file
//!
//! # Example
//!
//! ```no_run
//! use ppk_core::config::{ConfigManager, ConfigSection};
//! use ppk_core::matching::NavMatchPolicy;
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Logs folder: {}", config.settings().paths.logs_folder);
//!
//! config.settings_mut().processing.nav_match_policy = NavMatchPolicy::FilenameToken;
//! config.update_section(ConfigSection::Processing).unwrap();
//! ```

mod manager;
mod recent;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult, DEFAULT_SETTINGS_PATH};
pub use recent::{RecentState, RECENT_STATE_FILE};
pub use settings::{
    AntennaSettings, ConfigSection, LoggingSettings, PathSettings, ProcessingSettings, Settings,
};
