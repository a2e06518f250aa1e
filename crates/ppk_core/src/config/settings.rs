//! On-disk settings, one TOML table per section.
//!
//! Every section is `#[serde(default)]`, so a file that predates a key still
//! loads and picks up the built-in value for it.

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};
use crate::matching::NavMatchPolicy;
use crate::rtkconf::{AntennaCatalog, AntennaDeltaTarget};

/// Everything stored in `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub logging: LoggingSettings,
    pub processing: ProcessingSettings,
    pub antenna: AntennaSettings,
}

/// `[paths]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Where `.pos` files go when the request names no directory. Empty: unset.
    pub output_directory: String,
    /// Working configuration copies.
    pub work_folder: String,
    /// Batch log files.
    pub logs_folder: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_directory: String::new(),
            work_folder: ".work".into(),
            logs_folder: ".logs".into(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Batch log threshold, also the console filter when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Solver output goes to the tail buffer instead of the log.
    pub compact: bool,
    /// Solver lines replayed after a failed run.
    pub error_tail: u32,
    pub show_timestamps: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: 20,
            show_timestamps: true,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            error_tail: self.error_tail as usize,
            show_timestamps: self.show_timestamps,
            ..LogConfig::default()
        }
    }
}

/// `[processing]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    pub nav_match_policy: NavMatchPolicy,
    /// Which `antNdelu` keys receive the antenna offset.
    pub antenna_delta_target: AntennaDeltaTarget,
    /// Copy the user's configuration to `<name>.bak` before the first mutation.
    pub backup_config: bool,
    /// Solver used when none is given. Empty: unset.
    pub executable: String,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            nav_match_policy: NavMatchPolicy::default(),
            antenna_delta_target: AntennaDeltaTarget::default(),
            backup_config: true,
            executable: String::new(),
        }
    }
}

/// `[antenna]` and `[antenna.types]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AntennaSettings {
    /// Model name to vertical offset in metres.
    pub types: AntennaCatalog,
    /// Model used when the command line names none.
    pub selected: Option<String>,
}

/// A top-level table of the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Processing,
    Antenna,
}

impl ConfigSection {
    const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Processing,
        ConfigSection::Antenna,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Paths => "paths",
            Self::Logging => "logging",
            Self::Processing => "processing",
            Self::Antenna => "antenna",
        }
    }

    /// File order.
    pub fn all() -> [ConfigSection; 4] {
        Self::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_every_table() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        assert!(text.contains("[paths]"));
        assert!(text.contains("[processing]"));
        assert!(text.contains("nav_match_policy = \"by_date\""));
        assert!(text.contains("\"EMLID RS2\" = -0.135"));

        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back.paths.work_folder, ".work");
        assert_eq!(back.antenna.types, Settings::default().antenna.types);
    }

    #[test]
    fn absent_keys_take_builtin_values() {
        let text = "[processing]\nnav_match_policy = \"filename_token\"\n\n[logging]\nerror_tail = 5";
        let parsed: Settings = toml::from_str(text).unwrap();
        assert_eq!(
            parsed.processing.nav_match_policy,
            NavMatchPolicy::FilenameToken
        );
        assert!(parsed.processing.backup_config);
        assert_eq!(parsed.logging.error_tail, 5);
        assert!(parsed.logging.compact);
        assert_eq!(parsed.paths.logs_folder, ".logs");
        assert_eq!(parsed.antenna.types.offset("FOIF A30"), Some(-0.088));
    }

    #[test]
    fn log_config_follows_logging_table() {
        let logging = LoggingSettings {
            compact: false,
            error_tail: 7,
            ..LoggingSettings::default()
        };
        let config = logging.to_log_config();
        assert!(!config.compact);
        assert_eq!(config.error_tail, 7);
    }
}
