//! Levels, batch log settings and line markers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity threshold, ordered from most to least verbose.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive for `EnvFilter`, also the serialized name.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            other => return Err(format!("Unknown log level: {}", other)),
        };
        Ok(level)
    }
}

/// How a [`BatchLogger`](super::BatchLogger) filters and decorates lines.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Solver output only reaches the tail buffer; progress is logged in steps.
    pub compact: bool,
    /// Percentage between progress lines in compact mode. 0 logs every rover.
    pub progress_step: u32,
    /// Solver lines retained for replay after a failure.
    pub error_tail: usize,
    /// `[HH:MM:SS]` prefix.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: 20,
            error_tail: 20,
            show_timestamps: true,
        }
    }
}

/// Destination for every formatted batch line, typically the event channel.
pub type LogSink = Box<dyn Fn(&str) + Send + Sync>;

/// Marker put in front of a batch log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    Command,
    Phase,
    Success,
    Warning,
    Error,
    Skip,
    None,
}

impl MessagePrefix {
    pub fn format(&self, message: &str) -> String {
        let tag = match self {
            Self::Phase => return format!("=== {} ===", message),
            Self::None => return message.to_string(),
            Self::Command => "$",
            Self::Success => "[SUCCESS]",
            Self::Warning => "[WARNING]",
            Self::Error => "[ERROR]",
            Self::Skip => "[SKIP]",
        };
        format!("{} {}", tag, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_leniently() {
        assert_eq!(" Warning ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Debug < LogLevel::Warn);
    }

    #[test]
    fn prefixes() {
        assert_eq!(MessagePrefix::Phase.format("Batch"), "=== Batch ===");
        assert_eq!(MessagePrefix::Command.format("rnx2rtkp"), "$ rnx2rtkp");
        assert_eq!(MessagePrefix::Skip.format("no base"), "[SKIP] no base");
        assert_eq!(MessagePrefix::None.format("plain"), "plain");
    }
}
