//! Solution quality statistics from RTKLIB `.pos` output.
//!
//! After the `%`-prefixed header, each solution line carries the quality
//! flag in whitespace column 5 (0-based). The statistics are the share of
//! epochs per flag, over epochs with a readable flag.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column holding the quality flag.
const QUALITY_COLUMN: usize = 5;

/// Errors raised while reading a solution file.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Failed to read solution file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for statistics operations.
pub type StatsResult<T> = Result<T, StatsError>;

/// RTKLIB solution quality flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityCode {
    Fix,
    Float,
    Sbas,
    Dgps,
    Single,
    Ppp,
}

impl QualityCode {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Fix),
            2 => Some(Self::Float),
            3 => Some(Self::Sbas),
            4 => Some(Self::Dgps),
            5 => Some(Self::Single),
            6 => Some(Self::Ppp),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Fix => 1,
            Self::Float => 2,
            Self::Sbas => 3,
            Self::Dgps => 4,
            Self::Single => 5,
            Self::Ppp => 6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fix => "Fix",
            Self::Float => "Float",
            Self::Sbas => "SBAS",
            Self::Dgps => "DGPS",
            Self::Single => "Single",
            Self::Ppp => "PPP",
        }
    }
}

impl fmt::Display for QualityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} ({})", self.code(), self.label())
    }
}

/// Per-code epoch counts of one solution file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityStatistics {
    counts: BTreeMap<u32, usize>,
    total: usize,
}

impl QualityStatistics {
    /// Tally a solution file.
    ///
    /// `Ok(None)` when the file holds no data line or no readable flag.
    pub fn compute(path: impl AsRef<Path>) -> StatsResult<Option<Self>> {
        let path = path.as_ref();
        let io_err = |source| StatsError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let stats = Self::from_reader(BufReader::new(file)).map_err(io_err)?;
        if stats.is_none() {
            tracing::warn!("No valid quality data found in {}", path.display());
        }
        Ok(stats)
    }

    /// Tally solution content from any reader.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Option<Self>> {
        let mut stats = Self::default();

        for line in reader.lines() {
            let line = line?;
            if line.starts_with('%') || line.trim().is_empty() {
                continue;
            }
            let Some(field) = line.split_whitespace().nth(QUALITY_COLUMN) else {
                continue;
            };
            if !field.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Ok(code) = field.parse::<u32>() {
                *stats.counts.entry(code).or_insert(0) += 1;
                stats.total += 1;
            }
        }

        Ok((stats.total > 0).then_some(stats))
    }

    /// Epochs with a readable flag.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, code: u32) -> usize {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    /// Share of epochs with `code`, in percent. Absent codes give 0.
    pub fn percentage(&self, code: u32) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(code) as f64 / self.total as f64 * 100.0
    }

    /// Percentages of every code seen, ascending by code.
    pub fn percentages(&self) -> BTreeMap<u32, f64> {
        self.counts
            .keys()
            .map(|&code| (code, self.percentage(code)))
            .collect()
    }
}

/// One row of the statistics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRow")]
pub struct StatisticsRow {
    pub file: String,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub q4: f64,
    pub q5: f64,
}

/// A row as found in project files. Older projects kept the first two
/// percentage columns as `status` and `processing_time` text.
#[derive(Deserialize)]
struct StoredRow {
    file: String,
    q1: Option<f64>,
    q2: Option<f64>,
    q3: Option<f64>,
    q4: Option<f64>,
    q5: Option<f64>,
    status: Option<StoredCell>,
    processing_time: Option<StoredCell>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCell {
    Number(f64),
    Text(String),
}

impl StoredCell {
    fn percentage(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().trim_end_matches('%').trim_end().parse().ok(),
        }
    }
}

impl From<StoredRow> for StatisticsRow {
    fn from(row: StoredRow) -> Self {
        let legacy = |cell: &Option<StoredCell>| cell.as_ref().and_then(StoredCell::percentage);
        Self {
            q1: row.q1.or_else(|| legacy(&row.status)).unwrap_or(0.0),
            q2: row.q2.or_else(|| legacy(&row.processing_time)).unwrap_or(0.0),
            q3: row.q3.unwrap_or(0.0),
            q4: row.q4.unwrap_or(0.0),
            q5: row.q5.unwrap_or(0.0),
            file: row.file,
        }
    }
}

impl StatisticsRow {
    /// Project codes 1..=5 of `stats` for the output file named `file`.
    pub fn from_stats(file: impl Into<String>, stats: &QualityStatistics) -> Self {
        Self {
            file: file.into(),
            q1: stats.percentage(1),
            q2: stats.percentage(2),
            q3: stats.percentage(3),
            q4: stats.percentage(4),
            q5: stats.percentage(5),
        }
    }

    pub fn values(&self) -> [f64; 5] {
        [self.q1, self.q2, self.q3, self.q4, self.q5]
    }

    /// Columns formatted with 2 decimals.
    pub fn formatted(&self) -> [String; 5] {
        self.values().map(|v| format!("{:.2}", v))
    }

    pub fn header() -> [&'static str; 6] {
        ["File", "q1 (%)", "q2 (%)", "q3 (%)", "q4 (%)", "q5 (%)"]
    }
}

impl fmt::Display for StatisticsRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        for value in self.formatted() {
            write!(f, "\t{}", value)?;
        }
        Ok(())
    }
}
