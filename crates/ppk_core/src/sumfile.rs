//! Base station coordinates from survey summary (`.sum`) files.
//!
//! A `.sum` report carries the adjusted IGS20 position of a base station as
//! DMS latitude/longitude and an ellipsoidal height. The acquisition date is
//! taken from the first 8-digit run in the file name.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::observation::date_from_filename;
use crate::rtkconf::BaseCoordinates;

const LAT_LABEL: &str = "POS LAT IGS20";
const LON_LABEL: &str = "POS LON IGS20";
const HGT_LABEL: &str = "POS HGT IGS20";

/// Errors raised while reading a summary file.
#[derive(Error, Debug)]
pub enum SumFileError {
    #[error("Failed to read summary file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for summary file operations.
pub type SumFileResult<T> = Result<T, SumFileError>;

/// Degrees, minutes, seconds to decimal degrees.
///
/// A negative degree value (including `-0`) makes the whole angle negative.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    let fraction = minutes / 60.0 + seconds / 3600.0;
    if degrees.is_sign_negative() {
        degrees - fraction
    } else {
        degrees + fraction
    }
}

/// `YYYYMMDD` → `YYYY-MM-DD`; anything else is returned unchanged.
pub fn format_date(date: &str) -> String {
    if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..])
    } else {
        date.to_string()
    }
}

/// Position parsed from one summary file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SumFileCoordinates {
    pub path: PathBuf,
    pub date: Option<String>,
    pub latitude_dd: Option<f64>,
    pub longitude_dd: Option<f64>,
    pub elevation_m: Option<f64>,
    /// Height token as written in the file, used verbatim in the configuration.
    #[serde(skip)]
    pub elevation_text: Option<String>,
}

impl SumFileCoordinates {
    /// Parse a summary file. Unparseable fields are logged and left empty.
    pub fn parse(path: impl AsRef<Path>) -> SumFileResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SumFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut coords =
            Self::from_reader(BufReader::new(file)).map_err(|source| SumFileError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        coords.path = path.to_path_buf();
        coords.date = path
            .file_stem()
            .and_then(|stem| date_from_filename(&stem.to_string_lossy()));
        Ok(coords)
    }

    /// Parse summary content; path and date are left empty.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut coords = Self::default();

        for line in reader.lines() {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();

            if line.contains(LAT_LABEL) {
                coords.latitude_dd = dms_fields(&fields);
                if coords.latitude_dd.is_none() {
                    tracing::warn!("Could not extract latitude from '{}'", line.trim());
                }
            } else if line.contains(LON_LABEL) {
                coords.longitude_dd = dms_fields(&fields);
                if coords.longitude_dd.is_none() {
                    tracing::warn!("Could not extract longitude from '{}'", line.trim());
                }
            } else if line.contains(HGT_LABEL) {
                let token = fields.get(5).filter(|f| f.parse::<f64>().is_ok());
                coords.elevation_m = token.and_then(|f| f.parse().ok());
                coords.elevation_text = token.map(|f| f.to_string());
                if coords.elevation_m.is_none() {
                    tracing::warn!("Could not extract height from '{}'", line.trim());
                }
            }
        }

        Ok(coords)
    }

    pub fn is_complete(&self) -> bool {
        self.latitude_dd.is_some() && self.longitude_dd.is_some() && self.elevation_m.is_some()
    }

    /// Configuration values, when all three components were found.
    ///
    /// Latitude and longitude are converted from DMS; the height is copied
    /// from the file unchanged.
    pub fn base_coordinates(&self) -> Option<BaseCoordinates> {
        let mut coords =
            BaseCoordinates::from_decimal(self.latitude_dd?, self.longitude_dd?, self.elevation_m?);
        if let Some(text) = &self.elevation_text {
            coords.height = text.clone();
        }
        Some(coords)
    }
}

fn dms_fields(fields: &[&str]) -> Option<f64> {
    let degrees: f64 = fields.get(7)?.parse().ok()?;
    let minutes: f64 = fields.get(8)?.parse().ok()?;
    let seconds: f64 = fields.get(9)?.parse().ok()?;
    Some(dms_to_decimal(degrees, minutes, seconds))
}

/// Summary coordinates keyed by acquisition date.
#[derive(Debug, Clone, Default)]
pub struct SumFileIndex {
    entries: Vec<SumFileCoordinates>,
    by_date: HashMap<String, usize>,
}

impl SumFileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every path. Unreadable files are logged and left out.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut index = Self::new();
        for path in paths {
            match SumFileCoordinates::parse(path.as_ref()) {
                Ok(coords) => {
                    index.insert(coords);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }
        index
    }

    /// Add an entry. Returns false when its date was already indexed.
    pub fn insert(&mut self, coords: SumFileCoordinates) -> bool {
        let first_for_date = match coords.date.clone() {
            Some(date) if !self.by_date.contains_key(&date) => {
                self.by_date.insert(date, self.entries.len());
                true
            }
            Some(date) => {
                tracing::debug!(
                    "{} shares date {} with an earlier summary, ignoring",
                    coords.path.display(),
                    date
                );
                false
            }
            None => {
                tracing::warn!("No date in summary file name {}", coords.path.display());
                false
            }
        };
        self.entries.push(coords);
        first_for_date
    }

    /// Complete coordinates for `date`.
    pub fn lookup(&self, date: &str) -> Option<BaseCoordinates> {
        let index = *self.by_date.get(date)?;
        self.entries[index].base_coordinates()
    }

    pub fn get(&self, date: &str) -> Option<&SumFileCoordinates> {
        self.by_date.get(date).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SumFileCoordinates> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    const SUM: &str = "\
POS LAT IGS20 24:166:00000 A 48.1234568 0.0012 48 07 24.4444 0.0012\n\
POS LON IGS20 24:166:00000 A -1.6766667 0.0010 -1 40 36.0000 0.0010\n\
POS HGT IGS20 24:166:00000 A 72.3456 0.0021\n";

    #[test]
    fn dms_conversion() {
        let dd = dms_to_decimal(48.0, 7.0, 24.4444);
        assert!((dd - 48.123456777).abs() < 1e-8);
        assert!((dms_to_decimal(-1.0, 30.0, 0.0) + 1.5).abs() < 1e-12);
        assert!((dms_to_decimal(-0.0, 30.0, 0.0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn parses_positions() {
        let coords = SumFileCoordinates::from_reader(Cursor::new(SUM)).unwrap();
        assert!((coords.latitude_dd.unwrap() - 48.123456777).abs() < 1e-8);
        assert!((coords.longitude_dd.unwrap() + 1.676666667).abs() < 1e-8);
        assert_eq!(coords.elevation_m, Some(72.3456));
        assert!(coords.is_complete());

        let base = coords.base_coordinates().unwrap();
        assert_eq!(base.latitude, "48.123456778");
        assert_eq!(base.height, "72.3456");
    }

    #[test]
    fn height_keeps_file_precision() {
        let content = SUM.replace("72.3456 0.0021", "72.345678 0.0021");
        let coords = SumFileCoordinates::from_reader(Cursor::new(content)).unwrap();
        assert_eq!(coords.elevation_m, Some(72.345678));
        assert_eq!(coords.base_coordinates().unwrap().height, "72.345678");
    }

    #[test]
    fn bad_fields_are_left_empty() {
        let content = "POS LAT IGS20 too short\nPOS HGT IGS20 x y z w\n";
        let coords = SumFileCoordinates::from_reader(Cursor::new(content)).unwrap();
        assert!(coords.latitude_dd.is_none());
        assert!(coords.elevation_m.is_none());
        assert!(coords.base_coordinates().is_none());
    }

    #[test]
    fn index_is_keyed_by_filename_date() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("BASE_20240615.sum");
        let second = dir.path().join("OTHER_20240615.sum");
        fs::write(&first, SUM).unwrap();
        fs::write(&second, SUM.replace("72.3456", "10.0")).unwrap();

        let index = SumFileIndex::from_paths([&first, &second]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("20240615").unwrap().height, "72.3456");
        assert!(index.lookup("20240616").is_none());
        assert_eq!(index.get("20240615").unwrap().path, first);
    }

    #[test]
    fn date_display() {
        assert_eq!(format_date("20240615"), "2024-06-15");
        assert_eq!(format_date("2024"), "2024");
    }
}
