//! Line-level rewriting of `key=value` configuration text.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::antenna::{format_offset, AntennaDeltaTarget};
use super::{RtkConfError, RtkConfResult, DEFAULT_KEYS, RECOGNIZED_KEYS};

/// Column at which the `=` of a rewritten position line sits.
const KEY_WIDTH: usize = 19;

/// Ordered map of recognized keys to replacement values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigOverrides {
    values: BTreeMap<String, String>,
}

impl ConfigOverrides {
    /// Empty map: nothing gets rewritten.
    pub fn new() -> Self {
        Self::default()
    }

    /// Antenna heights and `ant1-antdelu` seeded with `"0.0"`.
    pub fn with_defaults() -> Self {
        let mut overrides = Self::new();
        for key in DEFAULT_KEYS {
            overrides.values.insert(key.to_string(), "0.0".to_string());
        }
        overrides
    }

    /// Build from arbitrary pairs, dropping keys that are not recognized.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut overrides = Self::new();
        for (key, value) in pairs {
            let key = key.into();
            if let Err(e) = overrides.set(&key, value) {
                tracing::debug!("Ignoring setting: {}", e);
            }
        }
        overrides
    }

    /// Set a recognized key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> RtkConfResult<()> {
        if !RECOGNIZED_KEYS.contains(&key) {
            return Err(RtkConfError::UnknownKey(key.to_string()));
        }
        self.values.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Write a total antenna offset (3 decimals) to the delta key(s).
    pub fn apply_antenna_offset(&mut self, total: f64, target: AntennaDeltaTarget) {
        let value = format_offset(total);
        for key in target.keys() {
            self.values.insert((*key).to_string(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Base station position as written into the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCoordinates {
    pub latitude: String,
    pub longitude: String,
    pub height: String,
}

impl BaseCoordinates {
    /// Validate and wrap user-entered values (decimal degrees, meters).
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        height: impl Into<String>,
    ) -> RtkConfResult<Self> {
        let coords = Self {
            latitude: latitude.into().trim().to_string(),
            longitude: longitude.into().trim().to_string(),
            height: height.into().trim().to_string(),
        };
        check_number("latitude", &coords.latitude)?;
        check_number("longitude", &coords.longitude)?;
        check_number("height", &coords.height)?;
        Ok(coords)
    }

    /// Format parsed decimal degrees (9 decimals) and height (4 decimals).
    pub fn from_decimal(latitude: f64, longitude: f64, height: f64) -> Self {
        Self {
            latitude: format!("{:.9}", latitude),
            longitude: format!("{:.9}", longitude),
            height: format!("{:.4}", height),
        }
    }
}

fn check_number(what: &str, value: &str) -> RtkConfResult<()> {
    value
        .parse::<f64>()
        .map(|_| ())
        .map_err(|_| RtkConfError::invalid_value(what, value))
}

/// Read the current values of `keys` from a configuration file.
pub fn read_settings(path: impl AsRef<Path>, keys: &[&str]) -> RtkConfResult<ConfigOverrides> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| RtkConfError::read(path, e))?;
    Ok(read_settings_from_str(&content, keys))
}

/// Read the values of `keys` from configuration text. Unlisted keys are skipped.
pub fn read_settings_from_str(content: &str, keys: &[&str]) -> ConfigOverrides {
    let mut found = ConfigOverrides::new();
    for line in content.lines() {
        let Some(parts) = split_line(line) else {
            continue;
        };
        if keys.contains(&parts.key) && !found.values.contains_key(parts.key) {
            found
                .values
                .insert(parts.key.to_string(), parts.value.trim().to_string());
        }
    }
    found
}

/// Rewrite every line whose key is in `overrides`.
///
/// Lines with other keys, comments, blank lines and line endings pass
/// through untouched.
pub fn apply_overrides(content: &str, overrides: &ConfigOverrides) -> String {
    rewrite_lines(content, |parts| {
        overrides
            .get(parts.key)
            .map(|value| parts.with_value(value))
    })
}

/// Point both antenna positions at `coords` and switch the base to `llh`.
pub fn apply_base_coordinates(content: &str, coords: &BaseCoordinates) -> String {
    rewrite_lines(content, |parts| {
        let (value, comment) = match parts.key {
            "ant1-pos1" => (coords.latitude.as_str(), "(deg)"),
            "ant1-pos2" => (coords.longitude.as_str(), "(deg)"),
            "ant1-pos3" => (coords.height.as_str(), "(m)"),
            "ant2-pos1" => (coords.latitude.as_str(), "(deg|m)"),
            "ant2-pos2" => (coords.longitude.as_str(), "(deg|m)"),
            "ant2-pos3" => (coords.height.as_str(), "(m|m)"),
            "ant2-postype" => ("llh", "(0:llh,1:xyz,2:single,3:posfile,4:rinexhead,5:rtcm)"),
            _ => return None,
        };
        Some(format!(
            "{:<width$}={}  # {}",
            parts.key,
            value,
            comment,
            width = KEY_WIDTH
        ))
    })
}

/// Apply `rewrite` to each line body, keeping the original line endings.
fn rewrite_lines<F>(content: &str, mut rewrite: F) -> String
where
    F: FnMut(&LineParts<'_>) -> Option<String>,
{
    let mut output = String::with_capacity(content.len());
    for raw in content.split_inclusive('\n') {
        let (body, ending) = split_ending(raw);
        match split_line(body).and_then(|parts| rewrite(&parts)) {
            Some(replaced) => {
                output.push_str(&replaced);
                output.push_str(ending);
            }
            None => output.push_str(raw),
        }
    }
    output
}

fn split_ending(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}

/// A `key=value # comment` line, split without losing the key padding.
struct LineParts<'a> {
    /// Text before `=`, padding included.
    raw_key: &'a str,
    key: &'a str,
    value: &'a str,
    /// Whitespace between value and `#`, plus the comment itself.
    comment: Option<&'a str>,
}

impl LineParts<'_> {
    fn with_value(&self, value: &str) -> String {
        match self.comment {
            Some(comment) => format!("{}={}{}", self.raw_key, value, comment),
            None => format!("{}={}", self.raw_key, value),
        }
    }
}

fn split_line(line: &str) -> Option<LineParts<'_>> {
    if line.trim_start().starts_with('#') {
        return None;
    }
    let (raw_key, rest) = line.split_once('=')?;
    let key = raw_key.trim();
    if key.is_empty() {
        return None;
    }

    match rest.find('#') {
        Some(hash) => {
            let value_part = &rest[..hash];
            let value = value_part.trim_end();
            Some(LineParts {
                raw_key,
                key,
                value,
                comment: Some(&rest[value.len()..]),
            })
        }
        None => Some(LineParts {
            raw_key,
            key,
            value: rest.trim_end(),
            comment: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# rtkpost options\r\n\
pos1-posmode       =kinematic  # (0:single,1:dgps,2:kinematic)\r\n\
pos1-antheight     =0.0\r\n\
ant1-antdelu       =0          # (m)\r\n\
ant2-postype       =rinexhead  # (0:llh,1:xyz)\r\n\
ant2-pos1          =0          # (deg|m)\r\n\
out-solformat      =llh\r\n";

    fn overrides(pairs: &[(&str, &str)]) -> ConfigOverrides {
        let mut o = ConfigOverrides::new();
        for (k, v) in pairs {
            o.set(k, *v).unwrap();
        }
        o
    }

    #[test]
    fn rewrites_matching_keys_only() {
        let o = overrides(&[("pos1-antheight", "1.800"), ("ant1-antdelu", "-0.135")]);
        let out = apply_overrides(SAMPLE, &o);

        let expected = SAMPLE
            .replace("pos1-antheight     =0.0", "pos1-antheight     =1.800")
            .replace(
                "ant1-antdelu       =0          # (m)",
                "ant1-antdelu       =-0.135          # (m)",
            );
        assert_eq!(out, expected);
    }

    #[test]
    fn other_lines_stay_byte_identical() {
        let o = overrides(&[("pos2-antheight", "2.0")]);
        // Key absent from the file: nothing changes.
        assert_eq!(apply_overrides(SAMPLE, &o), SAMPLE);
    }

    #[test]
    fn applying_twice_is_stable() {
        let o = overrides(&[("pos1-antheight", "1.5")]);
        let once = apply_overrides(SAMPLE, &o);
        assert_eq!(apply_overrides(&once, &o), once);
    }

    #[test]
    fn prefix_keys_do_not_collide() {
        let content = "pos1-antheight=1\npos1-antheightx=2\n";
        let o = overrides(&[("pos1-antheight", "9")]);
        assert_eq!(
            apply_overrides(content, &o),
            "pos1-antheight=9\npos1-antheightx=2\n"
        );
    }

    #[test]
    fn reads_values_without_comments() {
        let found = read_settings_from_str(SAMPLE, &RECOGNIZED_KEYS);
        assert_eq!(found.get("pos1-antheight"), Some("0.0"));
        assert_eq!(found.get("ant1-antdelu"), Some("0"));
        assert_eq!(found.get("pos2-antheight"), None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut o = ConfigOverrides::new();
        assert!(matches!(
            o.set("out-solformat", "xyz"),
            Err(RtkConfError::UnknownKey(_))
        ));
    }

    #[test]
    fn defaults_seed_three_keys() {
        let o = ConfigOverrides::with_defaults();
        assert_eq!(o.len(), 3);
        assert_eq!(o.get("pos2-antheight"), Some("0.0"));
        assert_eq!(o.get("ant2-antdelu"), None);
    }

    #[test]
    fn base_coordinates_set_both_antennas() {
        let coords = BaseCoordinates::new("48.123456789", "-1.5", "72.3").unwrap();
        let content = "ant1-pos1=0\nant2-postype=rinexhead\nant2-pos1=0\nant2-pos3=0 # (m|m)\nother=1\n";
        let out = apply_base_coordinates(content, &coords);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ant1-pos1          =48.123456789  # (deg)");
        assert!(lines[1].starts_with("ant2-postype       =llh  #"));
        assert_eq!(lines[2], "ant2-pos1          =48.123456789  # (deg|m)");
        assert_eq!(lines[3], "ant2-pos3          =72.3  # (m|m)");
        assert_eq!(lines[4], "other=1");
    }

    #[test]
    fn base_coordinates_reject_text() {
        assert!(BaseCoordinates::new("north", "1", "2").is_err());
    }

    #[test]
    fn antenna_offset_targets() {
        let mut o = ConfigOverrides::new();
        o.apply_antenna_offset(-0.135, AntennaDeltaTarget::RoverAndBase);
        assert_eq!(o.get("ant1-antdelu"), Some("-0.135"));
        assert_eq!(o.get("ant2-antdelu"), Some("-0.135"));
    }
}
