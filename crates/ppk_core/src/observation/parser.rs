//! Date/time extraction from observation file content.
//!
//! Three recognizers are tried in order:
//! 1. RINEX header line labelled `TIME OF FIRST OBS`, anywhere in the file
//! 2. the first RINEX 3 epoch line starting with `>`
//! 3. (base/navigation only) `YYYYMMDD HHMMSS` anywhere on the second line

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::record::FileRole;

/// RINEX header label carrying the first epoch of the file.
pub const FIRST_OBS_MARKER: &str = "TIME OF FIRST OBS";

const END_OF_HEADER_MARKER: &str = "END OF HEADER";

static SECOND_LINE_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{8})\s+(\d{6})").expect("Invalid second-line stamp regex"));

static FILENAME_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{8}").expect("Invalid filename date regex"));

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("Invalid digit regex"));

/// Extract `(date, time)` from a file.
///
/// Never fails: unreadable files are logged and yield `(None, None)`,
/// as do files where no recognizer matches.
pub fn parse_date_time(
    path: impl AsRef<Path>,
    role: FileRole,
) -> (Option<String>, Option<String>) {
    let path = path.as_ref();
    let result = File::open(path).and_then(|file| scan_date_time(BufReader::new(file), role));

    match result {
        Ok(Some((date, time))) => (Some(date), Some(time)),
        Ok(None) => {
            tracing::debug!("No date pattern found in {}", path.display());
            (None, None)
        }
        Err(e) => {
            tracing::warn!("Error reading file {}: {}", path.display(), e);
            (None, None)
        }
    }
}

/// Scan a reader for the acquisition stamp.
///
/// Returns `Ok(None)` when nothing matches. Non-UTF-8 bytes are replaced
/// rather than rejected, receivers are not always careful about encoding.
pub fn scan_date_time<R: BufRead>(
    mut reader: R,
    role: FileRole,
) -> io::Result<Option<(String, String)>> {
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    let mut second_line: Option<String> = None;
    let mut first_epoch: Option<(String, String)> = None;
    let mut header_done = false;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(&['\r', '\n'][..]);

        if line_no == 2 {
            second_line = Some(line.to_string());
        }

        if let Some(label_at) = line.find(FIRST_OBS_MARKER) {
            if let Some(stamp) = parse_epoch_fields(line[..label_at].split_ascii_whitespace()) {
                return Ok(Some(stamp));
            }
        } else if line.contains(END_OF_HEADER_MARKER) {
            header_done = true;
        } else if let Some(rest) = line.strip_prefix('>') {
            if first_epoch.is_none() {
                first_epoch = parse_epoch_fields(rest.split_ascii_whitespace());
            }
        }

        // No header label can follow END OF HEADER.
        if header_done && first_epoch.is_some() {
            break;
        }
    }

    if first_epoch.is_some() {
        return Ok(first_epoch);
    }

    if role.uses_second_line_stamp() {
        if let Some(caps) = second_line
            .as_deref()
            .and_then(|line| SECOND_LINE_STAMP.captures(line))
        {
            return Ok(Some((caps[1].to_string(), caps[2].to_string())));
        }
    }

    Ok(None)
}

/// Parse `year month day hour minute seconds` into `("YYYYMMDD", "HHMMSS")`.
fn parse_epoch_fields<'a>(mut fields: impl Iterator<Item = &'a str>) -> Option<(String, String)> {
    let year = fields.next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let month = field_in_range(fields.next()?, 1, 12)?;
    let day = field_in_range(fields.next()?, 1, 31)?;
    let hour = field_in_range(fields.next()?, 0, 23)?;
    let minute = field_in_range(fields.next()?, 0, 59)?;

    let seconds: f64 = fields.next()?.parse().ok()?;
    if !(0.0..61.0).contains(&seconds) {
        return None;
    }
    let whole_seconds = seconds.trunc() as u32;

    Some((
        format!("{}{:02}{:02}", year, month, day),
        format!("{:02}{:02}{:02}", hour, minute, whole_seconds),
    ))
}

fn field_in_range(field: &str, min: u32, max: u32) -> Option<u32> {
    let value: u32 = field.parse().ok()?;
    (min..=max).contains(&value).then_some(value)
}

/// First 8-digit run in a filename, taken as `YYYYMMDD`.
pub fn date_from_filename(name: &str) -> Option<String> {
    FILENAME_DATE.find(name).map(|m| m.as_str().to_string())
}

/// Numeric runs of exactly 6 or 8 digits in a filename.
pub fn numeric_tokens(name: &str) -> Vec<String> {
    DIGIT_RUN
        .find_iter(name)
        .map(|m| m.as_str())
        .filter(|run| run.len() == 6 || run.len() == 8)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan(content: &str, role: FileRole) -> Option<(String, String)> {
        scan_date_time(Cursor::new(content.as_bytes()), role).unwrap()
    }

    #[test]
    fn reads_first_obs_header() {
        let content = "     3.04           OBSERVATION DATA    M                   RINEX VERSION / TYPE\n\
  2024     6    15     9     5    7.0000000     GPS         TIME OF FIRST OBS\n\
                                                            END OF HEADER\n";
        let stamp = scan(content, FileRole::Rover).unwrap();
        assert_eq!(stamp, ("20240615".to_string(), "090507".to_string()));
    }

    #[test]
    fn reads_epoch_line() {
        let content = "header\n> 2024 06 15 10 30 42.5000000  0 12\nG01 ...\n";
        let stamp = scan(content, FileRole::Rover).unwrap();
        assert_eq!(stamp, ("20240615".to_string(), "103042".to_string()));
    }

    #[test]
    fn header_marker_wins_over_epoch() {
        let content = "  2024     6    14    23    59   59.0000000     GPS         TIME OF FIRST OBS\n\
> 2024 06 15 00 00 00.0000000  0 12\n";
        let stamp = scan(content, FileRole::Rover).unwrap();
        assert_eq!(stamp.0, "20240614");
    }

    #[test]
    fn epoch_before_header_marker_is_only_a_fallback() {
        let content = "> 2024 06 15 00 00 00.0000000  0 12\n\
  2024     6    14    23    59   59.0000000     GPS         TIME OF FIRST OBS\n";
        let stamp = scan(content, FileRole::Rover).unwrap();
        assert_eq!(stamp, ("20240614".to_string(), "235959".to_string()));

        let content = "> 2024 06 15 00 00 00.0000000  0 12\n> 2024 06 16 00 00 00.0000000  0 12\n";
        let stamp = scan(content, FileRole::Rover).unwrap();
        assert_eq!(stamp.0, "20240615");
    }

    #[test]
    fn epoch_after_end_of_header() {
        let content = "     3.04           OBSERVATION DATA    M                   RINEX VERSION / TYPE\n\
                                                            END OF HEADER\n\
> 2024 06 15 10 30 42.5000000  0 12\n";
        let stamp = scan(content, FileRole::Base).unwrap();
        assert_eq!(stamp, ("20240615".to_string(), "103042".to_string()));
    }

    #[test]
    fn base_uses_second_line_stamp() {
        let content = "EMLID base log\nStarted 20240615 081500 UTC\n";
        let stamp = scan(content, FileRole::Base).unwrap();
        assert_eq!(stamp, ("20240615".to_string(), "081500".to_string()));

        let nav = scan(content, FileRole::Navigation).unwrap();
        assert_eq!(nav.0, "20240615");
    }

    #[test]
    fn rover_ignores_second_line_stamp() {
        let content = "EMLID rover log\nStarted 20240615 081500 UTC\n";
        assert!(scan(content, FileRole::Rover).is_none());
    }

    #[test]
    fn out_of_range_fields_do_not_match() {
        let content = "> 2024 13 15 10 30 42.0\n";
        assert!(scan(content, FileRole::Rover).is_none());
    }

    #[test]
    fn no_pattern_yields_none() {
        assert!(scan("nothing useful\nat all\n", FileRole::Base).is_none());
        assert!(scan("", FileRole::Rover).is_none());
    }

    #[test]
    fn tolerates_invalid_utf8() {
        let mut bytes = b"\xff\xfe garbage\n".to_vec();
        bytes.extend_from_slice(b"> 2024 06 15 10 30 00.0000000  0 9\n");
        let stamp = scan_date_time(Cursor::new(bytes), FileRole::Rover).unwrap();
        assert_eq!(stamp.unwrap().0, "20240615");
    }

    #[test]
    fn unreadable_file_yields_none() {
        let (date, time) = parse_date_time("/nonexistent/file.obs", FileRole::Rover);
        assert!(date.is_none());
        assert!(time.is_none());
    }

    #[test]
    fn filename_date() {
        assert_eq!(
            date_from_filename("BASE_20240615_sum"),
            Some("20240615".to_string())
        );
        assert_eq!(date_from_filename("no_date_here"), None);
    }

    #[test]
    fn filename_numeric_tokens() {
        let tokens = numeric_tokens("rover_240615_20240615_v12");
        assert_eq!(tokens, vec!["240615".to_string(), "20240615".to_string()]);
    }
}
