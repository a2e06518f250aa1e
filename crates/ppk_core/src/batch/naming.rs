//! Solution file naming.

use std::path::{Path, PathBuf};

/// Solution file extension.
pub const SOLUTION_EXTENSION: &str = "pos";

/// First free `<stem>.pos`, `<stem>_1.pos`, `<stem>_2.pos`, ... in `dir`.
pub fn unique_output_path(dir: &Path, stem: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", stem, SOLUTION_EXTENSION));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", stem, counter, SOLUTION_EXTENSION));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn suffixes_on_collision() {
        let dir = tempdir().unwrap();
        assert_eq!(
            unique_output_path(dir.path(), "rover1"),
            dir.path().join("rover1.pos")
        );

        fs::write(dir.path().join("rover1.pos"), "").unwrap();
        assert_eq!(
            unique_output_path(dir.path(), "rover1"),
            dir.path().join("rover1_1.pos")
        );

        fs::write(dir.path().join("rover1_1.pos"), "").unwrap();
        assert_eq!(
            unique_output_path(dir.path(), "rover1"),
            dir.path().join("rover1_2.pos")
        );
    }
}
