//! Files imported for a batch.

use std::path::{Path, PathBuf};

use crate::matching::{match_rover, MatchedTriple, NavMatchPolicy, SkipReason};
use crate::observation::{FileRole, ObservationRecord, ObservationSet};

/// Rover, base and navigation records plus the `.sum` files of a session.
///
/// Front ends render this; the batch runner consumes it.
#[derive(Debug, Clone)]
pub struct BatchSession {
    pub rovers: ObservationSet,
    pub bases: ObservationSet,
    pub navs: ObservationSet,
    pub sum_files: Vec<PathBuf>,
}

impl Default for BatchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchSession {
    pub fn new() -> Self {
        Self {
            rovers: ObservationSet::new(FileRole::Rover),
            bases: ObservationSet::new(FileRole::Base),
            navs: ObservationSet::new(FileRole::Navigation),
            sum_files: Vec::new(),
        }
    }

    pub fn set(&self, role: FileRole) -> &ObservationSet {
        match role {
            FileRole::Rover => &self.rovers,
            FileRole::Base => &self.bases,
            FileRole::Navigation => &self.navs,
        }
    }

    pub fn set_mut(&mut self, role: FileRole) -> &mut ObservationSet {
        match role {
            FileRole::Rover => &mut self.rovers,
            FileRole::Base => &mut self.bases,
            FileRole::Navigation => &mut self.navs,
        }
    }

    /// Scan and import files for `role`, returning how many were new.
    pub fn import<I, P>(&mut self, role: FileRole, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let records = paths
            .into_iter()
            .map(|path| ObservationRecord::from_path(path, role));
        let added = self.set_mut(role).add_all(records);
        tracing::debug!("Imported {} {} file(s)", added, role);
        added
    }

    /// Add `.sum` files, ignoring paths already present.
    pub fn import_sum_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.into();
            if self.sum_files.contains(&path) {
                tracing::debug!("{} already imported, ignoring", path.display());
                continue;
            }
            self.sum_files.push(path);
            added += 1;
        }
        added
    }

    pub fn remove_sum_file(&mut self, path: &Path) -> bool {
        let before = self.sum_files.len();
        self.sum_files.retain(|p| p != path);
        self.sum_files.len() != before
    }

    /// Drop every file.
    pub fn clear(&mut self) {
        self.rovers.clear();
        self.bases.clear();
        self.navs.clear();
        self.sum_files.clear();
    }

    /// Match every rover without running anything.
    pub fn plan(&self, policy: NavMatchPolicy) -> Vec<Result<MatchedTriple<'_>, SkipReason>> {
        self.rovers
            .iter()
            .map(|rover| match_rover(rover, &self.bases, &self.navs, policy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn import_scans_and_deduplicates() {
        let dir = tempdir().unwrap();
        let rover = dir.path().join("rover.obs");
        fs::write(&rover, "> 2024 06 15 10 00 00.0000000  0 8\n").unwrap();

        let mut session = BatchSession::new();
        assert_eq!(session.import(FileRole::Rover, [&rover, &rover]), 1);
        assert_eq!(session.rovers.records()[0].date(), Some("20240615"));
    }

    #[test]
    fn plan_reports_skips() {
        let mut session = BatchSession::new();
        session.rovers.add(ObservationRecord::new(
            "/r/a.obs",
            FileRole::Rover,
            Some("20240615".into()),
            None,
        ));
        session.rovers.add(ObservationRecord::new("/r/b.obs", FileRole::Rover, None, None));
        session.bases.add(ObservationRecord::new(
            "/b/base.obs",
            FileRole::Base,
            Some("20240615".into()),
            None,
        ));
        session.navs.add(ObservationRecord::new(
            "/n/nav.nav",
            FileRole::Navigation,
            Some("20240615".into()),
            None,
        ));

        let plan = session.plan(NavMatchPolicy::ByDate);
        assert!(plan[0].is_ok());
        assert!(matches!(plan[1], Err(SkipReason::NoRoverDate { .. })));
    }

    #[test]
    fn sum_files_are_unique() {
        let mut session = BatchSession::new();
        assert_eq!(session.import_sum_files(["a.sum", "a.sum", "b.sum"]), 2);
        assert!(session.remove_sum_file(Path::new("a.sum")));
        assert_eq!(session.sum_files, vec![PathBuf::from("b.sum")]);
    }
}
