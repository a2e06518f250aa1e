//! Ordered record collections.

use std::path::{Path, PathBuf};

use super::record::{FileRole, ObservationRecord};

/// Insertion-ordered list of records sharing one role.
///
/// Order matters: matching always takes the first record with the
/// wanted date, so earlier imports shadow later duplicates.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    role: FileRole,
    records: Vec<ObservationRecord>,
}

impl ObservationSet {
    /// Create an empty set for `role`.
    pub fn new(role: FileRole) -> Self {
        Self {
            role,
            records: Vec::new(),
        }
    }

    /// Scan and add every path, in order.
    pub fn from_paths<I, P>(role: FileRole, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut set = Self::new(role);
        for path in paths {
            set.add(ObservationRecord::from_path(path, role));
        }
        set
    }

    pub fn role(&self) -> FileRole {
        self.role
    }

    /// Append a record.
    ///
    /// Returns false (and drops the record) if the path is already present.
    pub fn add(&mut self, record: ObservationRecord) -> bool {
        if self.contains_path(record.path()) {
            tracing::debug!("{} already imported, ignoring", record.path().display());
            return false;
        }
        self.records.push(record);
        true
    }

    /// Append several records, returning how many were new.
    pub fn add_all(&mut self, records: impl IntoIterator<Item = ObservationRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if self.add(record) {
                added += 1;
            }
        }
        added
    }

    /// Remove a record by index.
    pub fn remove(&mut self, index: usize) -> Option<ObservationRecord> {
        if index < self.records.len() {
            Some(self.records.remove(index))
        } else {
            None
        }
    }

    /// Remove a record by path.
    pub fn remove_path(&mut self, path: &Path) -> Option<ObservationRecord> {
        let index = self.records.iter().position(|r| r.path() == path)?;
        self.remove(index)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.records.iter().any(|r| r.path() == path)
    }

    /// First record whose date equals `date`.
    pub fn find_by_date(&self, date: &str) -> Option<&ObservationRecord> {
        self.records.iter().find(|r| r.date() == Some(date))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObservationRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    /// Paths in insertion order (for persistence).
    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.iter().map(|r| r.path().to_path_buf()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a ObservationRecord;
    type IntoIter = std::slice::Iter<'a, ObservationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
