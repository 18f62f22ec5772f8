//! Duplicate groups and the scan result.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] pairs a [`Fingerprint`] with every path whose content
//! produced it, in traversal order. A [`ScanResult`] is the set of groups
//! left after files with a unique fingerprint have been discarded; every
//! group in it has at least two members.
//!
//! Groups carry paths and fingerprints only. Sizes are not part of the
//! result; consumers re-stat files when they need them (see
//! [`crate::report`]).
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scan;
//! use std::path::Path;
//!
//! let result = scan(Path::new("."), None).unwrap();
//! for group in &result {
//!     println!("{} ({} copies)", group.fingerprint, group.len());
//!     for path in &group.files {
//!         println!("  {}", path.display());
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::Fingerprint;

/// Confirmed duplicate group of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// BLAKE3 fingerprint shared by every file in the group
    pub fingerprint: Fingerprint,
    /// Paths in traversal order; the first is the first occurrence
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// Callers guarantee at least two files.
    #[must_use]
    pub(crate) fn new(fingerprint: Fingerprint, files: Vec<PathBuf>) -> Self {
        debug_assert!(files.len() >= 2, "duplicate group needs 2+ files");
        Self { fingerprint, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// The first occurrence in traversal order.
    #[must_use]
    pub fn first(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }

    /// Fingerprint as hexadecimal string.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        self.fingerprint.to_hex()
    }

    /// Whether `path` is a member of this group.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

/// The outcome of a completed scan: fingerprint → duplicate group.
///
/// Groups are ordered by the traversal position of their first member, so
/// two scans of an unchanged tree produce equal results regardless of how
/// many hashing threads were used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    groups: Vec<DuplicateGroup>,
    #[serde(skip)]
    by_fingerprint: HashMap<Fingerprint, usize>,
}

impl ScanResult {
    pub(crate) fn from_groups(groups: Vec<DuplicateGroup>) -> Self {
        let by_fingerprint = groups
            .iter()
            .enumerate()
            .map(|(i, group)| (group.fingerprint, i))
            .collect();
        Self {
            groups,
            by_fingerprint,
        }
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over groups in first-occurrence order.
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.groups.iter()
    }

    /// All groups in first-occurrence order.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Look up the group for a fingerprint.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&DuplicateGroup> {
        self.by_fingerprint
            .get(fingerprint)
            .and_then(|&i| self.groups.get(i))
    }

    /// Find the group containing `path`, if any.
    #[must_use]
    pub fn group_of(&self, path: &Path) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.contains(path))
    }

    /// Total files across all groups.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }

    /// Total redundant copies across all groups.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Take ownership of the groups.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        self.groups
    }
}

impl IntoIterator for ScanResult {
    type Item = DuplicateGroup;
    type IntoIter = std::vec::IntoIter<DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScanResult {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
