//! Report writers for scan results.
//!
//! The engine's [`ScanResult`] holds paths and fingerprints only. This
//! module re-stats the first file of every group to learn its size and
//! derives the space that removing the extra copies would free:
//!
//! ```text
//! wasted = size × (copies − 1)
//! ```
//!
//! A group whose first file can no longer be stat'ed has an unknown size and
//! contributes nothing to the totals.
//!
//! - [`TextReport`]: the human-readable report
//! - [`JsonReport`]: a machine-readable document for scripting
//!
//! # Example
//!
//! ```no_run
//! use dupefind::duplicates::DuplicateFinder;
//! use dupefind::report::TextReport;
//! use std::path::Path;
//!
//! let (result, _summary) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//!
//! TextReport::new(&result).write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

use std::path::Path;

use crate::duplicates::{DuplicateGroup, ScanResult};

pub use json::JsonReport;
pub use text::TextReport;

/// A duplicate group together with its per-file size.
#[derive(Debug, Clone, Copy)]
pub struct GroupReport<'a> {
    /// The group being described
    pub group: &'a DuplicateGroup,
    /// Size of each file in bytes, if the first file could be stat'ed
    pub size: Option<u64>,
}

impl<'a> GroupReport<'a> {
    /// Stat the group's first file to learn its size.
    #[must_use]
    pub fn new(group: &'a DuplicateGroup) -> Self {
        let size = group.first().and_then(file_size);
        Self { group, size }
    }

    /// Bytes freed by keeping one copy, or `None` when the size is unknown.
    #[must_use]
    pub fn wasted(&self) -> Option<u64> {
        self.size
            .map(|size| size.saturating_mul(self.group.duplicate_count() as u64))
    }
}

/// Sized view of a whole result, shared by the writers.
#[derive(Debug, Clone)]
pub(crate) struct SizedResult<'a> {
    pub(crate) groups: Vec<GroupReport<'a>>,
}

impl<'a> SizedResult<'a> {
    pub(crate) fn new(result: &'a ScanResult) -> Self {
        Self {
            groups: result.iter().map(GroupReport::new).collect(),
        }
    }

    pub(crate) fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.group.len()).sum()
    }

    /// Sum of wasted bytes over groups with a known size.
    pub(crate) fn wasted(&self) -> u64 {
        self.groups.iter().filter_map(GroupReport::wasted).sum()
    }
}

fn file_size(path: &Path) -> Option<u64> {
    match std::fs::metadata(path) {
        Ok(metadata) => Some(metadata.len()),
        Err(e) => {
            log::debug!("Cannot stat {} for report: {}", path.display(), e);
            None
        }
    }
}

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),
}
