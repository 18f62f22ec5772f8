//! Fingerprint index built during a single scan.
//!
//! [`DuplicateIndex`] moves through three states:
//!
//! 1. **Init** - [`DuplicateIndex::new`] creates an empty mapping.
//! 2. **Accumulate** - [`DuplicateIndex::record`] appends each hashed path to
//!    the list for its fingerprint; [`DuplicateIndex::record_failure`] notes a
//!    file that could not be hashed without touching the mapping.
//! 3. **Finalize** - [`DuplicateIndex::finalize`] consumes the index and
//!    keeps only fingerprints shared by two or more files.
//!
//! Each path is recorded with its position in the walk. Hashing workers may
//! finish out of order, so finalization sorts by that position: group
//! contents and group order always match a sequential scan.

use std::collections::HashMap;
use std::path::PathBuf;

use super::groups::{DuplicateGroup, ScanResult};
use crate::scanner::Fingerprint;

/// A path tagged with its position in the walk.
#[derive(Debug, Clone)]
struct Sighting {
    seq: usize,
    path: PathBuf,
}

/// Mapping from fingerprint to every path that produced it.
///
/// Owned by exactly one scan; never shared or reused.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    entries: HashMap<Fingerprint, Vec<Sighting>>,
    recorded: usize,
    failed: usize,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the file at walk position `seq` hashed to `fingerprint`.
    pub fn record(&mut self, seq: usize, path: PathBuf, fingerprint: Fingerprint) {
        self.entries
            .entry(fingerprint)
            .or_default()
            .push(Sighting { seq, path });
        self.recorded += 1;
    }

    /// Note a file that could not be hashed. It joins no group.
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Number of successfully recorded files.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Number of files that failed to hash.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Number of distinct fingerprints seen so far.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    /// Discard unique fingerprints and produce the scan result.
    #[must_use]
    pub fn finalize(self) -> ScanResult {
        let mut groups: Vec<(usize, DuplicateGroup)> = self
            .entries
            .into_iter()
            .filter(|(_, sightings)| sightings.len() > 1)
            .map(|(fingerprint, mut sightings)| {
                sightings.sort_by_key(|s| s.seq);
                let first_seq = sightings[0].seq;
                let files = sightings.into_iter().map(|s| s.path).collect();
                (first_seq, DuplicateGroup::new(fingerprint, files))
            })
            .collect();

        groups.sort_by_key(|(first_seq, _)| *first_seq);

        for (_, group) in &groups {
            log::debug!(
                "Duplicate group {}: {} files",
                group.fingerprint_hex(),
                group.len()
            );
        }

        ScanResult::from_groups(groups.into_iter().map(|(_, group)| group).collect())
    }
}
