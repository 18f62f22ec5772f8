//! Duplicate detection.
//!
//! - [`finder`] runs a scan: validate, count, hash, group
//! - [`index`] accumulates fingerprints during one scan
//! - [`groups`] holds the finished [`ScanResult`]

pub mod finder;
pub mod groups;
pub mod index;

pub use finder::{
    scan, DuplicateFinder, FinderConfig, FinderError, InvalidRootReason, ScanSummary,
    DEFAULT_IO_THREADS,
};
pub use groups::{DuplicateGroup, ScanResult};
pub use index::DuplicateIndex;
