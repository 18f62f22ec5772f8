//! JSON duplicate report for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated": "2024-05-01T14:03:12+02:00",
//!   "duplicates": [
//!     {
//!       "fingerprint": "ea8f163db38682925e4491c5e58d4bb3506ef8c14eb78a86e908c5624a67200f",
//!       "size": 5,
//!       "wasted": 5,
//!       "files": ["/data/a.txt", "/data/b.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 3,
//!     "processed_files": 3,
//!     "hashed_files": 3,
//!     "unreadable_files": 0,
//!     "walk_errors": 0,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "reclaimable_space": 5,
//!     "scan_duration_ms": 12,
//!     "exit_code": 0,
//!     "exit_code_name": "DF000"
//!   }
//! }
//! ```
//!
//! `size` and `wasted` are `null` when the group's first file could not be
//! stat'ed.

use std::io::Write;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::{GroupReport, ReportError, SizedResult};
use crate::duplicates::{ScanResult, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 fingerprint as hexadecimal string (64 characters)
    pub fingerprint: String,
    /// Size of each file in bytes
    pub size: Option<u64>,
    /// Bytes freed by keeping a single copy
    pub wasted: Option<u64>,
    /// Paths in traversal order
    pub files: Vec<String>,
}

impl From<&GroupReport<'_>> for JsonDuplicateGroup {
    fn from(report: &GroupReport<'_>) -> Self {
        Self {
            fingerprint: report.group.fingerprint_hex(),
            size: report.size,
            wasted: report.wasted(),
            files: report
                .group
                .files
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files found by the counting pass
    pub total_files: usize,
    /// Files attempted during hashing
    pub processed_files: usize,
    /// Files fingerprinted successfully
    pub hashed_files: usize,
    /// Files skipped because they could not be read
    pub unreadable_files: usize,
    /// Directories or entries the walk could not read
    pub walk_errors: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies across all groups
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group (known sizes only)
    pub reclaimable_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DF000")
    pub exit_code_name: String,
}

/// Complete JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    /// When the report was produced
    pub generated: DateTime<Local>,
    /// Duplicate groups in first-occurrence order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonReport {
    /// Build a JSON report, stat'ing the first file of each group now.
    #[must_use]
    pub fn new(result: &ScanResult, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        let sized = SizedResult::new(result);

        Self {
            generated: Local::now(),
            duplicates: sized.groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary {
                total_files: summary.total_files,
                processed_files: summary.processed_files,
                hashed_files: summary.hashed_files,
                unreadable_files: summary.unreadable_files,
                walk_errors: summary.walk_errors,
                duplicate_groups: summary.duplicate_groups,
                duplicate_files: summary.duplicate_files,
                reclaimable_space: sized.wasted(),
                scan_duration_ms: u64::try_from(summary.scan_duration.as_millis())
                    .unwrap_or(u64::MAX),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
