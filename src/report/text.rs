//! Plain-text duplicate report.
//!
//! ```text
//! ================================================================================
//! DUPLICATE FILES REPORT
//! ================================================================================
//! Generated: 2024-05-01 14:03:12
//!
//! Found 1 duplicate group(s) with 2 total files.
//!
//! --------------------------------------------------------------------------------
//! Group 1: 2 duplicate files (5 B each)
//! --------------------------------------------------------------------------------
//!   [1] /data/a.txt
//!   [2] /data/b.txt
//!
//! ================================================================================
//! Potential space savings: 5 B
//! ================================================================================
//! ```
//!
//! An empty result is the single line `No duplicate files found.`

use std::io::Write;

use bytesize::ByteSize;
use chrono::{DateTime, Local};

use super::{ReportError, SizedResult};
use crate::duplicates::ScanResult;

const RULE_WIDTH: usize = 80;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Human-readable report of a scan result.
#[derive(Debug, Clone)]
pub struct TextReport<'a> {
    result: SizedResult<'a>,
    generated: DateTime<Local>,
}

impl<'a> TextReport<'a> {
    /// Prepare a report, stat'ing the first file of each group now.
    #[must_use]
    pub fn new(result: &'a ScanResult) -> Self {
        Self {
            result: SizedResult::new(result),
            generated: Local::now(),
        }
    }

    /// Override the generation timestamp.
    #[must_use]
    pub fn with_generated(mut self, generated: DateTime<Local>) -> Self {
        self.generated = generated;
        self
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ReportError> {
        if self.result.groups.is_empty() {
            writeln!(writer, "No duplicate files found.")?;
            return Ok(());
        }

        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(writer, "{heavy}")?;
        writeln!(writer, "DUPLICATE FILES REPORT")?;
        writeln!(writer, "{heavy}")?;
        writeln!(
            writer,
            "Generated: {}",
            self.generated.format(TIMESTAMP_FORMAT)
        )?;
        writeln!(writer)?;
        writeln!(
            writer,
            "Found {} duplicate group(s) with {} total files.",
            self.result.groups.len(),
            self.result.total_files()
        )?;
        writeln!(writer)?;

        for (number, entry) in self.result.groups.iter().enumerate() {
            let each = entry
                .size
                .map_or_else(|| "Unknown".to_string(), |s| ByteSize::b(s).to_string());

            writeln!(writer, "{light}")?;
            writeln!(
                writer,
                "Group {}: {} duplicate files ({} each)",
                number + 1,
                entry.group.len(),
                each
            )?;
            writeln!(writer, "{light}")?;
            for (idx, path) in entry.group.files.iter().enumerate() {
                writeln!(writer, "  [{}] {}", idx + 1, path.display())?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "{heavy}")?;
        writeln!(
            writer,
            "Potential space savings: {}",
            ByteSize::b(self.result.wasted())
        )?;
        writeln!(writer, "{heavy}")?;
        Ok(())
    }

    /// Render the report into a string.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn render(&self) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
