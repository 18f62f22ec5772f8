//! Command-line interface definitions for dupefind.
//!
//! Global options (verbosity, config file, error format) come before the
//! subcommand; scan options after it.
//!
//! # Example
//!
//! ```bash
//! # Print a text report to stdout
//! dupefind scan ~/Downloads
//!
//! # Write the report to a file
//! dupefind scan ~/Downloads --report duplicates_report.txt
//!
//! # JSON for scripting, hashing on a single thread
//! dupefind scan ~/Downloads --output json --io-threads 1
//!
//! # Verbose mode for debugging
//! dupefind -v scan ~/Downloads
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::scanner::MAX_BUFFER_SIZE;

/// Find files with identical content.
///
/// dupefind walks a directory tree, fingerprints every regular file with
/// BLAKE3 and reports groups of files whose content is identical.
#[derive(Debug, Parser)]
#[command(name = "dupefind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML) to use instead of the default location
    #[arg(long, value_name = "FILE", global = true, env = "DUPEFIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Directory path to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Write the report to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Number of threads used for hashing (default: 4; 1 hashes sequentially)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = parse_threads)]
    pub io_threads: Option<usize>,

    /// Read buffer used while hashing (e.g., 8KiB, 1MiB; default: 8KiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
    #[arg(long, value_name = "SIZE", value_parser = parse_buffer_size)]
    pub buffer_size: Option<usize>,

    /// Follow symbolic links during scan
    ///
    /// Symlink cycles are detected and skipped.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Report format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report
    #[default]
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB.
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupefind::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("8KiB").unwrap(), 8192);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// or has an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse `--buffer-size`: between one byte and [`MAX_BUFFER_SIZE`].
fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    if bytes == 0 {
        return Err("Buffer size must be at least 1 byte".to_string());
    }
    match usize::try_from(bytes) {
        Ok(size) if size <= MAX_BUFFER_SIZE => Ok(size),
        _ => Err(format!(
            "Buffer size too large: {bytes} (maximum {MAX_BUFFER_SIZE} bytes)"
        )),
    }
}

/// Parse `--io-threads`: a positive thread count.
fn parse_threads(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("At least one I/O thread is required".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid thread count: '{s}'")),
    }
}
