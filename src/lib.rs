//! dupefind - content-hash duplicate file finder
//!
//! Walks a directory tree, fingerprints every regular file with BLAKE3 and
//! groups files whose fingerprints match. Hashing runs on a bounded thread
//! pool; results and progress are merged on the caller's thread, so the
//! output is identical to a sequential scan.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let result = dupefind::scan(Path::new("."), None).unwrap();
//! for group in &result {
//!     println!("{} files share {}", group.len(), group.fingerprint);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use cli::{Cli, Commands, OutputFormat, ScanArgs};
use config::Config;
use duplicates::{DuplicateFinder, ScanResult, ScanSummary};
use error::ExitCode;
use progress::TerminalProgress;
use report::{JsonReport, TextReport};
use signal::CancellationToken;

pub use duplicates::scan;

/// Run the application for parsed command-line arguments.
///
/// Initializes logging, loads configuration and dispatches the subcommand.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the scan root is invalid,
/// the scan is cancelled, or the report cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(ref args) => run_scan(args, cli.config.as_deref(), cli.quiet),
    }
}

fn run_scan(args: &ScanArgs, config_file: Option<&Path>, quiet: bool) -> Result<ExitCode> {
    let mut config = Config::load(config_file).context("Failed to load configuration")?;
    config.apply_scan_args(args);
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);

    let token = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{}; Ctrl+C will not cancel the scan cleanly", e);
        CancellationToken::new()
    });

    let mut finder_config = config.finder_config().with_cancellation(token);
    if !quiet && !args.no_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(TerminalProgress::new(false)));
    }

    let (result, summary) = DuplicateFinder::new(finder_config)
        .find_duplicates(&args.path)
        .with_context(|| format!("Scan of {} failed", args.path.display()))?;

    if summary.had_errors() {
        log::warn!(
            "Skipped {} unreadable file(s) and {} unreadable director(ies)",
            summary.unreadable_files,
            summary.walk_errors
        );
    }

    let exit_code = if result.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    };

    write_report(args, &result, &summary, exit_code)?;
    Ok(exit_code)
}

fn write_report(
    args: &ScanArgs,
    result: &ScanResult,
    summary: &ScanSummary,
    exit_code: ExitCode,
) -> Result<()> {
    let mut writer: Box<dyn Write> = match args.report {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create report file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match args.output {
        OutputFormat::Text => TextReport::new(result).write_to(&mut writer)?,
        OutputFormat::Json => JsonReport::new(result, summary, exit_code).write_to(&mut writer)?,
    }
    writer.flush().context("Failed to flush report")?;

    if let Some(ref path) = args.report {
        log::info!("Report written to {}", path.display());
    }
    Ok(())
}
