//! Logging setup for dupefind.
//!
//! Uses the `log` facade with the `env_logger` backend. The level comes
//! from, in priority order:
//!
//! 1. The `RUST_LOG` environment variable, when set
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. Info
//!
//! Flag-derived levels apply to this crate only; dependencies stay at
//! `warn` so `-vv` does not drown the scan in foreign trace output.
//!
//! Debug builds prefix each line with a timestamp and, when verbose, the
//! module path. Release builds print level and message only.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupefind::logging::init_logging;
//!
//! init_logging(1, false); // -v
//! log::debug!("visible");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging from the CLI verbosity flags.
///
/// Call once, before the first log statement. Later calls are ignored.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - Only show errors (overridden by `RUST_LOG`)
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var_os("RUST_LOG").is_some();
    let level = determine_level(verbose, quiet);

    let mut builder = Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder
            .filter_level(level.min(LevelFilter::Warn))
            .filter_module(env!("CARGO_CRATE_NAME"), level);
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        // A logger is already installed (e.g. by a test harness)
        return;
    }

    if from_env {
        log::debug!("Logging configured from RUST_LOG");
    } else {
        log::debug!("Logging initialized at level {}", level);
    }
}

/// Map CLI flags to a level. Quiet wins over verbose.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let timestamp = buf.timestamp_seconds();
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                timestamp,
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} {}",
                timestamp,
                record.level(),
                record.args()
            )
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
    });
}
