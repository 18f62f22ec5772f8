//! Exit codes and structured error output.

use serde::Serialize;

use crate::duplicates::FinderError;
use crate::signal::EXIT_CODE_INTERRUPTED;

/// Process exit codes.
///
/// - 0: Scan completed and duplicates were found
/// - 1: Unexpected failure, including an invalid scan root
/// - 2: Scan completed and found no duplicates
/// - 130: Interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: duplicates were found.
    Success = 0,
    /// General error: the scan could not run.
    GeneralError = 1,
    /// No duplicates: the scan completed without finding any.
    NoDuplicates = 2,
    /// Interrupted: the scan was cancelled.
    Interrupted = EXIT_CODE_INTERRUPTED as isize,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::NoDuplicates => "DF002",
            Self::Interrupted => "DF130",
        }
    }

    /// Pick the exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let cancelled = err
            .chain()
            .filter_map(|cause| cause.downcast_ref::<FinderError>())
            .any(FinderError::is_cancelled);
        if cancelled {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including causes
    pub message: String,
    /// Whether the scan was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
