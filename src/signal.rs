//! Cancellation and Ctrl+C handling.
//!
//! A [`CancellationToken`] wraps an `AtomicBool` that is shared by every
//! stage of a scan. The walker checks it between directory entries, hashing
//! workers before each file, the hasher between chunks, and the merge loop
//! between results. Once tripped, the scan unwinds and returns
//! [`FinderError::Cancelled`](crate::duplicates::FinderError::Cancelled);
//! partial results are discarded.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupefind::signal::install_handler;
//! use dupefind::duplicates::FinderConfig;
//!
//! // Ctrl+C now cancels whatever scan holds this token
//! let token = install_handler().expect("Failed to install signal handler");
//! let config = FinderConfig::default().with_cancellation(token.clone());
//! ```
//!
//! # Exit Codes
//!
//! When a signal is received:
//! - Every token returned by [`install_handler`] and still alive is cancelled
//! - A message "Interrupted. Cleaning up..." is printed to stderr
//! - The application should exit with code 130 (128 + SIGINT)

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Exit code for SIGINT (Ctrl+C) interruption.
/// This follows Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared cancellation flag for one or more scans.
///
/// Cloning is cheap and every clone observes the same flag.
///
/// # Example
///
/// ```
/// use dupefind::signal::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_view = token.clone();
///
/// token.cancel();
/// assert!(worker_view.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the token can guard another scan.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Tokens handed out by [`install_handler`], cancelled together on Ctrl+C.
struct Subscribers {
    installed: bool,
    flags: Vec<Weak<AtomicBool>>,
}

static SUBSCRIBERS: Mutex<Subscribers> = Mutex::new(Subscribers {
    installed: false,
    flags: Vec::new(),
});

fn subscribers() -> MutexGuard<'static, Subscribers> {
    SUBSCRIBERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install a Ctrl+C handler and return a fresh token it will cancel.
///
/// `ctrlc` only allows one handler per process. The first call registers
/// it; every call, including the first, returns a new token of its own.
/// A Ctrl+C cancels every token still held by a caller, and one caller
/// cancelling its token never affects another's.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] when the handler cannot be
/// registered.
pub fn install_handler() -> Result<CancellationToken, SignalError> {
    let mut subs = subscribers();

    if !subs.installed {
        match ctrlc::set_handler(on_interrupt) {
            Ok(()) => {}
            Err(ctrlc::Error::MultipleHandlers) => {
                log::debug!("Ctrl+C handler registered elsewhere; tokens will not be signalled");
            }
            Err(e) => return Err(SignalError::InstallFailed(e)),
        }
        subs.installed = true;
    }

    let token = CancellationToken::new();
    subs.flags.retain(|flag| flag.strong_count() > 0);
    subs.flags.push(Arc::downgrade(&token.flag));
    Ok(token)
}

/// Cancel every live token handed out by [`install_handler`].
fn cancel_subscribers() {
    for flag in subscribers().flags.iter().filter_map(Weak::upgrade) {
        flag.store(true, Ordering::SeqCst);
    }
}

fn on_interrupt() {
    cancel_subscribers();

    // stderr is unbuffered on most platforms but flush anyway
    let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
    let _ = std::io::stderr().flush();

    log::info!("Shutdown signal received");
}
