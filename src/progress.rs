//! Progress reporting for duplicate scans.
//!
//! The engine reports progress through the [`ProgressCallback`] trait, so it
//! never depends on a particular presentation. [`TerminalProgress`] is the
//! indicatif-backed implementation used by the command-line front end.
//!
//! # Contract
//!
//! - `on_progress(processed, total)` is called once per hashing attempt,
//!   successful or not, on the thread that started the scan.
//! - `processed` never decreases and `total` stays constant for one scan.
//! - A scan with no files never calls `on_progress`, so a nonzero total is
//!   never reported for an empty directory. Implementations must still not
//!   divide by `total` without checking it.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for duplicate scans.
///
/// Only [`on_progress`](ProgressCallback::on_progress) is required; the
/// other hooks default to no-ops.
pub trait ProgressCallback: Send + Sync {
    /// Called when a scan of `root` begins, before counting.
    fn on_scan_start(&self, _root: &Path) {}

    /// Called once the counting pass has established `total`.
    fn on_count_complete(&self, _total: usize) {}

    /// Called after each file's hashing attempt.
    ///
    /// # Arguments
    ///
    /// * `processed` - Files attempted so far (1-based, non-decreasing)
    /// * `total` - Files found by the counting pass
    fn on_progress(&self, processed: usize, total: usize);

    /// Called when the scan finishes, whether it succeeded or was cancelled.
    fn on_scan_end(&self) {}
}

/// Any `Fn(usize, usize)` closure can serve as a progress callback.
impl<F> ProgressCallback for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, processed: usize, total: usize) {
        self(processed, total);
    }
}

/// Transient (processed, total) pair owned by one scan.
#[derive(Debug, Default)]
pub struct ProgressState {
    processed: AtomicUsize,
    total: usize,
}

impl ProgressState {
    /// Start tracking a scan of `total` files.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            processed: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one more processed file and return the new count.
    pub fn advance(&self) -> usize {
        self.processed.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Files processed so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Acquire)
    }

    /// Files found by the counting pass.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Completion percentage, or `None` when there is nothing to process.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.processed() as f64 / self.total as f64 * 100.0)
        }
    }
}

/// Progress reporter using indicatif.
///
/// Shows a spinner while counting, then a bar sized to the file count.
pub struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl TerminalProgress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupefind::progress::TerminalProgress;
    ///
    /// let progress = TerminalProgress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn counting_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn hashing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn replace_bar(&self, bar: Option<ProgressBar>) {
        let previous = match self.bar.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, bar),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), bar),
        };
        if let Some(previous) = previous {
            previous.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref bar) = *guard {
                f(bar);
            }
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_scan_start(&self, root: &Path) {
        if self.quiet {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_draw_target(ProgressDrawTarget::stderr());
        spinner.set_style(Self::counting_style());
        spinner.set_message(format!("Counting files in {}", truncate_path(root, 50)));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.replace_bar(Some(spinner));
    }

    fn on_count_complete(&self, total: usize) {
        if self.quiet {
            return;
        }

        if total == 0 {
            self.replace_bar(None);
            return;
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.set_style(Self::hashing_style());
        bar.set_message("Hashing");
        self.replace_bar(Some(bar));
    }

    fn on_progress(&self, processed: usize, _total: usize) {
        if self.quiet {
            return;
        }
        self.with_bar(|bar| bar.set_position(processed as u64));
    }

    fn on_scan_end(&self) {
        if self.quiet {
            return;
        }
        self.replace_bar(None);
    }
}

/// Shorten a path for display, keeping its tail.
fn truncate_path(path: &Path, max_len: usize) -> String {
    let display = path.display().to_string();
    let chars: Vec<char> = display.chars().collect();
    if chars.len() <= max_len {
        return display;
    }

    let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
    format!("...{}", tail)
}
