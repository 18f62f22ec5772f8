//! Duplicate finder: the scan engine.
//!
//! # Overview
//!
//! A scan runs in three steps:
//! 1. **Validate** - the root must exist and be a directory
//! 2. **Count** - walk the tree once to learn the progress total
//! 3. **Hash** - walk again, fingerprint every file and feed the
//!    [`DuplicateIndex`], reporting progress after each file
//!
//! Hashing runs on a dedicated rayon pool of `io_threads` workers. Workers
//! send their outcomes over a bounded channel to the thread that started the
//! scan; that thread alone updates the index and calls the progress
//! callback. With `io_threads == 1` the same steps run sequentially on the
//! calling thread.
//!
//! Per-file and per-directory failures are logged, counted in the
//! [`ScanSummary`], and never abort the scan. Only an invalid root and
//! cancellation end a scan early.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let config = FinderConfig::default().with_io_threads(4);
//! let finder = DuplicateFinder::new(config);
//!
//! let (result, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
//! println!("{} duplicate groups in {} files", result.len(), summary.total_files);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::ScanResult;
use super::index::DuplicateIndex;
use crate::progress::{ProgressCallback, ProgressState};
use crate::scanner::{Fingerprint, HashError, Hasher, ScanError, Walker, WalkerConfig};
use crate::signal::CancellationToken;

/// Default number of hashing threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Outcomes buffered per hashing thread before workers wait for the merger.
const CHANNEL_DEPTH_PER_THREAD: usize = 64;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing threads. 1 runs the sequential loop.
    pub io_threads: usize,
    /// Read buffer size for the hasher, in bytes.
    pub buffer_size: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional token for aborting the scan.
    pub cancellation: Option<CancellationToken>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("buffer_size", &self.buffer_size)
            .field("walker_config", &self.walker_config)
            .field("cancellation", &self.cancellation)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            buffer_size: crate::scanner::DEFAULT_BUFFER_SIZE,
            walker_config: WalkerConfig::default(),
            cancellation: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the hasher's read buffer size, clamped to `1..=MAX_BUFFER_SIZE`.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(1, crate::scanner::MAX_BUFFER_SIZE);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Summary statistics from a duplicate scan.
///
/// Counters only; the [`ScanResult`] holds the groups themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Regular files found by the counting pass (the progress total)
    pub total_files: usize,
    /// Files attempted during the hashing pass
    pub processed_files: usize,
    /// Files fingerprinted successfully
    pub hashed_files: usize,
    /// Files that could not be opened or read in full
    pub unreadable_files: usize,
    /// Directories or entries the walker could not read
    pub walk_errors: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies across all groups (files minus one per group)
    pub duplicate_files: usize,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Whether any file or directory had to be skipped.
    #[must_use]
    pub fn had_errors(&self) -> bool {
        self.unreadable_files > 0 || self.walk_errors > 0
    }
}

/// Why a scan root was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRootReason {
    /// Nothing exists at the path.
    NotFound,
    /// The path exists but is not a directory.
    NotADirectory,
    /// The path's metadata could not be read.
    Inaccessible,
}

impl fmt::Display for InvalidRootReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "path does not exist"),
            Self::NotADirectory => write!(f, "not a directory"),
            Self::Inaccessible => write!(f, "path cannot be accessed"),
        }
    }
}

/// Errors that end a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The root path does not exist or is not a directory.
    #[error("Invalid root {path}: {reason}")]
    InvalidRoot {
        /// The rejected root
        path: PathBuf,
        /// Why it was rejected
        reason: InvalidRootReason,
    },

    /// The scan was cancelled (Ctrl+C or a caller-held token).
    #[error("Scan cancelled")]
    Cancelled,
}

impl FinderError {
    /// Whether the scan was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// What a hashing worker hands back to the merging thread.
enum Outcome {
    Hashed {
        seq: usize,
        path: PathBuf,
        result: Result<Fingerprint, HashError>,
    },
    WalkFailed(ScanError),
}

/// Merge-side state of one scan, owned by the calling thread.
struct Accumulator<'a> {
    index: DuplicateIndex,
    progress: ProgressState,
    callback: Option<&'a dyn ProgressCallback>,
    walk_errors: usize,
}

impl<'a> Accumulator<'a> {
    fn new(total: usize, callback: Option<&'a dyn ProgressCallback>) -> Self {
        Self {
            index: DuplicateIndex::new(),
            progress: ProgressState::new(total),
            callback,
            walk_errors: 0,
        }
    }

    fn absorb(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hashed { seq, path, result } => {
                match result {
                    Ok(fingerprint) => {
                        log::trace!("Hashed {}: {}", path.display(), fingerprint);
                        self.index.record(seq, path, fingerprint);
                    }
                    // Cancellation is picked up by the scan loop
                    Err(e) if e.is_cancelled() => {}
                    Err(HashError::NotFound(_)) => {
                        log::debug!("File vanished before hashing: {}", path.display());
                        self.index.record_failure();
                    }
                    Err(e) => {
                        log::warn!("Skipping unreadable file: {}", e);
                        self.index.record_failure();
                    }
                }

                let processed = self.progress.advance();
                if let Some(callback) = self.callback {
                    callback.on_progress(processed, self.progress.total());
                }
            }
            Outcome::WalkFailed(e) => {
                log::warn!("Skipping unreadable directory entry: {}", e);
                self.walk_errors += 1;
            }
        }
    }
}

/// Duplicate finder that runs the scan pipeline.
///
/// # Example
///
/// ```no_run
/// use dupefind::duplicates::DuplicateFinder;
/// use std::path::Path;
///
/// let finder = DuplicateFinder::with_defaults();
/// match finder.find_duplicates(Path::new(".")) {
///     Ok((result, _summary)) => println!("Found {} duplicate groups", result.len()),
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_buffer_size(config.buffer_size);
        if let Some(ref token) = config.cancellation {
            hasher = hasher.with_cancellation(token.clone());
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidRoot`] if `root` does not exist or is
    /// not a directory, and [`FinderError::Cancelled`] if the configured
    /// token is cancelled before the scan completes. Unreadable files and
    /// directories are skipped, never reported as errors.
    pub fn find_duplicates(&self, root: &Path) -> Result<(ScanResult, ScanSummary), FinderError> {
        let start_time = Instant::now();
        validate_root(root)?;

        if self.config.is_cancelled() {
            return Err(FinderError::Cancelled);
        }

        log::info!("Starting duplicate scan of {}", root.display());

        let callback = self.config.progress_callback.as_deref();
        if let Some(callback) = callback {
            callback.on_scan_start(root);
        }

        let outcome = self.run(root, callback);

        if let Some(callback) = callback {
            callback.on_scan_end();
        }

        let (result, mut summary) = outcome?;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} files, {} duplicate groups, {} duplicate files, {} skipped in {:.2?}",
            summary.total_files,
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.unreadable_files + summary.walk_errors,
            summary.scan_duration
        );

        Ok((result, summary))
    }

    fn walker(&self, root: &Path) -> Walker {
        let walker = Walker::new(root, self.config.walker_config.clone());
        match self.config.cancellation {
            Some(ref token) => walker.with_cancellation(token.clone()),
            None => walker,
        }
    }

    fn run(
        &self,
        root: &Path,
        callback: Option<&dyn ProgressCallback>,
    ) -> Result<(ScanResult, ScanSummary), FinderError> {
        let walker = self.walker(root);

        let total = walker.count();
        if self.config.is_cancelled() {
            log::info!("Scan cancelled while counting files");
            return Err(FinderError::Cancelled);
        }

        log::info!("Found {} files to hash", total);
        if let Some(callback) = callback {
            callback.on_count_complete(total);
        }

        let mut acc = Accumulator::new(total, callback);

        if self.config.io_threads <= 1 {
            self.hash_sequential(&walker, &mut acc);
        } else {
            match self.build_pool() {
                Ok(pool) => self.hash_parallel(&walker, &pool, &mut acc),
                Err(e) => {
                    log::warn!(
                        "Failed to create hashing thread pool ({}), hashing sequentially",
                        e
                    );
                    self.hash_sequential(&walker, &mut acc);
                }
            }
        }

        if self.config.is_cancelled() {
            log::info!("Scan cancelled, discarding partial results");
            return Err(FinderError::Cancelled);
        }

        let Accumulator {
            index,
            progress,
            walk_errors,
            ..
        } = acc;

        let mut summary = ScanSummary {
            total_files: total,
            processed_files: progress.processed(),
            hashed_files: index.recorded(),
            unreadable_files: index.failed(),
            walk_errors,
            ..Default::default()
        };

        let result = index.finalize();
        summary.duplicate_groups = result.len();
        summary.duplicate_files = result.duplicate_files();

        Ok((result, summary))
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .thread_name(|i| format!("dupefind-hash-{}", i))
            .build()
    }

    /// Reference implementation: walk, hash and merge on the calling thread.
    fn hash_sequential(&self, walker: &Walker, acc: &mut Accumulator<'_>) {
        for (seq, entry) in walker.walk().enumerate() {
            if self.config.is_cancelled() {
                break;
            }
            acc.absorb(self.hash_entry(seq, entry));
        }
    }

    /// Hash on the pool, merge on the calling thread.
    fn hash_parallel(&self, walker: &Walker, pool: &rayon::ThreadPool, acc: &mut Accumulator<'_>) {
        let (tx, rx) = mpsc::sync_channel::<Outcome>(
            self.config.io_threads * CHANNEL_DEPTH_PER_THREAD,
        );

        pool.in_place_scope(|scope| {
            scope.spawn(move |_| {
                walker
                    .walk()
                    .enumerate()
                    .par_bridge()
                    .for_each_with(tx, |tx, (seq, entry)| {
                        if self.config.is_cancelled() {
                            return;
                        }
                        // The merger hung up; nothing left to do
                        let _ = tx.send(self.hash_entry(seq, entry));
                    });
            });

            // Dropping the receiver on early exit unblocks waiting workers
            for outcome in rx {
                acc.absorb(outcome);
                if self.config.is_cancelled() {
                    break;
                }
            }
        });
    }

    fn hash_entry(&self, seq: usize, entry: Result<PathBuf, ScanError>) -> Outcome {
        match entry {
            Ok(path) => {
                let result = self.hasher.hash_file(&path);
                Outcome::Hashed { seq, path, result }
            }
            Err(e) => Outcome::WalkFailed(e),
        }
    }
}

/// Reject roots that do not exist or are not directories.
fn validate_root(root: &Path) -> Result<(), FinderError> {
    let invalid = |reason| FinderError::InvalidRoot {
        path: root.to_path_buf(),
        reason,
    };

    match std::fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(invalid(InvalidRootReason::NotADirectory)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(invalid(InvalidRootReason::NotFound))
        }
        Err(e) => {
            log::debug!("Cannot stat root {}: {}", root.display(), e);
            Err(invalid(InvalidRootReason::Inaccessible))
        }
    }
}

/// Scan `root` for duplicate files with the default configuration.
///
/// This is the engine's entry point. Progress, if a callback is given, is
/// reported once per file on the calling thread.
///
/// # Errors
///
/// Returns [`FinderError::InvalidRoot`] if `root` does not exist or is not
/// a directory.
///
/// # Example
///
/// ```no_run
/// use dupefind::progress::ProgressCallback;
/// use dupefind::scan;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let progress: Arc<dyn ProgressCallback> = Arc::new(|processed: usize, total: usize| {
///     eprintln!("{processed}/{total}");
/// });
/// let result = scan(Path::new("."), Some(progress)).unwrap();
/// println!("{} duplicate groups", result.len());
/// ```
pub fn scan(
    root: &Path,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<ScanResult, FinderError> {
    let config = FinderConfig {
        progress_callback: progress,
        ..FinderConfig::default()
    };
    DuplicateFinder::new(config)
        .find_duplicates(root)
        .map(|(result, _)| result)
}
