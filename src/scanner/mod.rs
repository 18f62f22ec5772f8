//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Deterministic recursive directory walking using walkdir
//! - Streaming content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and regular file discovery
//! - [`hasher`]: BLAKE3 file fingerprinting (streaming, bounded buffer)
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::{Hasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let hasher = Hasher::new();
//!
//! println!("{} files to hash", walker.count());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => match hasher.hash_file(&path) {
//!             Ok(fingerprint) => println!("{fingerprint}  {}", path.display()),
//!             Err(e) => eprintln!("Warning: {}", e),
//!         },
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{Fingerprint, Hasher, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
pub use walker::Walker;

/// A regular file discovered during a scan.
///
/// Paths are joined onto the scan root as given by the caller, so they are
/// absolute when the root is absolute and root-relative otherwise.
pub type FileEntry = PathBuf;

/// Configuration for directory walking.
///
/// Controls symlink handling and filtering of the traversal.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Loops are detected and reported as errors, nothing more.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style), matched against
    /// paths relative to the walk root.
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Create a new configuration.
    ///
    /// # Arguments
    ///
    /// * `follow_symlinks` - Whether to follow symbolic links
    /// * `skip_hidden` - Whether to skip hidden files
    /// * `ignore_patterns` - Glob patterns to ignore
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool, ignore_patterns: Vec<String>) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            ignore_patterns,
        }
    }

    /// Set whether symbolic links are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set whether hidden entries are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Set the ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Errors that can occur during directory scanning.
///
/// These never abort a walk: the walker yields them in place of the
/// subtree it could not read and carries on.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when listing a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry vanished between being listed and being read.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A symbolic link points back at one of its ancestors.
    #[error("Symlink loop at {0}")]
    SymlinkLoop(PathBuf),

    /// An I/O error occurred while listing a directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
///
/// A hashing failure excludes that one file from the scan.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found (deleted, or a dangling symlink).
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because the scan was cancelled.
    #[error("Hashing cancelled: {0}")]
    Cancelled(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Whether this failure came from cancellation rather than the file.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
