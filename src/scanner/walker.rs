//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for enumerating every regular
//! file under a root directory. A scan walks the tree twice: once to count
//! files for the progress denominator, once to feed the hashers. Children of
//! each directory are visited in file-name order, so both passes see the
//! same sequence as long as the tree is not modified in between.
//!
//! # Features
//!
//! - Lazy, recursive traversal
//! - Deterministic order (sorted by file name at every level)
//! - Optional symlink following with loop detection
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file filtering
//! - Early termination via [`CancellationToken`]
//!
//! Directories that cannot be listed are yielded as [`ScanError`] items and
//! the walk continues with the rest of the tree.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, ScanError, WalkerConfig};
use crate::signal::CancellationToken;

/// Directory walker for regular file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional token for early termination
    cancellation: Option<CancellationToken>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            cancellation: None,
        }
    }

    /// Stop iteration as soon as `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The root this walker starts from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Build the ignore matcher from the configured patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Count the regular files [`Walker::walk`] would yield.
    ///
    /// Errors are not counted.
    #[must_use]
    pub fn count(&self) -> usize {
        self.walk().filter(Result::is_ok).count()
    }

    /// Walk the directory tree, yielding regular file paths.
    ///
    /// Returns a lazy iterator. Errors are yielded as [`ScanError`] values
    /// rather than stopping iteration; directories and other non-regular
    /// entries are never yielded.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let filter = EntryFilter {
            root: self.root.clone(),
            skip_hidden: self.config.skip_hidden,
            gitignore: self.build_gitignore(),
        };

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| filter.keep(entry))
            .take_while(move |_| {
                if self.is_cancelled() {
                    log::debug!("Walker: cancellation requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |result| match result {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        Some(Ok(entry.into_path()))
                    } else {
                        if !entry.file_type().is_dir() {
                            log::trace!("Skipping non-regular entry: {}", entry.path().display());
                        }
                        None
                    }
                }
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    /// Convert a walkdir error into a [`ScanError`].
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if let Some(ancestor) = error.loop_ancestor() {
            log::debug!(
                "Symlink loop: {} points back to {}",
                path.display(),
                ancestor.display()
            );
            return ScanError::SymlinkLoop(path);
        }

        let message = error.to_string();
        match error.into_io_error() {
            Some(io) => match io.kind() {
                ErrorKind::PermissionDenied => {
                    log::debug!("Permission denied: {}", path.display());
                    ScanError::PermissionDenied(path)
                }
                ErrorKind::NotFound => {
                    log::debug!("Entry not found (may have been deleted): {}", path.display());
                    ScanError::NotFound(path)
                }
                _ => {
                    log::debug!("I/O error for {}: {}", path.display(), io);
                    ScanError::Io { path, source: io }
                }
            },
            None => {
                log::debug!("Walker error for {}: {}", path.display(), message);
                ScanError::Io {
                    path,
                    source: std::io::Error::other(message),
                }
            }
        }
    }
}

/// Entry pruning applied while descending.
struct EntryFilter {
    root: PathBuf,
    skip_hidden: bool,
    gitignore: Option<Gitignore>,
}

impl EntryFilter {
    fn keep(&self, entry: &DirEntry) -> bool {
        // Never prune the root itself, even if it is hidden
        if entry.depth() == 0 {
            return true;
        }

        if self.skip_hidden && is_hidden(entry) {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return false;
        }

        if let Some(ref gitignore) = self.gitignore {
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if gitignore
                .matched(relative, entry.file_type().is_dir())
                .is_ignore()
            {
                log::trace!("Ignoring: {}", entry.path().display());
                return false;
            }
        }

        true
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
