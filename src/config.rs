//! Layered application configuration.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config <FILE>`, or `config.toml` in the platform
//!    config directory when present
//! 3. Environment variables prefixed `DUPEFIND_` (e.g. `DUPEFIND_IO_THREADS=8`)
//! 4. Command-line flags ([`Config::apply_scan_args`])
//!
//! ```toml
//! io_threads = 8
//! buffer_size = 65536
//! skip_hidden = true
//! ignore_patterns = ["*.tmp", "node_modules/"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::duplicates::{FinderConfig, DEFAULT_IO_THREADS};
use crate::scanner::{WalkerConfig, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPEFIND_";

/// Errors from loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A layer could not be parsed or had the wrong shape.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("Invalid configuration: {field} must be at least 1")]
    Invalid {
        /// The offending setting
        field: &'static str,
    },

    /// A value exceeds its upper bound.
    #[error("Invalid configuration: {field} must be at most {max}")]
    TooLarge {
        /// The offending setting
        field: &'static str,
        /// Largest accepted value
        max: usize,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}

/// Scan settings after all layers are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashing threads; 1 hashes sequentially.
    pub io_threads: usize,
    /// Hasher read buffer in bytes.
    pub buffer_size: usize,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Gitignore-style patterns to exclude.
    pub ignore_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl Config {
    /// The platform-specific default config file, if a home directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupefind").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the defaults < file < environment stack.
    ///
    /// With `file == None` the default path is used when it exists.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let file = file.map(Path::to_path_buf).or_else(Self::default_path);
        if let Some(path) = file {
            log::debug!("Reading config file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load and validate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if `file` was given but does not
    /// exist, [`ConfigError::Load`] if any layer fails to parse, and
    /// [`ConfigError::Invalid`] or [`ConfigError::TooLarge`] if a value is
    /// out of range.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = file {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
        }

        let config: Config = Self::figment(file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] or [`ConfigError::TooLarge`] naming
    /// the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "io_threads",
            });
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid {
                field: "buffer_size",
            });
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::TooLarge {
                field: "buffer_size",
                max: MAX_BUFFER_SIZE,
            });
        }
        Ok(())
    }

    /// Apply command-line flags, the top layer.
    ///
    /// Flags that were not given leave the merged value alone; ignore
    /// patterns from the command line are appended.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(size) = args.buffer_size {
            self.buffer_size = size;
        }
        self.follow_symlinks |= args.follow_symlinks;
        self.skip_hidden |= args.skip_hidden;
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.follow_symlinks,
            self.skip_hidden,
            self.ignore_patterns.clone(),
        )
    }

    /// Finder settings derived from this configuration.
    ///
    /// Cancellation and progress are attached by the caller.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_buffer_size(self.buffer_size)
            .with_walker_config(self.walker_config())
    }
}
