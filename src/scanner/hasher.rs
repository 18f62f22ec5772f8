//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing the
//! [`Fingerprint`] of a file's full content. Files are streamed through a
//! fixed-size buffer (8 KiB by default), so memory use does not grow with
//! file size.
//!
//! Two files with equal fingerprints are treated as duplicates. BLAKE3
//! produces 256-bit digests; the collision risk is accepted in place of a
//! byte-by-byte comparison.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let fingerprint = hasher.hash_file(Path::new("Cargo.toml")).unwrap();
//! println!("{fingerprint}");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::HashError;
use crate::signal::CancellationToken;

/// Default read buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Largest read buffer a hasher will allocate (16 MiB).
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// 256-bit BLAKE3 digest of a file's content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; Fingerprint::LEN]);

impl Fingerprint {
    /// Digest length in bytes.
    pub const LEN: usize = blake3::OUT_LEN;

    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Lowercase hexadecimal form (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// Parse the hexadecimal form produced by [`Fingerprint::to_hex`].
    ///
    /// Returns `None` unless `hex` is exactly 64 hex digits.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        blake3::Hash::from_hex(hex)
            .ok()
            .map(|hash| Self(*hash.as_bytes()))
    }
}

impl From<blake3::Hash> for Fingerprint {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl FromStr for Fingerprint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| format!("Invalid fingerprint: '{}'", s))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(serde::de::Error::custom)
    }
}

/// Streaming BLAKE3 file hasher.
///
/// A `Hasher` is cheap to clone and holds no per-file state; one instance
/// is shared by every hashing worker of a scan.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
    cancellation: Option<CancellationToken>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 8 KiB buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            cancellation: None,
        }
    }

    /// Set the read buffer size in bytes, clamped to `1..=MAX_BUFFER_SIZE`.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Abort hashing between chunks once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The configured read buffer size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Compute the fingerprint of a file's full content.
    ///
    /// Zero-byte files produce the fingerprint of the empty byte sequence.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read in full,
    /// or if cancellation is requested while it is being read.
    pub fn hash_file(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.digest(&mut file, path)
    }

    /// Compute the fingerprint of everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if a read fails or cancellation is requested.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> Result<Fingerprint, HashError> {
        self.digest(&mut reader, Path::new("<reader>"))
    }

    /// Compute the fingerprint of an in-memory byte slice.
    #[must_use]
    pub fn hash_bytes(bytes: &[u8]) -> Fingerprint {
        Fingerprint::from(blake3::hash(bytes))
    }

    fn digest<R: Read>(&self, reader: &mut R, path: &Path) -> Result<Fingerprint, HashError> {
        let mut state = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            if self.is_cancelled() {
                return Err(HashError::Cancelled(path.to_path_buf()));
            }

            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    state.update(&buffer[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            }
        }

        Ok(Fingerprint::from(state.finalize()))
    }
}
