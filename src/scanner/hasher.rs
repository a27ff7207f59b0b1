//! Prefix reads and BLAKE3 file hashing.
//!
//! # Overview
//! The [`Hasher`] offers the two content reads the duplicate pipeline needs:
//! - [`Hasher::prefix`]: the first `min(size, K)` bytes of a file, used as a
//!   cheap pre-filter between same-sized files.
//! - [`Hasher::full_hash`]: a BLAKE3 digest over the complete content,
//!   streamed through a fixed buffer so memory use does not grow with file size.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::HashError;

/// BLAKE3 digest (32 bytes).
pub type Hash = [u8; 32];

/// Default number of leading bytes compared before full hashing.
pub const PREFIX_LEN: usize = 30;

/// Read buffer used for streaming full hashes.
const BUFFER_SIZE: usize = 64 * 1024;

/// Content reader for the prefix and full-hash phases.
#[derive(Debug, Clone)]
pub struct Hasher {
    prefix_len: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher reading [`PREFIX_LEN`] leading bytes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix_len: PREFIX_LEN,
        }
    }

    /// Set the number of leading bytes read by [`Hasher::prefix`].
    ///
    /// Values below 1 are raised to 1.
    #[must_use]
    pub fn with_prefix_len(mut self, len: usize) -> Self {
        self.prefix_len = len.max(1);
        self
    }

    /// Number of leading bytes read by [`Hasher::prefix`].
    #[must_use]
    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// Read the first `min(size, prefix_len)` bytes of a file.
    ///
    /// `size` is the length recorded during traversal. If the file shrank
    /// since then, fewer bytes are returned.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn prefix(&self, path: &Path, size: u64) -> Result<Vec<u8>, HashError> {
        let limit = size.min(self.prefix_len as u64);
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        let mut buf = Vec::with_capacity(limit as usize);
        file.take(limit)
            .read_to_end(&mut buf)
            .map_err(|e| HashError::from_io(path, e))?;

        Ok(buf)
    }

    /// Compute the BLAKE3 hash of the complete file content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

/// Render a hash as lowercase hexadecimal (64 characters).
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
