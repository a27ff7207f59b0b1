//! Bucket structures for the duplicate funnel.
//!
//! # Overview
//!
//! Files move through three partition passes, each keyed more precisely than
//! the last:
//!
//! 1. [`SizeIndex`]: every traversed file, keyed by exact byte length.
//! 2. Prefix buckets: one size bucket split by its first `K` bytes.
//! 3. Hash buckets: one prefix bucket split by full BLAKE3 digest.
//!
//! Prefix and hash buckets are built with [`partition`] and live only while
//! their parent bucket is being processed. Buckets use `BTreeMap` so they are
//! visited in key order, and members keep traversal order within a bucket.
//!
//! # Example
//!
//! ```
//! use dupescan::duplicates::SizeIndex;
//! use dupescan::scanner::FileRecord;
//! use std::path::PathBuf;
//!
//! let index: SizeIndex = vec![
//!     FileRecord::new(PathBuf::from("/a.txt"), 100),
//!     FileRecord::new(PathBuf::from("/b.txt"), 100),
//!     FileRecord::new(PathBuf::from("/c.txt"), 200),
//! ]
//! .into_iter()
//! .collect();
//!
//! assert_eq!(index.total_files(), 3);
//! assert_eq!(index.total_bytes(), 400);
//! assert_eq!(index.bucket_count(), 2);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scanner::{hash_to_hex, FileRecord, Hash, HashError};

/// Every traversed file, bucketed by exact size.
#[derive(Debug, Clone, Default)]
pub struct SizeIndex {
    buckets: BTreeMap<u64, Vec<FileRecord>>,
    total_bytes: u64,
    total_files: usize,
}

impl SizeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the bucket for its size.
    pub fn insert(&mut self, record: FileRecord) {
        self.total_bytes = self.total_bytes.saturating_add(record.size);
        self.total_files += 1;
        self.buckets.entry(record.size).or_default().push(record);
    }

    /// Sum of the sizes of all indexed files.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of indexed files.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.total_files
    }

    /// Number of distinct sizes.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Check if no files were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_files == 0
    }

    /// Files with exactly `size` bytes, in insertion order.
    #[must_use]
    pub fn bucket(&self, size: u64) -> Option<&[FileRecord]> {
        self.buckets.get(&size).map(Vec::as_slice)
    }

    /// Iterate over buckets in ascending size order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[FileRecord])> {
        self.buckets.iter().map(|(size, files)| (*size, files.as_slice()))
    }

    /// Consume the index bucket by bucket, in ascending size order.
    pub fn into_buckets(self) -> impl Iterator<Item = (u64, Vec<FileRecord>)> {
        self.buckets.into_iter()
    }
}

impl FromIterator<FileRecord> for SizeIndex {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// Result of splitting one bucket by a content-derived key.
#[derive(Debug)]
pub struct Partition<K> {
    /// Sub-buckets keyed by the computed key, members in input order.
    pub buckets: BTreeMap<K, Vec<FileRecord>>,
    /// Files whose key could not be computed.
    pub failed: Vec<(FileRecord, HashError)>,
}

/// Split keyed records into sub-buckets.
///
/// Records arrive paired with the outcome of computing their key. Records
/// whose key failed are set aside in [`Partition::failed`].
pub fn partition<K: Ord>(
    keyed: impl IntoIterator<Item = (FileRecord, Result<K, HashError>)>,
) -> Partition<K> {
    let mut buckets: BTreeMap<K, Vec<FileRecord>> = BTreeMap::new();
    let mut failed = Vec::new();

    for (record, key) in keyed {
        match key {
            Ok(key) => buckets.entry(key).or_default().push(record),
            Err(e) => failed.push((record, e)),
        }
    }

    Partition { buckets, failed }
}

/// Files proven byte-identical: same size, same prefix, same full hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// BLAKE3 hash of the shared content
    pub hash: Hash,
    /// Size of each file in bytes
    pub size: u64,
    /// Paths in traversal order (always two or more)
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a duplicate group from the members of one hash bucket.
    #[must_use]
    pub fn new(hash: Hash, size: u64, files: Vec<FileRecord>) -> Self {
        debug_assert!(files.len() >= 2, "a duplicate group needs two members");
        Self {
            hash,
            size,
            paths: files.into_iter().map(|f| f.path).collect(),
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.paths.len() as u64
    }

    /// Space taken by the redundant copies (all but one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of redundant copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }
}
