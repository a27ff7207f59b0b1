//! Duplicate scanner implementing the progressive detection funnel.
//!
//! # Overview
//!
//! A scan runs in two stages:
//! 1. **Traversal**: walk the tree once, reading only metadata, and build a
//!    [`SizeIndex`](super::SizeIndex) together with the total byte count.
//! 2. **Funnel**: take the size buckets one at a time (ascending size) and
//!    narrow each one:
//!    - split by the first `K` bytes ([`Hasher::prefix`]),
//!    - split each surviving prefix bucket by full BLAKE3 hash.
//!
//! A bucket that shrinks to one member retires that file as unique on the
//! spot; no further I/O touches it. A hash bucket with two or more members is
//! emitted as a [`DuplicateGroup`] immediately, so consumers see results while
//! the scan continues.
//!
//! Progress is byte-based: each retired file adds its size to the classified
//! total, and a percentage is emitted whenever it strictly increases.
//!
//! Cancellation is checked before every size, prefix and hash bucket. A
//! cancelled scan still ends with exactly one `on_finished` call.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateScanner, ScanEvent, ScannerConfig};
//! use dupescan::signal::CancellationToken;
//! use std::path::Path;
//!
//! let scanner = DuplicateScanner::new(ScannerConfig::default());
//! let token = CancellationToken::new();
//! let mut events: Vec<ScanEvent> = Vec::new();
//!
//! let summary = scanner.scan(Path::new("."), &token, &mut events).unwrap();
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! ```

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{partition, DuplicateGroup, SizeIndex};
use crate::progress::ProgressTracker;
use crate::scanner::{FileRecord, Hash, HashError, Hasher, Walker, WalkerConfig, PREFIX_LEN};
use crate::signal::CancellationToken;

/// Configuration for the duplicate scanner.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Number of leading bytes compared before full hashing.
    pub prefix_len: usize,
    /// Number of I/O threads used to read the members of one bucket.
    /// Default is 4 to prevent disk thrashing; 1 reads sequentially.
    pub io_threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Event channel capacity used by the background worker (0 = unbounded).
    pub channel_capacity: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            prefix_len: PREFIX_LEN,
            io_threads: 4,
            walker_config: WalkerConfig::default(),
            channel_capacity: 1024,
        }
    }
}

impl ScannerConfig {
    /// Set the number of leading bytes compared before full hashing.
    #[must_use]
    pub fn with_prefix_len(mut self, len: usize) -> Self {
        self.prefix_len = len.max(1);
        self
    }

    /// Set the I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the worker's event channel capacity. Zero selects an unbounded channel.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// Event produced by a scan, in delivery order.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Percentage of bytes classified so far (strictly increasing).
    Progress(u8),
    /// A resolved set of byte-identical files.
    Duplicates(DuplicateGroup),
    /// Terminal event; nothing follows it.
    Finished(ScanSummary),
}

/// Receiver of scan events.
///
/// Within one scan, groups arrive before the progress update that accounts
/// for their bytes, and `on_finished` is always the last call.
pub trait ScanSink {
    /// Called when the classified percentage strictly increases.
    fn on_progress(&mut self, percent: u8);

    /// Called as soon as a duplicate group is resolved.
    fn on_duplicate_group(&mut self, group: DuplicateGroup);

    /// Called exactly once when the scan stops, for any reason.
    fn on_finished(&mut self, summary: &ScanSummary);
}

impl ScanSink for Vec<ScanEvent> {
    fn on_progress(&mut self, percent: u8) {
        self.push(ScanEvent::Progress(percent));
    }

    fn on_duplicate_group(&mut self, group: DuplicateGroup) {
        self.push(ScanEvent::Duplicates(group));
    }

    fn on_finished(&mut self, summary: &ScanSummary) {
        self.push(ScanEvent::Finished(summary.clone()));
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of regular files found by traversal
    pub total_files: usize,
    /// Sum of the sizes of those files
    pub total_bytes: u64,
    /// Bytes retired before the scan stopped
    pub classified_bytes: u64,
    /// Number of distinct file sizes
    pub unique_sizes: usize,
    /// Files retired as unique
    pub unique_files: usize,
    /// Number of duplicate groups emitted
    pub duplicate_groups: usize,
    /// Redundant copies across all groups (excluding one original per group)
    pub duplicate_files: usize,
    /// Bytes that removing the redundant copies would free
    pub reclaimable_bytes: u64,
    /// Directory entries skipped during traversal (permission denied, vanished)
    pub skipped_entries: usize,
    /// Files dropped because their content could not be read
    pub failed_reads: usize,
    /// Whether the scan stopped on a cancellation request
    pub cancelled: bool,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Whether any entry or file was skipped because of an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.skipped_entries > 0 || self.failed_reads > 0
    }

    /// Percentage of scanned bytes held by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.reclaimable_bytes as f64 / self.total_bytes as f64) * 100.0
        }
    }
}

/// Errors that prevent a scan from starting.
///
/// Once a scan is running, per-file problems are absorbed and counted in the
/// [`ScanSummary`] instead.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// No path was given.
    #[error("No directory given")]
    EmptyPath,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root directory exists but cannot be read.
    #[error("Cannot read directory {path}: {source}")]
    Unreadable {
        /// Root path that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker thread could not be started.
    #[error("Failed to start scan worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Check that `path` is a readable directory and return its absolute form.
///
/// # Errors
///
/// Returns [`FinderError`] if the path is empty, missing, not a directory, or
/// cannot be listed.
pub fn validate_root(path: &Path) -> Result<PathBuf, FinderError> {
    if path.as_os_str().is_empty() {
        return Err(FinderError::EmptyPath);
    }

    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FinderError::PathNotFound(path.to_path_buf()),
        _ => FinderError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(FinderError::NotADirectory(path.to_path_buf()));
    }

    let unreadable = |source| FinderError::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    std::fs::read_dir(path).map_err(unreadable)?;
    std::fs::canonicalize(path).map_err(unreadable)
}

/// Bookkeeping for one scan: event delivery, progress and statistics.
struct ScanRun<'a> {
    sink: &'a mut dyn ScanSink,
    token: &'a CancellationToken,
    tracker: ProgressTracker,
    summary: ScanSummary,
}

impl ScanRun<'_> {
    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn retire(&mut self, bytes: u64) {
        if let Some(percent) = self.tracker.retire(bytes) {
            self.sink.on_progress(percent);
        }
    }

    fn retire_unique(&mut self, record: &FileRecord, size: u64) {
        log::trace!("Unique: {}", record.path.display());
        self.summary.unique_files += 1;
        self.retire(size);
    }

    fn drop_unreadable(&mut self, failed: Vec<(FileRecord, HashError)>, size: u64) {
        for (record, error) in failed {
            log::warn!("Skipping unreadable file {}: {}", record.path.display(), error);
            self.summary.failed_reads += 1;
            self.retire(size);
        }
    }

    fn emit(&mut self, group: DuplicateGroup) {
        log::debug!(
            "Duplicate group {}: {} files, {} bytes each",
            group.hash_hex(),
            group.len(),
            group.size
        );
        let bytes = group.total_size();
        self.summary.duplicate_groups += 1;
        self.summary.duplicate_files += group.duplicate_count();
        self.summary.reclaimable_bytes += group.wasted_space();
        self.sink.on_duplicate_group(group);
        self.retire(bytes);
    }

    fn finish(mut self, started: Instant, cancelled: bool) -> ScanSummary {
        self.summary.cancelled = cancelled;
        self.summary.classified_bytes = self.tracker.classified_bytes();
        self.summary.scan_duration = started.elapsed();
        debug_assert!(cancelled || self.tracker.is_complete());

        self.sink.on_finished(&self.summary);
        self.summary
    }
}

/// Duplicate scanner that runs the size → prefix → full-hash funnel.
pub struct DuplicateScanner {
    config: ScannerConfig,
    hasher: Hasher,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for DuplicateScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateScanner")
            .field("config", &self.config)
            .field("pool", &self.pool.as_ref().map(|_| "<pool>"))
            .finish()
    }
}

impl DuplicateScanner {
    /// Create a scanner with the given configuration.
    #[must_use]
    pub fn new(config: ScannerConfig) -> Self {
        let hasher = Hasher::new().with_prefix_len(config.prefix_len);

        let pool = if config.io_threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.io_threads)
                .thread_name(|i| format!("dupescan-io-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("Failed to create I/O thread pool, reading sequentially: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            config,
            hasher,
            pool,
        }
    }

    /// Create a scanner with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ScannerConfig::default())
    }

    /// The configuration this scanner was built with.
    #[must_use]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan `root` for duplicate files, reporting to `sink` as results resolve.
    ///
    /// The root is validated first; if that fails the error is returned and
    /// `sink` receives nothing. Otherwise `sink.on_finished` is called exactly
    /// once, after every other event, whether the scan ran to completion or
    /// stopped on `token`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if the root is empty, missing, not a directory,
    /// or unreadable.
    pub fn scan(
        &self,
        root: &Path,
        token: &CancellationToken,
        sink: &mut dyn ScanSink,
    ) -> Result<ScanSummary, FinderError> {
        let root = validate_root(root)?;
        Ok(self.scan_validated(&root, token, sink))
    }

    /// Scan a root already checked by [`validate_root`].
    pub(crate) fn scan_validated(
        &self,
        root: &Path,
        token: &CancellationToken,
        sink: &mut dyn ScanSink,
    ) -> ScanSummary {
        let started = Instant::now();
        let mut run = ScanRun {
            sink,
            token,
            tracker: ProgressTracker::default(),
            summary: ScanSummary::default(),
        };

        log::info!("Starting duplicate scan of {}", root.display());

        let Some(index) = self.build_index(root, &mut run) else {
            log::info!("Scan cancelled during traversal");
            return run.finish(started, true);
        };

        run.tracker = ProgressTracker::new(index.total_bytes());
        run.summary.total_files = index.total_files();
        run.summary.total_bytes = index.total_bytes();
        run.summary.unique_sizes = index.bucket_count();

        log::info!(
            "Traversal complete: {} files, {} bytes, {} distinct sizes",
            index.total_files(),
            index.total_bytes(),
            index.bucket_count()
        );

        if index.total_bytes() == 0 {
            log::info!("No bytes to compare, scan complete");
            return run.finish(started, false);
        }

        for (size, files) in index.into_buckets() {
            if run.is_cancelled() {
                log::info!("Scan cancelled");
                return run.finish(started, true);
            }
            if self.resolve_size_bucket(&mut run, size, files).is_break() {
                log::info!("Scan cancelled");
                return run.finish(started, true);
            }
        }

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} bytes reclaimable",
            run.summary.duplicate_groups,
            run.summary.duplicate_files,
            run.summary.reclaimable_bytes
        );

        run.finish(started, false)
    }

    /// Walk the tree and index every file by size.
    ///
    /// Returns `None` if cancellation was observed during the walk.
    fn build_index(&self, root: &Path, run: &mut ScanRun<'_>) -> Option<SizeIndex> {
        let walker = Walker::new(root, self.config.walker_config.clone())
            .with_cancellation(run.token.clone());

        let mut index = SizeIndex::new();
        for result in walker.walk() {
            if run.is_cancelled() {
                return None;
            }
            match result {
                Ok(record) => index.insert(record),
                Err(e) => {
                    log::trace!("Skipped entry {}", e.path().display());
                    run.summary.skipped_entries += 1;
                }
            }
        }

        if run.is_cancelled() {
            return None;
        }
        Some(index)
    }

    /// Narrow one size bucket down to unique files and duplicate groups.
    fn resolve_size_bucket(
        &self,
        run: &mut ScanRun<'_>,
        size: u64,
        files: Vec<FileRecord>,
    ) -> ControlFlow<()> {
        self.narrow_bucket(
            run,
            size,
            files,
            |f| self.hasher.prefix(&f.path, f.size),
            |f| self.hasher.full_hash(&f.path),
        )
    }

    /// Run the prefix and full-hash stages over one size bucket using the
    /// given key functions.
    fn narrow_bucket<P, H>(
        &self,
        run: &mut ScanRun<'_>,
        size: u64,
        files: Vec<FileRecord>,
        prefix_key: P,
        hash_key: H,
    ) -> ControlFlow<()>
    where
        P: Fn(&FileRecord) -> Result<Vec<u8>, HashError> + Sync,
        H: Fn(&FileRecord) -> Result<Hash, HashError> + Sync,
    {
        if let [only] = files.as_slice() {
            run.retire_unique(only, size);
            return ControlFlow::Continue(());
        }

        log::debug!("Size bucket {} bytes: {} candidates", size, files.len());

        let by_prefix = partition(self.read_keys(files, &prefix_key));
        run.drop_unreadable(by_prefix.failed, size);

        for (_, members) in by_prefix.buckets {
            if run.is_cancelled() {
                return ControlFlow::Break(());
            }
            if let [only] = members.as_slice() {
                run.retire_unique(only, size);
                continue;
            }

            log::trace!("Prefix bucket of {} files at size {}", members.len(), size);

            let by_hash = partition(self.read_keys(members, &hash_key));
            run.drop_unreadable(by_hash.failed, size);

            for (hash, members) in by_hash.buckets {
                if run.is_cancelled() {
                    return ControlFlow::Break(());
                }
                if let [only] = members.as_slice() {
                    run.retire_unique(only, size);
                    continue;
                }
                run.emit(DuplicateGroup::new(hash, size, members));
            }
        }

        ControlFlow::Continue(())
    }

    /// Compute a content key for every file, keeping input order.
    fn read_keys<K, F>(
        &self,
        files: Vec<FileRecord>,
        key: F,
    ) -> Vec<(FileRecord, Result<K, HashError>)>
    where
        K: Send,
        F: Fn(&FileRecord) -> Result<K, HashError> + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| {
                files
                    .into_par_iter()
                    .map(|f| {
                        let k = key(&f);
                        (f, k)
                    })
                    .collect()
            }),
            None => files
                .into_iter()
                .map(|f| {
                    let k = key(&f);
                    (f, k)
                })
                .collect(),
        }
    }
}
