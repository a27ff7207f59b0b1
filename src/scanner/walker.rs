//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory tree
//! and collecting the metadata (path and size) of every regular file beneath
//! it. No file content is read here.
//!
//! # Symlinks
//!
//! Directories are never entered through a symlink. A symlink pointing at a
//! regular file is reported with the size of its target; a dangling symlink is
//! skipped.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::{FileRecord, ScanError, WalkerConfig};
use crate::signal::CancellationToken;

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional token for stopping the walk early
    token: Option<CancellationToken>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            token: None,
        }
    }

    /// Stop yielding entries once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Siblings are visited in file-name order, so the output is
    /// deterministic for a given tree.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_cancelled() {
                    log::debug!("Walker: cancellation requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        return None;
                    }

                    let metadata = if file_type.is_symlink() {
                        match std::fs::metadata(&path) {
                            Ok(m) => m,
                            Err(e) => {
                                log::debug!("Skipping unresolved symlink {}: {}", path.display(), e);
                                return None;
                            }
                        }
                    } else {
                        match std::fs::symlink_metadata(&path) {
                            Ok(m) => m,
                            Err(e) => return Some(Err(self.handle_io_error(&path, e))),
                        }
                    };

                    self.process_file_entry(path, &metadata).map(Ok)
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(self.handle_jwalk_error(path, e)))
                }
            })
    }

    /// Turn a metadata result into a record, or `None` if it is not a regular file.
    ///
    /// Zero-length files are kept; identical empty files are duplicates too.
    fn process_file_entry(&self, path: PathBuf, metadata: &Metadata) -> Option<FileRecord> {
        if !metadata.is_file() {
            return None;
        }

        Some(FileRecord::new(path, metadata.len()))
    }

    /// Handle I/O errors during metadata access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }

    /// Handle errors reported by jwalk while reading a directory.
    fn handle_jwalk_error(&self, path: PathBuf, error: jwalk::Error) -> ScanError {
        let source = match error.io_error() {
            Some(io) => std::io::Error::new(io.kind(), error.to_string()),
            None => std::io::Error::other(error.to_string()),
        };

        if source.kind() == std::io::ErrorKind::PermissionDenied {
            log::warn!("Permission denied: {}", path.display());
            return ScanError::PermissionDenied(path);
        }

        log::warn!("Walker error for {}: {}", path.display(), error);
        ScanError::Io { path, source }
    }
}
