//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping
//! - Prefix comparison of same-size files
//! - Full hash comparison of same-prefix files
//! - Streaming duplicate groups to a [`ScanSink`] as they resolve

pub mod finder;
pub mod groups;

pub use finder::{
    validate_root, DuplicateScanner, FinderError, ScanEvent, ScanSink, ScanSummary, ScannerConfig,
};
pub use groups::{partition, DuplicateGroup, Partition, SizeIndex};
