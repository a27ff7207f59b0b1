//! CSV output, one row per file in a duplicate group.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number in emission order
//! - `hash`: BLAKE3 content hash (hexadecimal)
//! - `path`: path to the file
//! - `size`: file size in bytes
//!
//! The summary is not part of the CSV stream; it is logged instead.

use std::io;

use serde::Serialize;

use super::{OutputError, ResultWriter};
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    hash: &'a str,
    path: String,
    size: u64,
}

/// CSV writer.
pub struct CsvOutput<W: io::Write> {
    writer: csv::Writer<W>,
    groups_written: usize,
}

impl<W: io::Write> CsvOutput<W> {
    /// Create a CSV writer. The header row is written with the first group.
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            groups_written: 0,
        }
    }

    /// Flush and return the inner output.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if buffered rows cannot be flushed.
    pub fn into_inner(self) -> Result<W, OutputError> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl<W: io::Write> ResultWriter for CsvOutput<W> {
    fn write_group(&mut self, group: &DuplicateGroup) -> Result<(), OutputError> {
        self.groups_written += 1;
        let hash = group.hash_hex();

        for path in &group.paths {
            self.writer.serialize(CsvRow {
                group_id: self.groups_written,
                hash: &hash,
                path: path.to_string_lossy().into_owned(),
                size: group.size,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self, summary: &ScanSummary, exit_code: ExitCode) -> Result<(), OutputError> {
        log::info!(
            "{} duplicate groups in {} files ({})",
            summary.duplicate_groups,
            summary.total_files,
            exit_code.code_prefix()
        );
        self.writer.flush()?;
        Ok(())
    }
}
