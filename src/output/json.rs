//! JSON lines output.
//!
//! Each duplicate group is written as one line the moment it is found, and a
//! single summary line closes the stream:
//!
//! ```json
//! {"type":"group","id":1,"hash":"af13...","size":1024,"files":["/a","/b"]}
//! {"type":"summary","total_files":3,"total_bytes":3072,"duplicate_groups":1,...}
//! ```
//!
//! Consumers can act on groups while the scan is still running.

use std::io::Write;

use serde::Serialize;

use super::{OutputError, ResultWriter};
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// One line of output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonRecord {
    /// A duplicate group
    Group(JsonDuplicateGroup),
    /// Closing statistics
    Summary(JsonSummary),
}

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// 1-based position in emission order
    pub id: usize,
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// Size of each file in bytes
    pub size: u64,
    /// Member paths in traversal order
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Convert a group, numbering it `id`.
    #[must_use]
    pub fn new(id: usize, group: &DuplicateGroup) -> Self {
        Self {
            id,
            hash: group.hash_hex(),
            size: group.size,
            files: group
                .paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub total_bytes: u64,
    pub classified_bytes: u64,
    pub unique_files: usize,
    pub duplicate_groups: usize,
    /// Redundant copies (excluding one original per group)
    pub duplicate_files: usize,
    pub reclaimable_bytes: u64,
    pub skipped_entries: usize,
    pub failed_reads: usize,
    pub scan_duration_ms: u64,
    pub cancelled: bool,
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g. "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a scan summary and the process exit code.
    #[must_use]
    pub fn new(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_bytes: summary.total_bytes,
            classified_bytes: summary.classified_bytes,
            unique_files: summary.unique_files,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_bytes: summary.reclaimable_bytes,
            skipped_entries: summary.skipped_entries,
            failed_reads: summary.failed_reads,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            cancelled: summary.cancelled,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// JSON lines writer.
pub struct JsonOutput<W: Write> {
    out: W,
    groups_written: usize,
}

impl<W: Write> JsonOutput<W> {
    /// Create a JSON lines writer.
    pub fn new(out: W) -> Self {
        Self {
            out,
            groups_written: 0,
        }
    }

    /// Consume the writer, returning the inner output.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_record(&mut self, record: &JsonRecord) -> Result<(), OutputError> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> ResultWriter for JsonOutput<W> {
    fn write_group(&mut self, group: &DuplicateGroup) -> Result<(), OutputError> {
        self.groups_written += 1;
        let record = JsonRecord::Group(JsonDuplicateGroup::new(self.groups_written, group));
        self.write_record(&record)
    }

    fn finish(&mut self, summary: &ScanSummary, exit_code: ExitCode) -> Result<(), OutputError> {
        self.write_record(&JsonRecord::Summary(JsonSummary::new(summary, exit_code)))
    }
}
