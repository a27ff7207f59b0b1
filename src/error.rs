//! Exit codes and machine-readable error reports.

use serde::Serialize;

use crate::duplicates::ScanSummary;

/// Process exit codes for dupescan.
///
/// - 0: scan completed and duplicates were found
/// - 1: the scan could not start (bad path, bad config)
/// - 2: scan completed, no duplicates
/// - 3: scan completed, but some entries or files were skipped
/// - 130: cancelled by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were found.
    Success = 0,
    /// An error prevented the scan.
    GeneralError = 1,
    /// No duplicates were found.
    NoDuplicates = 2,
    /// Completed with non-fatal errors.
    PartialSuccess = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code used in JSON error reports.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code describing how a scan ended.
    ///
    /// Cancellation wins over everything, then skipped files, then whether
    /// any group was found.
    #[must_use]
    pub fn from_summary(summary: &ScanSummary) -> Self {
        if summary.cancelled {
            Self::Interrupted
        } else if summary.has_errors() {
            Self::PartialSuccess
        } else if summary.duplicate_groups > 0 {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }
}

/// Error report printed to stderr with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code such as "DS001"
    pub code: String,
    /// Numeric exit code
    pub exit_code: i32,
    /// Human-readable message, including the error chain
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report from an error and the exit code it maps to.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
