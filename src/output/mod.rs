//! Streaming result writers.
//!
//! Each writer receives duplicate groups one at a time, as the scanner
//! resolves them, and a closing summary once the scan has finished:
//! - [`TextOutput`]: human-readable listing
//! - [`JsonOutput`]: JSON lines, one object per group then a summary object
//! - [`CsvOutput`]: one row per file, for spreadsheets
//!
//! # Example
//!
//! ```no_run
//! use dupescan::cli::OutputFormat;
//! use dupescan::duplicates::{DuplicateScanner, ScanEvent};
//! use dupescan::error::ExitCode;
//! use dupescan::output::writer_for;
//! use dupescan::signal::CancellationToken;
//! use std::path::Path;
//!
//! let mut events = Vec::new();
//! let summary = DuplicateScanner::with_defaults()
//!     .scan(Path::new("."), &CancellationToken::new(), &mut events)
//!     .unwrap();
//!
//! let mut out = writer_for(OutputFormat::Json, std::io::stdout());
//! for event in &events {
//!     if let ScanEvent::Duplicates(group) = event {
//!         out.write_group(group).unwrap();
//!     }
//! }
//! out.finish(&summary, ExitCode::from_summary(&summary)).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io;

use thiserror::Error;

use crate::cli::OutputFormat;
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::text::TextOutput;

/// Errors that can occur while writing results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

impl OutputError {
    /// Whether the reader on the other end went away (e.g. `| head`).
    #[must_use]
    pub fn is_broken_pipe(&self) -> bool {
        let kind = match self {
            Self::Io(e) => Some(e.kind()),
            Self::Json(e) => e.io_error_kind(),
            Self::Csv(e) => match e.kind() {
                ::csv::ErrorKind::Io(io) => Some(io.kind()),
                _ => None,
            },
        };
        kind == Some(io::ErrorKind::BrokenPipe)
    }
}

/// Sink for scan results in some output format.
pub trait ResultWriter {
    /// Write one duplicate group. Called in emission order.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if the group cannot be written.
    fn write_group(&mut self, group: &DuplicateGroup) -> Result<(), OutputError>;

    /// Write the closing summary and flush.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if the summary cannot be written.
    fn finish(&mut self, summary: &ScanSummary, exit_code: ExitCode) -> Result<(), OutputError>;
}

/// Build the writer for `format` on top of `out`.
pub fn writer_for<W: io::Write + 'static>(
    format: OutputFormat,
    out: W,
) -> Box<dyn ResultWriter> {
    match format {
        OutputFormat::Text => Box::new(TextOutput::new(out)),
        OutputFormat::Json => Box::new(JsonOutput::new(out)),
        OutputFormat::Csv => Box::new(CsvOutput::new(out)),
    }
}
