//! Human-readable output.
//!
//! ```text
//! Group 1: 2 files, 12 B each [3f9a1c2e0b7d]
//!   /home/user/a.txt
//!   /home/user/b.txt
//!
//! Scanned 3 files (29 B) in 0.01s
//! 1 duplicate group, 1 redundant file, 12 B reclaimable
//! ```
//!
//! Colors come from `yansi` and follow its global switch.

use std::io::Write;

use bytesize::ByteSize;
use yansi::Paint;

use super::{OutputError, ResultWriter};
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// Characters of the hash shown in group headers.
const SHORT_HASH_LEN: usize = 12;

/// Text writer.
pub struct TextOutput<W: Write> {
    out: W,
    groups_written: usize,
}

impl<W: Write> TextOutput<W> {
    /// Create a text writer.
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
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

impl<W: Write> ResultWriter for TextOutput<W> {
    fn write_group(&mut self, group: &DuplicateGroup) -> Result<(), OutputError> {
        self.groups_written += 1;
        let hash = group.hash_hex();
        let header = format!("Group {}:", self.groups_written);

        writeln!(
            self.out,
            "{} {}, {} each {}",
            header.bold(),
            plural(group.len(), "file", "files"),
            ByteSize::b(group.size).to_string().cyan(),
            format!("[{}]", &hash[..SHORT_HASH_LEN]).dim()
        )?;
        for path in &group.paths {
            writeln!(self.out, "  {}", path.display())?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self, summary: &ScanSummary, exit_code: ExitCode) -> Result<(), OutputError> {
        writeln!(
            self.out,
            "Scanned {} ({}) in {:.2}s",
            plural(summary.total_files, "file", "files"),
            ByteSize::b(summary.total_bytes),
            summary.scan_duration.as_secs_f64()
        )?;

        if summary.duplicate_groups == 0 {
            writeln!(self.out, "{}", "No duplicates found".green())?;
        } else {
            writeln!(
                self.out,
                "{}, {}, {} reclaimable",
                plural(summary.duplicate_groups, "duplicate group", "duplicate groups"),
                plural(summary.duplicate_files, "redundant file", "redundant files"),
                ByteSize::b(summary.reclaimable_bytes).to_string().yellow().bold()
            )?;
        }

        if summary.has_errors() {
            writeln!(
                self.out,
                "{}",
                format!(
                    "Skipped {} and {} due to errors",
                    plural(summary.skipped_entries, "entry", "entries"),
                    plural(summary.failed_reads, "unreadable file", "unreadable files")
                )
                .yellow()
            )?;
        }

        if exit_code == ExitCode::Interrupted {
            writeln!(self.out, "{}", "Scan cancelled; results are partial".red())?;
        }

        self.out.flush()?;
        Ok(())
    }
}
