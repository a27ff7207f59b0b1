//! Progress accounting and terminal progress display.
//!
//! This module provides two pieces:
//! - [`ProgressTracker`]: byte-based progress bookkeeping used inside the
//!   scanner. Every file is retired exactly once, and a percentage is only
//!   reported when it strictly increases.
//! - [`ProgressDisplay`]: an indicatif progress bar that the CLI drives from
//!   scan events.
//!
//! # Accessible Mode
//!
//! When accessible mode is enabled the bar uses ASCII characters and no
//! spinner, for screen reader compatibility.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Byte-based progress bookkeeping for one scan.
///
/// Progress is `bytes_classified * 100 / total_bytes`, where a file's bytes
/// are classified the moment it is retired (as unique, as a member of an
/// emitted group, or as unreadable).
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    total_bytes: u64,
    classified_bytes: u64,
    last_percent: u8,
}

impl ProgressTracker {
    /// Create a tracker for a scan covering `total_bytes`.
    #[must_use]
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            classified_bytes: 0,
            last_percent: 0,
        }
    }

    /// Account for `bytes` of newly retired content.
    ///
    /// Returns the new percentage if it is strictly greater than the last one
    /// reported, otherwise `None`.
    pub fn retire(&mut self, bytes: u64) -> Option<u8> {
        self.classified_bytes = self.classified_bytes.saturating_add(bytes);
        debug_assert!(
            self.classified_bytes <= self.total_bytes,
            "classified {} bytes out of {}",
            self.classified_bytes,
            self.total_bytes
        );

        let percent = self.percent();
        if percent > self.last_percent {
            self.last_percent = percent;
            Some(percent)
        } else {
            None
        }
    }

    /// Current percentage, clamped to 100. Zero when there is nothing to scan.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 0;
        }
        let scaled = u128::from(self.classified_bytes) * 100 / u128::from(self.total_bytes);
        scaled.min(100) as u8
    }

    /// Total bytes observed during traversal.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Bytes retired so far.
    #[must_use]
    pub fn classified_bytes(&self) -> u64 {
        self.classified_bytes
    }

    /// Whether every byte has been retired.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.classified_bytes >= self.total_bytes
    }
}

/// Terminal progress bar for the CLI consumer.
pub struct ProgressDisplay {
    bar: ProgressBar,
    accessible: bool,
}

impl ProgressDisplay {
    /// Create a progress bar drawn to stderr.
    ///
    /// When `hidden` is true nothing is drawn, but the display can still be
    /// used so callers need no special casing.
    #[must_use]
    pub fn new(hidden: bool, accessible: bool) -> Self {
        let bar = ProgressBar::new(100);
        if hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }

        let display = Self { bar, accessible };
        display.bar.set_style(display.bar_style());
        display.bar.set_message("Scanning");
        if !hidden && !accessible {
            display.bar.enable_steady_tick(Duration::from_millis(100));
        }
        display
    }

    /// Check if accessible mode is enabled.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    fn bar_style(&self) -> ProgressStyle {
        if self.accessible {
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:40}] {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-")
        } else {
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        }
    }

    /// Move the bar to `percent`.
    pub fn set_percent(&self, percent: u8) {
        self.bar.set_position(u64::from(percent.min(100)));
    }

    /// Update the message shown next to the bar.
    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    /// Run `f` with the bar temporarily cleared, so regular output does not
    /// interleave with the bar.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    /// Finish and clear the bar.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
