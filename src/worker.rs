//! Background scan worker.
//!
//! [`start_scan`] validates the root on the calling thread, then moves the
//! funnel onto a dedicated thread. Events reach the caller through a
//! crossbeam channel, in the order the scanner produced them, ending with
//! exactly one [`ScanEvent::Finished`].
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{ScanEvent, ScannerConfig};
//! use dupescan::signal::CancellationToken;
//! use dupescan::worker::start_scan;
//! use std::path::Path;
//!
//! let handle = start_scan(Path::new("."), ScannerConfig::default(), CancellationToken::new())?;
//! for event in handle.events() {
//!     match event {
//!         ScanEvent::Progress(p) => println!("{p}%"),
//!         ScanEvent::Duplicates(group) => println!("{:?}", group.paths),
//!         ScanEvent::Finished(summary) => println!("{} groups", summary.duplicate_groups),
//!     }
//! }
//! # Ok::<(), dupescan::duplicates::FinderError>(())
//! ```

use std::path::Path;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::duplicates::{
    validate_root, DuplicateGroup, DuplicateScanner, FinderError, ScanSink, ScanSummary,
    ScannerConfig,
};
use crate::signal::CancellationToken;

pub use crate::duplicates::ScanEvent;

/// Sink that forwards events over a channel.
///
/// A failed send means the receiver is gone; the scan is cancelled so the
/// worker stops doing I/O nobody will see.
struct ChannelSink {
    tx: Sender<ScanEvent>,
    token: CancellationToken,
}

impl ChannelSink {
    fn send(&self, event: ScanEvent) {
        if self.tx.send(event).is_err() && !self.token.is_cancelled() {
            log::debug!("Event receiver dropped, cancelling scan");
            self.token.cancel();
        }
    }
}

impl ScanSink for ChannelSink {
    fn on_progress(&mut self, percent: u8) {
        self.send(ScanEvent::Progress(percent));
    }

    fn on_duplicate_group(&mut self, group: DuplicateGroup) {
        self.send(ScanEvent::Duplicates(group));
    }

    fn on_finished(&mut self, summary: &ScanSummary) {
        self.send(ScanEvent::Finished(summary.clone()));
    }
}

/// Handle to a scan running on a background thread.
///
/// Dropping the handle cancels the scan and joins the worker.
#[derive(Debug)]
pub struct ScanHandle {
    receiver: Receiver<ScanEvent>,
    token: CancellationToken,
    join: Option<JoinHandle<ScanSummary>>,
}

impl ScanHandle {
    /// Blocking iterator over scan events.
    ///
    /// The iterator ends after [`ScanEvent::Finished`], once the worker has
    /// dropped its sender.
    pub fn events(&self) -> crossbeam_channel::Iter<'_, ScanEvent> {
        self.receiver.iter()
    }

    /// The raw event receiver, for use with `select!` or timeouts.
    #[must_use]
    pub fn receiver(&self) -> &Receiver<ScanEvent> {
        &self.receiver
    }

    /// The token controlling this scan.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request cancellation. The worker still delivers `Finished`.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the worker to exit and return its summary.
    ///
    /// Events not yet received are discarded. Returns `None` if the worker
    /// thread panicked.
    #[must_use]
    pub fn wait(mut self) -> Option<ScanSummary> {
        self.join_worker()
    }

    fn join_worker(&mut self) -> Option<ScanSummary> {
        let join = self.join.take()?;
        // Drain so a worker blocked on a full channel can reach the end.
        for _ in self.receiver.iter() {}
        match join.join() {
            Ok(summary) => Some(summary),
            Err(_) => {
                log::error!("Scan worker panicked");
                None
            }
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.token.cancel();
            let _ = self.join_worker();
        }
    }
}

/// Start scanning `root` on a background thread.
///
/// The root is validated before the thread is spawned, so a bad root is
/// reported here and no events are produced.
///
/// # Errors
///
/// Returns [`FinderError`] if the root is invalid or the thread cannot be
/// spawned.
pub fn start_scan(
    root: &Path,
    config: ScannerConfig,
    token: CancellationToken,
) -> Result<ScanHandle, FinderError> {
    let root = validate_root(root)?;

    let (tx, rx) = if config.channel_capacity == 0 {
        unbounded()
    } else {
        bounded(config.channel_capacity)
    };

    let worker_token = token.clone();
    let join = thread::Builder::new()
        .name("dupescan-worker".to_string())
        .spawn(move || {
            let scanner = DuplicateScanner::new(config);
            let mut sink = ChannelSink {
                tx,
                token: worker_token.clone(),
            };
            scanner.scan_validated(&root, &worker_token, &mut sink)
        })
        .map_err(FinderError::Spawn)?;

    Ok(ScanHandle {
        receiver: rx,
        token,
        join: Some(join),
    })
}
