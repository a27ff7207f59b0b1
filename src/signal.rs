//! Cancellation tokens and Ctrl+C handling.
//!
//! A [`CancellationToken`] wraps an `AtomicBool` that is shared between the
//! caller and the scan worker. The caller sets it; the worker polls it at
//! bucket boundaries and winds down cooperatively.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupescan::signal::{install_handler, CancellationToken};
//!
//! let token = CancellationToken::new();
//! install_handler(&token).expect("Failed to install signal handler");
//!
//! // Pass a clone to the scanner; Ctrl+C now cancels the scan.
//! let for_worker = token.clone();
//! assert!(!for_worker.is_cancelled());
//! ```
//!
//! # Exit Codes
//!
//! A scan stopped by Ctrl+C exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption.
/// This follows Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Cooperative cancellation flag shared between a caller and a scan.
///
/// Cloning is cheap and every clone observes the same flag. Once set, the
/// flag stays set for the lifetime of the token.
///
/// # Thread Safety
///
/// `CancellationToken` is `Send` and `Sync`; the flag uses atomic operations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Token tripped by the process-wide Ctrl+C hook.
static HOOKED_TOKEN: OnceLock<Mutex<CancellationToken>> = OnceLock::new();

/// Route Ctrl+C to `token`.
///
/// The OS hook is registered once per process. Later calls only swap the
/// token it trips, so each new scan can install its own token.
///
/// When Ctrl+C is pressed:
/// 1. The token is cancelled
/// 2. "Interrupted. Finishing scan..." is printed to stderr
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the OS hook cannot be registered.
pub fn install_handler(token: &CancellationToken) -> Result<(), SignalError> {
    if let Some(slot) = HOOKED_TOKEN.get() {
        *slot.lock().unwrap_or_else(|e| e.into_inner()) = token.clone();
        return Ok(());
    }

    let slot = HOOKED_TOKEN.get_or_init(|| Mutex::new(token.clone()));

    ctrlc::set_handler(move || {
        slot.lock().unwrap_or_else(|e| e.into_inner()).cancel();

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing scan...");
        let _ = std::io::stderr().flush();

        log::info!("Shutdown signal received");
    })?;

    Ok(())
}
