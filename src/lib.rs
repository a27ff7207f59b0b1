//! dupescan - progressive duplicate file scanner.
//!
//! Files are narrowed down by size, then by their first bytes, then by a full
//! BLAKE3 hash. Each duplicate group is reported the moment it is proven,
//! alongside a byte-based progress percentage, so results appear long before
//! the whole tree has been read.
//!
//! The library can be driven synchronously through
//! [`duplicates::DuplicateScanner::scan`] with any [`duplicates::ScanSink`], or
//! on a background thread with [`worker::start_scan`].

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod worker;

use std::io::IsTerminal;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::ScanEvent;
use crate::error::ExitCode;
use crate::progress::ProgressDisplay;
use crate::signal::CancellationToken;

/// Run the command-line application and return the exit code to use.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the scan cannot start,
/// or results cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !std::io::stdout().is_terminal() {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref(), &cli.config_overrides())
        .context("Failed to load configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::Success);
    }

    let path = cli
        .path
        .as_deref()
        .context("No directory given")?;

    let token = CancellationToken::new();
    if let Err(e) = signal::install_handler(&token) {
        log::warn!("{}; Ctrl+C will not stop the scan gracefully", e);
    }

    let handle = worker::start_scan(path, config.scanner_config(), token)
        .with_context(|| format!("Cannot scan {}", path.display()))?;

    let hide_progress = cli.no_progress || cli.quiet || !std::io::stderr().is_terminal();
    let progress = ProgressDisplay::new(hide_progress, cli.accessible);
    let mut out = output::writer_for(cli.output, std::io::stdout().lock());

    let mut finished = None;
    let mut reader_gone = false;
    for event in handle.events() {
        match event {
            ScanEvent::Progress(percent) => {
                if percent > 0 {
                    progress.set_message("Comparing");
                }
                progress.set_percent(percent);
            }
            ScanEvent::Duplicates(group) => {
                if let Err(e) = progress.suspend(|| out.write_group(&group)) {
                    handle.cancel();
                    if e.is_broken_pipe() {
                        log::debug!("Output closed, stopping scan");
                        reader_gone = true;
                        break;
                    }
                    progress.finish();
                    return Err(e).context("Failed to write results");
                }
            }
            ScanEvent::Finished(summary) => finished = Some(summary),
        }
    }
    progress.finish();

    let summary = match finished {
        Some(summary) => summary,
        None => handle.wait().context("Scan worker stopped unexpectedly")?,
    };

    if reader_gone {
        return Ok(ExitCode::from_summary(&summary));
    }

    let exit_code = ExitCode::from_summary(&summary);
    if let Err(e) = out.finish(&summary, exit_code) {
        if !e.is_broken_pipe() {
            return Err(e).context("Failed to write summary");
        }
    }

    Ok(exit_code)
}
