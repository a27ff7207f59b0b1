//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Scan a directory, human-readable output with a progress bar
//! dupescan ~/Downloads
//!
//! # JSON lines for scripting, one group per line as soon as it is found
//! dupescan ~/Downloads --output json --no-progress
//!
//! # Compare the first 4 KiB before hashing, read with 2 threads
//! dupescan ~/Downloads --prefix-len 4KiB --io-threads 2
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ConfigOverrides;

/// Progressive duplicate file scanner.
///
/// Files are compared by size, then by their first bytes, then by a full
/// BLAKE3 hash. Duplicate groups are printed as soon as they are proven.
#[derive(Debug, Parser)]
#[command(name = "dupescan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan
    #[arg(value_name = "PATH", required_unless_present = "print_config")]
    pub path: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Bytes compared before full hashing (e.g. 30, 4KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_prefix_len)]
    pub prefix_len: Option<usize>,

    /// Number of I/O threads reading file content (1 = sequential)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Event queue capacity between scanner and output (0 = unbounded)
    #[arg(long, value_name = "N")]
    pub channel_capacity: Option<usize>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Path to a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// ASCII progress bar without animation, for screen readers
    #[arg(long)]
    pub accessible: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Configuration values set explicitly on the command line.
    #[must_use]
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            prefix_len: self.prefix_len,
            io_threads: self.io_threads.map(usize::from),
            channel_capacity: self.channel_capacity,
            skip_hidden: self.skip_hidden.then_some(true),
        }
    }
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// One JSON object per line
    Json,
    /// One CSV row per file
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB (case-insensitive).
/// Numbers without suffix are bytes.
///
/// ```
/// use dupescan::cli::parse_size;
///
/// assert_eq!(parse_size("30").unwrap(), 30);
/// assert_eq!(parse_size("4KiB").unwrap(), 4096);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, not a number, or has an unknown
/// suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (digits, suffix) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => (&s[..idx], s[idx..].trim().to_ascii_uppercase()),
        None => (s, String::new()),
    };

    let num: u64 = digits
        .parse()
        .map_err(|_| format!("Invalid number: '{digits}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1 << 10,
        "MB" | "M" => 1_000_000,
        "MIB" => 1 << 20,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1 << 30,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    num.checked_mul(multiplier)
        .ok_or_else(|| format!("Size too large: '{s}'"))
}

/// Parse a prefix length, which must be at least one byte.
fn parse_prefix_len(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    if bytes == 0 {
        return Err("Prefix length must be at least 1 byte".to_string());
    }
    usize::try_from(bytes).map_err(|_| format!("Prefix length too large: '{s}'"))
}
