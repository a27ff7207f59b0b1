//! Layered configuration.
//!
//! Settings are merged with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `DUPESCAN_` (e.g. `DUPESCAN_IO_THREADS=8`)
//! 4. Command-line flags
//!
//! A missing default config file is not an error. A file named explicitly
//! with `--config` must exist.
//!
//! # Example file
//!
//! ```toml
//! prefix_len = 64
//! io_threads = 2
//! channel_capacity = 0
//! skip_hidden = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::ScannerConfig;
use crate::scanner::{WalkerConfig, PREFIX_LEN};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DUPESCAN_";

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has the wrong type.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value parsed but is out of range.
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The effective configuration could not be rendered as TOML.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Effective scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Leading bytes compared before full hashing
    pub prefix_len: usize,
    /// Threads reading file content within one bucket
    pub io_threads: usize,
    /// Worker event channel capacity (0 = unbounded)
    pub channel_capacity: usize,
    /// Skip dot-files and dot-directories
    pub skip_hidden: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix_len: PREFIX_LEN,
            io_threads: 4,
            channel_capacity: 1024,
            skip_hidden: false,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_hidden: Option<bool>,
}

impl Config {
    /// Platform config file location, e.g. `~/.config/dupescan/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupescan").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Figment holding defaults, the file layer and the environment layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` is given but missing.
    pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default) = Self::default_path() {
                    log::trace!("Looking for config at {}", default.display());
                    figment = figment.merge(Toml::file(default));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load and validate the configuration with all four layers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer is malformed or a value is invalid.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path)?
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Reject values the scanner cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix_len == 0 {
            return Err(ConfigError::Invalid {
                field: "prefix_len",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "io_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Scanner settings derived from this configuration.
    #[must_use]
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::default()
            .with_prefix_len(self.prefix_len)
            .with_io_threads(self.io_threads)
            .with_channel_capacity(self.channel_capacity)
            .with_walker_config(WalkerConfig::new(self.skip_hidden))
    }

    /// Render as TOML, suitable for a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
