use clap::Parser;
use dupescan::cli::Cli;
use dupescan::config::{Config, ConfigError, ConfigOverrides};
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all DUPESCAN_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DUPESCAN_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
prefix_len = 128
io_threads = 2
skip_hidden = true
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path), &ConfigOverrides::default()).unwrap();

    assert_eq!(config.prefix_len, 128);
    assert_eq!(config.io_threads, 2);
    assert!(config.skip_hidden);
    // Unset keys keep their defaults
    assert_eq!(config.channel_capacity, 1024);
}

#[test]
fn test_config_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 2\nprefix_len = 16\n").unwrap();

    std::env::set_var("DUPESCAN_IO_THREADS", "8");
    let config = Config::load(Some(&path), &ConfigOverrides::default());
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.io_threads, 8);
    assert_eq!(config.prefix_len, 16);
}

#[test]
fn test_config_cli_overrides_everything() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 2\n").unwrap();

    std::env::set_var("DUPESCAN_IO_THREADS", "8");
    let cli = Cli::try_parse_from([
        "dupescan",
        "/scan/me",
        "--io-threads",
        "3",
        "--skip-hidden",
    ])
    .unwrap();
    let config = Config::load(Some(&path), &cli.config_overrides());
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.io_threads, 3);
    assert!(config.skip_hidden);
}

#[test]
fn test_config_missing_explicit_file_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();

    let err = Config::load(
        Some(&dir.path().join("absent.toml")),
        &ConfigOverrides::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_config_rejects_invalid_values() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    fs::write(&path, "prefix_len = 0\n").unwrap();
    let err = Config::load(Some(&path), &ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "prefix_len", .. }));

    fs::write(&path, "io_threads = \"many\"\n").unwrap();
    let err = Config::load(Some(&path), &ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_config_round_trips_through_toml() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let original = Config {
        prefix_len: 4096,
        io_threads: 1,
        channel_capacity: 0,
        skip_hidden: true,
    };
    fs::write(&path, original.to_toml().unwrap()).unwrap();

    let loaded = Config::load(Some(&path), &ConfigOverrides::default()).unwrap();
    assert_eq!(loaded, original);
}
