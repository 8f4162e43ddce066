//! Configuration for onchange.
//!
//! Every setting can come from a command-line flag, an environment variable,
//! or a built-in default, in that order of precedence.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ONCHANGE_DIR` | `.` | Directory tree to watch |
//! | `ONCHANGE_COMMAND` | (empty) | Shell command to run; empty means log-only |
//! | `ONCHANGE_DEBOUNCE_MS` | 5000 | Quiet period before the command runs |
//! | `ONCHANGE_CHANNEL_CAPACITY` | 1024 | Capacity of the notifier channels |
//! | `ONCHANGE_LOG_FORMAT` | `text` | `text` or `json` |
//!
//! # Example
//!
//! ```no_run
//! use onchange::config::{Config, ConfigOverrides};
//!
//! let config = Config::load(ConfigOverrides {
//!     command: Some("cargo test".to_string()),
//!     ..Default::default()
//! })
//! .expect("Failed to load configuration");
//! println!("Watching: {}", config.watch_dir.display());
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::types::CommandSpec;

/// Default quiet period before the command runs.
pub const DEFAULT_DEBOUNCE_MS: u64 = 5000;

/// Default capacity of the notifier channels.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default directory to watch.
const DEFAULT_WATCH_DIR: &str = ".";

const ENV_DIR: &str = "ONCHANGE_DIR";
const ENV_COMMAND: &str = "ONCHANGE_COMMAND";
const ENV_DEBOUNCE_MS: &str = "ONCHANGE_DEBOUNCE_MS";
const ENV_CHANNEL_CAPACITY: &str = "ONCHANGE_CHANNEL_CAPACITY";
const ENV_LOG_FORMAT: &str = "ONCHANGE_LOG_FORMAT";

/// Errors that can occur while building the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// The watch directory does not exist.
    #[error("directory {0} does not exist")]
    DirectoryNotFound(PathBuf),

    /// The watch path exists but is not a directory.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                key: ENV_LOG_FORMAT.to_string(),
                message: format!("expected 'text' or 'json', got '{other}'"),
            }),
        }
    }
}

impl LogFormat {
    /// Resolves the log format from an optional flag value, then the
    /// environment, then the default.
    ///
    /// Logging is set up before the rest of the configuration is loaded, so
    /// this is resolved on its own.
    pub fn resolve(flag: Option<&str>) -> Result<Self, ConfigError> {
        match flag {
            Some(value) => value.parse(),
            None => match env::var(ENV_LOG_FORMAT) {
                Ok(value) => value.parse(),
                Err(_) => Ok(Self::default()),
            },
        }
    }
}

/// Values supplied on the command line. `None` falls through to the
/// environment and then the default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dir: Option<PathBuf>,
    pub command: Option<String>,
    pub debounce_ms: Option<u64>,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the watched tree. Guaranteed to be an existing directory.
    pub watch_dir: PathBuf,

    /// Command to run after a quiet period. Empty means log-only.
    pub command: String,

    /// Quiet period that must follow the last change before the command runs.
    pub debounce: Duration,

    /// Capacity of the change and error channels fed by the notifier.
    pub channel_capacity: usize,
}

impl Config {
    /// Builds the configuration from environment variables and defaults only.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a numeric variable cannot be parsed, or if
    /// the watch directory is missing or not a directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(ConfigOverrides::default())
    }

    /// Builds the configuration, preferring `overrides` over the environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `ONCHANGE_DEBOUNCE_MS` or the debounce override is zero or not a number
    /// - `ONCHANGE_CHANNEL_CAPACITY` is zero or not a number
    /// - The watch directory does not exist or is not a directory
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let watch_dir = overrides
            .dir
            .or_else(|| env::var(ENV_DIR).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WATCH_DIR));

        let command = overrides
            .command
            .or_else(|| env::var(ENV_COMMAND).ok())
            .unwrap_or_default();

        let debounce_ms = match overrides.debounce_ms {
            Some(ms) => ms,
            None => parse_env_u64(ENV_DEBOUNCE_MS)?.unwrap_or(DEFAULT_DEBOUNCE_MS),
        };
        if debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_DEBOUNCE_MS.to_string(),
                message: "debounce must be greater than 0".to_string(),
            });
        }

        let channel_capacity = match parse_env_u64(ENV_CHANNEL_CAPACITY)? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: ENV_CHANNEL_CAPACITY.to_string(),
                    message: "channel capacity must be greater than 0".to_string(),
                });
            }
            Some(n) => usize::try_from(n).map_err(|_| ConfigError::InvalidValue {
                key: ENV_CHANNEL_CAPACITY.to_string(),
                message: format!("{n} is too large"),
            })?,
            None => DEFAULT_CHANNEL_CAPACITY,
        };

        if !watch_dir.exists() {
            return Err(ConfigError::DirectoryNotFound(watch_dir));
        }
        if !watch_dir.is_dir() {
            return Err(ConfigError::NotADirectory(watch_dir));
        }

        Ok(Self {
            watch_dir,
            command,
            debounce: Duration::from_millis(debounce_ms),
            channel_capacity,
        })
    }

    /// The command and its working directory, as handed to the dispatcher.
    #[must_use]
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec::new(self.command.clone(), self.watch_dir.clone())
    }
}

/// Reads an optional unsigned integer from the environment.
fn parse_env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected positive integer, got '{val}'"),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to run tests with isolated environment variables.
    /// Clears all ONCHANGE_* vars before the test and restores them after.
    fn with_clean_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let saved_vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with("ONCHANGE_"))
            .collect();

        for (key, _) in &saved_vars {
            env::remove_var(key);
        }

        let result = f();

        for (key, _) in env::vars().filter(|(k, _)| k.starts_with("ONCHANGE_")) {
            env::remove_var(key);
        }
        for (key, value) in saved_vars {
            env::set_var(key, value);
        }

        result
    }

    fn dir_override(dir: &tempfile::TempDir) -> ConfigOverrides {
        ConfigOverrides {
            dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        with_clean_env(|| {
            let config = Config::from_env().expect("current directory exists");

            assert_eq!(config.watch_dir, PathBuf::from("."));
            assert_eq!(config.command, "");
            assert_eq!(config.debounce, Duration::from_millis(DEFAULT_DEBOUNCE_MS));
            assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        });
    }

    #[test]
    #[serial]
    fn test_env_values() {
        with_clean_env(|| {
            let temp = tempfile::tempdir().unwrap();
            env::set_var("ONCHANGE_DIR", temp.path());
            env::set_var("ONCHANGE_COMMAND", "make test");
            env::set_var("ONCHANGE_DEBOUNCE_MS", "250");
            env::set_var("ONCHANGE_CHANNEL_CAPACITY", "64");

            let config = Config::from_env().expect("should parse env config");

            assert_eq!(config.watch_dir, temp.path());
            assert_eq!(config.command, "make test");
            assert_eq!(config.debounce, Duration::from_millis(250));
            assert_eq!(config.channel_capacity, 64);
        });
    }

    #[test]
    #[serial]
    fn test_overrides_take_precedence() {
        with_clean_env(|| {
            let env_dir = tempfile::tempdir().unwrap();
            let flag_dir = tempfile::tempdir().unwrap();
            env::set_var("ONCHANGE_DIR", env_dir.path());
            env::set_var("ONCHANGE_COMMAND", "from-env");
            env::set_var("ONCHANGE_DEBOUNCE_MS", "250");

            let config = Config::load(ConfigOverrides {
                dir: Some(flag_dir.path().to_path_buf()),
                command: Some("from-flag".to_string()),
                debounce_ms: Some(75),
            })
            .unwrap();

            assert_eq!(config.watch_dir, flag_dir.path());
            assert_eq!(config.command, "from-flag");
            assert_eq!(config.debounce, Duration::from_millis(75));
        });
    }

    #[test]
    #[serial]
    fn test_missing_directory_rejected() {
        with_clean_env(|| {
            let result = Config::load(ConfigOverrides {
                dir: Some(PathBuf::from("/nonexistent/onchange/root")),
                ..Default::default()
            });

            assert!(matches!(result, Err(ConfigError::DirectoryNotFound(_))));
        });
    }

    #[test]
    #[serial]
    fn test_file_as_root_rejected() {
        with_clean_env(|| {
            let temp = tempfile::tempdir().unwrap();
            let file = temp.path().join("plain.txt");
            std::fs::write(&file, "x").unwrap();

            let result = Config::load(ConfigOverrides {
                dir: Some(file),
                ..Default::default()
            });

            assert!(matches!(result, Err(ConfigError::NotADirectory(_))));
        });
    }

    #[test]
    #[serial]
    fn test_invalid_debounce_rejected() {
        with_clean_env(|| {
            let temp = tempfile::tempdir().unwrap();
            env::set_var("ONCHANGE_DEBOUNCE_MS", "soon");

            let err = Config::load(dir_override(&temp)).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, .. } if key == "ONCHANGE_DEBOUNCE_MS"
            ));
        });
    }

    #[test]
    #[serial]
    fn test_zero_debounce_rejected() {
        with_clean_env(|| {
            let temp = tempfile::tempdir().unwrap();
            let err = Config::load(ConfigOverrides {
                debounce_ms: Some(0),
                ..dir_override(&temp)
            })
            .unwrap_err();

            assert_eq!(
                err.to_string(),
                "invalid value for ONCHANGE_DEBOUNCE_MS: debounce must be greater than 0"
            );
        });
    }

    #[test]
    #[serial]
    fn test_zero_channel_capacity_rejected() {
        with_clean_env(|| {
            let temp = tempfile::tempdir().unwrap();
            env::set_var("ONCHANGE_CHANNEL_CAPACITY", "0");

            let err = Config::load(dir_override(&temp)).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref key, .. } if key == "ONCHANGE_CHANNEL_CAPACITY"
            ));
        });
    }

    #[test]
    #[serial]
    fn test_command_spec_uses_watch_dir() {
        with_clean_env(|| {
            let temp = tempfile::tempdir().unwrap();
            let config = Config::load(ConfigOverrides {
                command: Some("echo hi".to_string()),
                ..dir_override(&temp)
            })
            .unwrap();

            let spec = config.command_spec();
            assert_eq!(spec.command_text, "echo hi");
            assert_eq!(spec.working_dir, temp.path());
        });
    }

    #[test]
    #[serial]
    fn test_log_format_resolution() {
        with_clean_env(|| {
            assert_eq!(LogFormat::resolve(None).unwrap(), LogFormat::Text);

            env::set_var("ONCHANGE_LOG_FORMAT", "json");
            assert_eq!(LogFormat::resolve(None).unwrap(), LogFormat::Json);
            assert_eq!(LogFormat::resolve(Some("TEXT")).unwrap(), LogFormat::Text);

            assert!(LogFormat::resolve(Some("yaml")).is_err());
        });
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::DirectoryNotFound(PathBuf::from("/tmp/proj"));
        assert_eq!(err.to_string(), "directory /tmp/proj does not exist");

        let err = ConfigError::NotADirectory(PathBuf::from("/tmp/file"));
        assert_eq!(err.to_string(), "/tmp/file is not a directory");
    }
}
