//! Error types for onchange.
//!
//! Only startup can fail. Once the event loop runs, notifier errors and
//! command failures are logged and never surface as `OnchangeError`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::notifier::WatcherError;

/// Errors that abort startup.
///
/// # Examples
///
/// ```no_run
/// use onchange::config::Config;
/// use onchange::enumerate::register_tree;
/// use onchange::error::OnchangeError;
/// use onchange::notifier::Notifier;
///
/// fn start() -> Result<(), OnchangeError> {
///     let config = Config::from_env()?;
///     let (mut notifier, _channels) = Notifier::new(config.channel_capacity)?;
///     register_tree(&config.watch_dir, &mut notifier)?;
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum OnchangeError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notifier construction or directory registration error.
    #[error("file watch error: {0}")]
    Watch(#[from] WatcherError),
}

/// A specialized `Result` type for onchange operations.
pub type Result<T> = std::result::Result<T, OnchangeError>;
