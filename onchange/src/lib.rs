//! onchange - run a shell command once a directory tree goes quiet.
//!
//! This crate watches a directory tree for file creations and writes and,
//! after a configurable quiet period, runs a shell command in the watched
//! directory.
//!
//! # Overview
//!
//! Every directory under the watch root is registered with the platform
//! notifier at startup (and again when new directories appear). Change
//! records flow through a classifier into a trailing-edge debouncer, which
//! runs the command once per burst of activity.
//!
//! # Modules
//!
//! - [`types`]: Change records, command spec and process results
//! - [`config`]: Configuration from flags and environment variables
//! - [`error`]: Error types for startup failures
//! - [`enumerate`]: Directory enumeration and registration
//! - [`notifier`]: Adapter over the `notify` crate
//! - [`classify`]: Which changes trigger the command
//! - [`debounce`]: The burst coalescer
//! - [`dispatch`]: Shell selection and command execution
//! - [`event_loop`]: The watch loop and session wiring

pub mod classify;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod enumerate;
pub mod error;
pub mod event_loop;
pub mod notifier;
pub mod types;

pub use config::{Config, ConfigError, ConfigOverrides, LogFormat};
pub use debounce::{Coalescer, DEFAULT_DEBOUNCE_MS};
pub use dispatch::{shell_invocation, Dispatcher, HostOs, ShellInvocation};
pub use enumerate::{enumerate_directories, register_tree, Registrar};
pub use error::{OnchangeError, Result};
pub use event_loop::{run_session, EventLoop, LoopStats};
pub use notifier::{Notifier, NotifierChannels, WatcherError};
pub use types::{ChangeRecord, CommandSpec, Operation, ProcessResult};
