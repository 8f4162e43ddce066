//! Filesystem change notifier.
//!
//! Thin adapter over the [`notify`] crate. Raw events are split into one
//! [`ChangeRecord`] per path and forwarded, together with watcher errors, on
//! two bounded tokio channels.
//!
//! The notify callback runs on the backend's own thread and is kept
//! lightweight: it converts and forwards with `try_send`, never blocking.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use onchange::enumerate::register_tree;
//! use onchange::notifier::Notifier;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut notifier, mut channels) = Notifier::new(1024)?;
//!     register_tree(Path::new("."), &mut notifier)?;
//!
//!     while let Some(record) = channels.changes.recv().await {
//!         println!("{} {}", record.operation, record.path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::classify::operation_for_path;
use crate::enumerate::Registrar;
use crate::types::ChangeRecord;

/// Errors that can occur while setting up the watch.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to initialize the file system watcher.
    #[error("failed to create watcher: {0}")]
    WatcherInit(#[from] notify::Error),

    /// A directory could not be registered.
    #[error("cannot watch {path}: {reason}")]
    Register { path: PathBuf, reason: String },

    /// The directory tree could not be walked.
    #[error("cannot read {path}: {reason}")]
    Walk { path: PathBuf, reason: String },
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Receiving ends of the notifier's two streams.
#[derive(Debug)]
pub struct NotifierChannels {
    /// One record per changed path, in delivery order.
    pub changes: mpsc::Receiver<ChangeRecord>,
    /// Errors reported by the backend (queue overflow, lost watches, ...).
    pub errors: mpsc::Receiver<notify::Error>,
}

/// Owns the platform watcher. Dropping it stops all watches.
pub struct Notifier {
    watcher: RecommendedWatcher,
    registered: usize,
}

impl Notifier {
    /// Creates the platform watcher and its channels.
    ///
    /// No directory is watched until [`Registrar::register`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::WatcherInit`] if the backend cannot be created
    /// (for example when the inotify instance limit is exhausted).
    pub fn new(capacity: usize) -> Result<(Self, NotifierChannels)> {
        let (change_tx, changes) = mpsc::channel(capacity);
        let (error_tx, errors) = mpsc::channel(capacity);

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                forward_notify_event(res, &change_tx, &error_tx);
            },
            Config::default(),
        )?;

        Ok((
            Self {
                watcher,
                registered: 0,
            },
            NotifierChannels { changes, errors },
        ))
    }

    /// Number of directories registered so far.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.registered
    }
}

impl Registrar for Notifier {
    fn register(&mut self, dir: &Path) -> Result<()> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::Register {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
        self.registered += 1;
        Ok(())
    }
}

/// Converts a notify callback result into channel messages.
fn forward_notify_event(
    res: notify::Result<Event>,
    change_tx: &mpsc::Sender<ChangeRecord>,
    error_tx: &mpsc::Sender<notify::Error>,
) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            if let Err(send_err) = error_tx.try_send(e) {
                warn!(error = %send_err, "Failed to queue watcher error, channel may be full");
            }
            return;
        }
    };

    trace!(kind = ?event.kind, paths = ?event.paths, "Received notify event");

    for record in change_records(&event) {
        // Dropping a record is preferable to blocking the backend thread.
        if let Err(e) = change_tx.try_send(record) {
            warn!(error = %e, "Failed to queue change record, channel may be full");
        }
    }
}

/// Splits a notify event into one record per affected path.
fn change_records(event: &Event) -> impl Iterator<Item = ChangeRecord> + '_ {
    event
        .paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            ChangeRecord::new(path.clone(), operation_for_path(&event.kind, index))
        })
}
