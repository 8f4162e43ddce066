//! The top-level watch loop.
//!
//! [`EventLoop`] waits on the notifier's change and error channels. Each
//! qualifying change is logged and pokes the [`Coalescer`]; everything else is
//! logged and dropped. Errors never end the loop; only the shutdown future or
//! the closing of both channels does.
//!
//! [`run_session`] wires the whole pipeline together for the binary.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::classify::{qualifies, relative_path};
use crate::config::Config;
use crate::debounce::Coalescer;
use crate::dispatch::Dispatcher;
use crate::enumerate::{register_tree, Registrar};
use crate::error::Result;
use crate::notifier::{Notifier, NotifierChannels};
use crate::types::{ChangeRecord, Operation};

/// Counters for one loop run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Change records received.
    pub changes: u64,
    /// Change records that triggered the coalescer.
    pub qualifying: u64,
    /// Notifier errors received.
    pub errors: u64,
    /// Directories registered after startup.
    pub registered_at_runtime: u64,
}

/// Routes notifier output into the coalescer.
///
/// Owns the registrar (normally the [`Notifier`]) so the platform watcher
/// lives exactly as long as the loop.
pub struct EventLoop<R: Registrar> {
    root: PathBuf,
    coalescer: Coalescer,
    registrar: R,
    stats: LoopStats,
}

impl<R: Registrar> EventLoop<R> {
    pub fn new(root: impl Into<PathBuf>, coalescer: Coalescer, registrar: R) -> Self {
        Self {
            root: root.into(),
            coalescer,
            registrar,
            stats: LoopStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    #[must_use]
    pub fn coalescer(&self) -> &Coalescer {
        &self.coalescer
    }

    /// Handles one change record. Returns `true` if it qualified.
    pub fn handle_change(&mut self, record: ChangeRecord) -> bool {
        self.stats.changes += 1;
        let relative = relative_path(&self.root, &record.path);

        if !qualifies(&record) {
            trace!(
                path = %relative.display(),
                operation = %record.operation,
                "Ignoring change"
            );
            return false;
        }

        info!(path = %relative.display(), operation = %record.operation, "File changed");

        if record.operation == Operation::Create && record.path.is_dir() {
            self.register_new_directory(&record.path);
        }

        self.stats.qualifying += 1;
        self.coalescer.notify();
        true
    }

    /// Handles one notifier error. The loop carries on regardless.
    pub fn handle_error(&mut self, err: notify::Error) {
        self.stats.errors += 1;
        error!(error = %err, paths = ?err.paths, "Watcher error");
    }

    /// Watches a directory that appeared after startup, with its subtree.
    ///
    /// Failures here are logged only: the loop is already running.
    fn register_new_directory(&mut self, dir: &Path) {
        match register_tree(dir, &mut self.registrar) {
            Ok(count) => {
                self.stats.registered_at_runtime += count as u64;
                debug!(dir = %dir.display(), count, "Watching new directory");
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to watch new directory");
            }
        }
    }

    /// Runs until `shutdown` resolves or both channels close.
    ///
    /// Cancels any pending action on the way out and returns the counters.
    pub async fn run<S>(mut self, channels: NotifierChannels, shutdown: S) -> LoopStats
    where
        S: Future<Output = ()>,
    {
        let NotifierChannels {
            mut changes,
            mut errors,
        } = channels;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                Some(record) = changes.recv() => {
                    self.handle_change(record);
                }

                Some(err) = errors.recv() => {
                    self.handle_error(err);
                }

                else => {
                    debug!("Notifier channels closed");
                    break;
                }
            }
        }

        self.coalescer.cancel();
        self.stats
    }
}

/// Runs a complete watch session for `config` until `shutdown` resolves.
///
/// Startup is all-or-nothing: if the notifier cannot be created or any
/// directory cannot be registered, this returns an error before anything is
/// watched and before `Watching directory` is printed.
///
/// # Errors
///
/// Returns an error only for startup failures.
pub async fn run_session<S>(config: &Config, shutdown: S) -> Result<LoopStats>
where
    S: Future<Output = ()>,
{
    let (mut notifier, channels) = Notifier::new(config.channel_capacity)?;
    let registered = register_tree(&config.watch_dir, &mut notifier)?;

    println!("Watching directory: {}", config.watch_dir.display());
    info!(
        watch_dir = %config.watch_dir.display(),
        directories = registered,
        debounce_ms = config.debounce.as_millis(),
        command = %config.command,
        "Watching directory"
    );
    if config.command.trim().is_empty() {
        info!("No command configured, logging changes only");
    }

    let dispatcher = Arc::new(Dispatcher::new(config.command_spec()));
    let coalescer = Coalescer::new(config.debounce, move || {
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            dispatcher.dispatch().await;
        }
    });

    let event_loop = EventLoop::new(config.watch_dir.clone(), coalescer, notifier);
    Ok(event_loop.run(channels, shutdown).await)
}
