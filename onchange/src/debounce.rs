//! Trailing-edge debounce for change bursts.
//!
//! A [`Coalescer`] turns any number of [`Coalescer::notify`] calls into a
//! single callback execution that happens once no further call has arrived
//! for the configured delay.
//!
//! # Architecture
//!
//! The coalescer owns a single timer slot behind a mutex. On every notify:
//!
//! 1. The armed timer task, if any, is aborted
//! 2. A new timer task is spawned that sleeps until `now + delay`
//! 3. When the sleep completes without being replaced, the callback runs
//!
//! There is no queue and no count of coalesced calls: only the latest
//! deadline matters. Once a timer has fired it is detached from the slot, so
//! a later notify never aborts a callback that is already running. Callback
//! executions are not serialized; a long callback can overlap the next one.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use onchange::debounce::Coalescer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let coalescer = Coalescer::new(Duration::from_millis(500), || async {
//!         println!("quiet now");
//!     });
//!
//!     coalescer.notify();
//!     coalescer.notify();
//!     coalescer.notify();
//!
//!     // "quiet now" is printed once, 500ms after the last notify.
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

pub use crate::config::DEFAULT_DEBOUNCE_MS;

type Callback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// The single pending action, if any.
#[derive(Debug, Default)]
struct TimerSlot {
    /// Armed timer task. `None` once it fired or was cancelled.
    timer: Option<JoinHandle<()>>,
    /// When the armed timer will fire.
    deadline: Option<Instant>,
    /// Bumped on every arm or cancel so a superseded timer can tell.
    generation: u64,
}

/// Collapses bursts of notifications into one deferred callback.
///
/// One instance per watch session. Cheap to share behind an `Arc`; all
/// methods take `&self`.
pub struct Coalescer {
    delay: Duration,
    callback: Callback,
    slot: Arc<Mutex<TimerSlot>>,
    runtime: Handle,
}

impl Coalescer {
    /// Creates a coalescer that runs `callback` once `delay` has passed
    /// since the most recent [`notify`](Self::notify).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new<F, Fut>(delay: Duration, callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            callback: Arc::new(move || callback().boxed()),
            slot: Arc::new(Mutex::new(TimerSlot::default())),
            runtime: Handle::current(),
        }
    }

    /// Creates a coalescer with the default delay (5000ms).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_default_delay<F, Fut>(callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS), callback)
    }

    /// Records activity and (re)starts the quiet-period timer.
    ///
    /// Any pending timer is cancelled and replaced, so at most one deferred
    /// callback exists at any time. Safe to call from any thread.
    pub fn notify(&self) {
        let mut slot = self.slot.lock();

        let replaced = match slot.timer.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        };

        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;
        let deadline = Instant::now() + self.delay;
        slot.deadline = Some(deadline);

        let callback = Arc::clone(&self.callback);
        let shared = Arc::clone(&self.slot);
        slot.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;

            {
                let mut slot = shared.lock();
                // A notify that raced the wake-up already took our place.
                if slot.generation != generation {
                    return;
                }
                slot.timer = None;
                slot.deadline = None;
            }

            debug!("Quiet period elapsed, running callback");
            callback().await;
        }));

        trace!(
            replaced,
            delay_ms = self.delay.as_millis(),
            "Debounce deadline armed"
        );
    }

    /// Drops the pending action, if any, without running it.
    ///
    /// A callback that is already running is not affected.
    pub fn cancel(&self) {
        let mut slot = self.slot.lock();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
            debug!("Pending debounce action cancelled");
        }
        slot.deadline = None;
        slot.generation = slot.generation.wrapping_add(1);
    }

    /// The configured quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// When the pending action will run, if one is armed.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.slot.lock().deadline
    }

    /// Returns `true` while an action is armed and has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending_deadline().is_some()
    }
}

impl std::fmt::Debug for Coalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coalescer")
            .field("delay", &self.delay)
            .field("pending_deadline", &self.pending_deadline())
            .finish_non_exhaustive()
    }
}

impl Drop for Coalescer {
    fn drop(&mut self) {
        if let Some(timer) = self.slot.lock().timer.take() {
            timer.abort();
        }
    }
}
