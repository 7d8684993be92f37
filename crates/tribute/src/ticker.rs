//! Owned, cancellable periodic tasks.
//!
//! A [`Ticker`] runs an action on a fixed cadence on the tokio runtime and is
//! cancelled when stopped or dropped, so a torn-down view can never be ticked.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Shortest period a ticker runs at. Shorter periods, including zero, are
/// raised to this.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A cloneable stop signal for a [`Ticker`].
///
/// Clones share the same signal, so any holder can stop the ticker.
#[derive(Debug, Clone)]
pub struct TickerHandle {
    name: Arc<str>,
    stop_signal: Arc<AtomicBool>,
}

impl TickerHandle {
    /// Create a new, un-signalled handle.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The ticker's name, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the ticker to stop. The action will not run again.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}

/// A periodic action that lives exactly as long as this value.
///
/// The first tick fires immediately, then once per `period` (at least
/// [`MIN_PERIOD`]). Late ticks are delayed rather than bursted.
#[derive(Debug)]
pub struct Ticker {
    handle: TickerHandle,
    period: Duration,
    ticks: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl Ticker {
    /// Spawn `action` on the current tokio runtime.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(name: impl Into<Arc<str>>, period: Duration, mut action: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let handle = TickerHandle::new(name);
        let ticks = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn({
            let handle = handle.clone();
            let ticks = Arc::clone(&ticks);
            async move {
                debug!(ticker = handle.name(), ?period, "ticker started");
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if handle.should_stop() {
                        break;
                    }
                    action();
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
                debug!(ticker = handle.name(), "ticker stopped");
            }
        });

        Self {
            handle,
            period,
            ticks,
            task,
        }
    }

    /// A cloneable stop signal for this ticker.
    #[must_use]
    pub fn handle(&self) -> TickerHandle {
        self.handle.clone()
    }

    /// The ticker's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// The tick period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of times the action has run.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Stop the ticker and cancel its task.
    pub fn stop(&self) {
        self.handle.stop();
        self.task.abort();
    }

    /// Whether the ticker has been stopped, through this value or a handle.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.handle.should_stop()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
