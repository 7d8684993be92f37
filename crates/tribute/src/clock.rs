//! The countdown display driver.
//!
//! [`CountdownClock`] recomputes the remaining time on a fixed cadence and
//! publishes each fresh [`CountdownDuration`] on a watch channel. Dropping the
//! clock cancels the cadence.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::watch;
use tracing::trace;

use crate::config::CountdownConfig;
use crate::countdown::{AnniversaryDate, CountdownDuration};
use crate::ticker::Ticker;

/// Where the clock reads "now" from.
pub trait TimeSource: Send + Sync + 'static {
    /// The current local wall-clock instant.
    fn now(&self) -> NaiveDateTime;
}

/// The machine's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTime;

impl TimeSource for LocalTime {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedTime(pub NaiveDateTime);

impl TimeSource for FixedTime {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// A clock that starts at `origin` and advances with the tokio clock.
///
/// Lets the CLI preview the countdown from any instant, and runs on virtual
/// time under a paused test runtime.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedTime {
    origin: NaiveDateTime,
    started: tokio::time::Instant,
}

impl SimulatedTime {
    /// Start a simulated clock reading `origin` right now.
    #[must_use]
    pub fn starting_at(origin: NaiveDateTime) -> Self {
        Self {
            origin,
            started: tokio::time::Instant::now(),
        }
    }
}

impl TimeSource for SimulatedTime {
    fn now(&self) -> NaiveDateTime {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin + elapsed
    }
}

/// A running countdown. Lives as long as the view displaying it.
#[derive(Debug)]
pub struct CountdownClock {
    date: AnniversaryDate,
    ticker: Ticker,
    rx: watch::Receiver<CountdownDuration>,
}

impl CountdownClock {
    /// Start counting down to `date`, recomputing every `period`.
    ///
    /// The first value is available immediately. Must be called from within a
    /// tokio runtime.
    pub fn start<T: TimeSource>(date: AnniversaryDate, source: T, period: Duration) -> Self {
        let source = Arc::new(source);
        let (tx, rx) = watch::channel(date.compute_remaining(source.now()));

        let ticker = Ticker::spawn("countdown", period, move || {
            let remaining = date.compute_remaining(source.now());
            trace!(%remaining, "countdown tick");
            tx.send_replace(remaining);
        });

        Self { date, ticker, rx }
    }

    /// Start a clock from the `[countdown]` configuration section.
    ///
    /// Callers are expected to pass a validated config; an impossible date
    /// falls back to the default anniversary.
    pub fn from_config<T: TimeSource>(config: &CountdownConfig, source: T) -> Self {
        let date = config.anniversary().unwrap_or_default();
        Self::start(date, source, config.tick_interval())
    }

    /// The date being counted toward.
    #[must_use]
    pub fn date(&self) -> AnniversaryDate {
        self.date
    }

    /// A receiver that is notified on every tick.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CountdownDuration> {
        self.rx.clone()
    }

    /// The most recently computed remaining time.
    #[must_use]
    pub fn current(&self) -> CountdownDuration {
        *self.rx.borrow()
    }

    /// How many ticks have been computed.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticker.ticks()
    }

    /// Stop recomputing. Subscribers see the channel close.
    pub fn stop(&self) {
        self.ticker.stop();
    }

    /// Whether the clock has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.ticker.is_stopped()
    }
}
