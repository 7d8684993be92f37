//! Celestial dust: short bursts of rising, fading particles.
//!
//! A [`DustGenerator`] starts a session on every [`DustGenerator::trigger`].
//! A session spawns a burst of particles every burst interval until its
//! window closes; each particle removes itself when its lifetime ends.
//! Sessions are independent and may overlap freely.
//!
//! # Example
//!
//! ```no_run
//! use tribute::dust::{DustGenerator, DustParams, RecordingSurface, SessionTiming};
//!
//! # async fn demo() {
//! let generator = DustGenerator::new(
//!     RecordingSurface::new(),
//!     DustParams::default(),
//!     SessionTiming::default(),
//! );
//! generator.trigger();
//! # }
//! ```

mod particle;
mod surface;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

pub use particle::{
    Color, CubicBezier, DustParams, DustParticle, Palette, Track, DEFAULT_COLORS, DUST_EASING,
    GLOW_RADIUS_PX, OPACITY_TRACK, SCALE_TRACK, START_BOTTOM_PX,
};
pub use surface::{
    ElementHandle, NullSurface, RecordingSurface, SpawnRecord, Surface, SurfaceStats,
};

use crate::config::DustConfig;
use crate::error::Result;
use crate::ticker::MIN_PERIOD;

/// How long a session keeps spawning.
pub const DEFAULT_SESSION: Duration = Duration::from_millis(3_000);

/// Time between bursts within a session.
pub const DEFAULT_BURST_INTERVAL: Duration = Duration::from_millis(50);

/// Particles per burst.
pub const DEFAULT_BURST_SIZE: usize = 10;

/// The cadence of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// How long after the trigger bursts keep coming.
    pub duration: Duration,
    /// Time between bursts.
    pub burst_interval: Duration,
    /// Particles per burst.
    pub burst_size: usize,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SESSION,
            burst_interval: DEFAULT_BURST_INTERVAL,
            burst_size: DEFAULT_BURST_SIZE,
        }
    }
}

impl SessionTiming {
    /// The burst interval actually used, never shorter than [`MIN_PERIOD`].
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        self.burst_interval.max(MIN_PERIOD)
    }

    /// Build session timing from the `[dust]` configuration section.
    #[must_use]
    pub fn from_config(config: &DustConfig) -> Self {
        Self {
            duration: config.session(),
            burst_interval: config.burst_interval(),
            burst_size: config.burst_size,
        }
    }

    /// Bursts a full session produces: one at the trigger, then one per
    /// interval strictly inside the window.
    #[must_use]
    pub fn expected_bursts(&self) -> u64 {
        let window = self.duration.as_nanos();
        let step = self.effective_interval().as_nanos();
        u64::try_from(window.div_ceil(step)).unwrap_or(u64::MAX)
    }

    /// Particles a full session produces.
    #[must_use]
    pub fn expected_particles(&self) -> u64 {
        self.expected_bursts() * self.burst_size as u64
    }
}

/// What one session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Session number, starting at 1 for each generator.
    pub session: u64,
    /// Bursts spawned.
    pub bursts: u64,
    /// Particles spawned.
    pub particles: u64,
}

struct Inner<S> {
    surface: S,
    params: DustParams,
    timing: SessionTiming,
    rng: Mutex<Box<dyn RngCore + Send>>,
    sessions: AtomicU64,
}

impl<S: std::fmt::Debug> std::fmt::Debug for Inner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("surface", &self.surface)
            .field("params", &self.params)
            .field("timing", &self.timing)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

/// Spawns dust sessions onto a [`Surface`].
///
/// Cheap to clone; clones share the surface, random source and session count.
#[derive(Debug)]
pub struct DustGenerator<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for DustGenerator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Surface> DustGenerator<S> {
    /// Create a generator seeded from the operating system.
    #[must_use]
    pub fn new(surface: S, params: DustParams, timing: SessionTiming) -> Self {
        Self::with_rng(surface, params, timing, StdRng::from_entropy())
    }

    /// Create a generator with a deterministic seed.
    #[must_use]
    pub fn with_seed(surface: S, params: DustParams, timing: SessionTiming, seed: u64) -> Self {
        Self::with_rng(surface, params, timing, StdRng::seed_from_u64(seed))
    }

    /// Create a generator drawing from the given random source.
    #[must_use]
    pub fn with_rng<R>(surface: S, params: DustParams, timing: SessionTiming, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                surface,
                params,
                timing,
                rng: Mutex::new(Box::new(rng)),
                sessions: AtomicU64::new(0),
            }),
        }
    }

    /// Create a generator from the `[dust]` configuration section.
    ///
    /// An explicit `seed` makes the run reproducible.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configured palette is unusable.
    pub fn from_config(surface: S, config: &DustConfig, seed: Option<u64>) -> Result<Self> {
        let params = DustParams::from_config(config)?;
        let timing = SessionTiming::from_config(config);
        Ok(match seed {
            Some(seed) => Self::with_seed(surface, params, timing, seed),
            None => Self::new(surface, params, timing),
        })
    }

    /// The surface particles are drawn on.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.inner.surface
    }

    /// The particle sampling ranges.
    #[must_use]
    pub fn params(&self) -> &DustParams {
        &self.inner.params
    }

    /// The session cadence.
    #[must_use]
    pub fn timing(&self) -> SessionTiming {
        self.inner.timing
    }

    /// Sessions started so far.
    #[must_use]
    pub fn sessions_started(&self) -> u64 {
        self.inner.sessions.load(Ordering::SeqCst)
    }

    /// Start a session and return immediately.
    ///
    /// The session runs to completion on the tokio runtime and cannot be
    /// cancelled. Must be called from within a tokio runtime.
    pub fn trigger(&self) {
        let generator = self.clone();
        tokio::spawn(async move {
            generator.run_session().await;
        });
    }

    /// Run one session, returning once its spawning window has closed.
    ///
    /// Particles spawned by the session may still be alive when this returns.
    pub async fn run_session(&self) -> SessionReport {
        let session = self.inner.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        let timing = self.inner.timing;
        let end = Instant::now() + timing.duration;
        debug!(session, duration = ?timing.duration, "dust session started");

        let mut interval = tokio::time::interval(timing.effective_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut report = SessionReport {
            session,
            bursts: 0,
            particles: 0,
        };
        loop {
            interval.tick().await;
            if Instant::now() >= end {
                break;
            }
            for _ in 0..timing.burst_size {
                self.spawn_particle();
            }
            report.bursts += 1;
            report.particles += timing.burst_size as u64;
        }

        debug!(session, bursts = report.bursts, particles = report.particles, "dust session ended");
        report
    }

    /// Sample one particle, draw it, and schedule its removal.
    fn spawn_particle(&self) {
        let particle = {
            let mut rng = self
                .inner
                .rng
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            self.inner.params.sample(&mut **rng)
        };

        let handle = self.inner.surface.spawn_transient(&particle);
        let generator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(particle.lifetime).await;
            generator.inner.surface.remove(handle);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;

    fn generator(seed: u64) -> DustGenerator<RecordingSurface> {
        init_test_logging();
        DustGenerator::with_seed(
            RecordingSurface::new(),
            DustParams::default(),
            SessionTiming::default(),
            seed,
        )
    }

    #[test]
    fn test_default_timing() {
        let timing = SessionTiming::default();
        assert_eq!(timing.duration, Duration::from_millis(3_000));
        assert_eq!(timing.burst_interval, Duration::from_millis(50));
        assert_eq!(timing.burst_size, 10);
        assert_eq!(timing.expected_bursts(), 60);
        assert_eq!(timing.expected_particles(), 600);
    }

    #[test]
    fn test_expected_bursts_uneven_window() {
        let timing = SessionTiming {
            duration: Duration::from_millis(120),
            burst_interval: Duration::from_millis(50),
            burst_size: 2,
        };
        // Bursts at 0, 50 and 100 ms.
        assert_eq!(timing.expected_bursts(), 3);
        assert_eq!(timing.expected_particles(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_burst_interval_runs_at_minimum_period() {
        let timing = SessionTiming {
            duration: Duration::from_millis(5),
            burst_interval: Duration::ZERO,
            burst_size: 2,
        };
        assert_eq!(timing.effective_interval(), MIN_PERIOD);
        assert_eq!(timing.expected_bursts(), 5);

        let generator =
            DustGenerator::with_seed(NullSurface::default(), DustParams::default(), timing, 9);
        let report = generator.run_session().await;
        assert_eq!(report.bursts, 5);
        assert_eq!(report.particles, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_spawns_six_hundred_particles() {
        let generator = generator(1);
        let report = generator.run_session().await;

        assert_eq!(report.session, 1);
        assert_eq!(report.bursts, 60);
        assert_eq!(report.particles, 600);
        assert_eq!(generator.surface().stats().spawned, 600);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_bursts_after_window_closes() {
        let generator = generator(2);
        let started = Instant::now();
        generator.run_session().await;

        let window = Duration::from_millis(3_000);
        let history = generator.surface().history();
        assert!(history.iter().all(|r| r.at - started < window));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(generator.surface().history().len(), history.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bursts_are_ten_particles_fifty_ms_apart() {
        let generator = generator(3);
        let started = Instant::now();
        generator.run_session().await;

        let history = generator.surface().history();
        for (i, chunk) in history.chunks(10).enumerate() {
            assert_eq!(chunk.len(), 10);
            let offset = Duration::from_millis(50 * i as u64);
            assert!(chunk.iter().all(|r| r.at - started == offset));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_particles_respect_bounds() {
        let generator = generator(4);
        generator.run_session().await;

        for record in generator.surface().history() {
            let p = record.particle;
            assert!((1.0..=5.0).contains(&p.size));
            assert!(p.lifetime >= Duration::from_millis(2_000));
            assert!(p.lifetime <= Duration::from_millis(4_000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_particles_remove_themselves() {
        let generator = generator(5);
        generator.run_session().await;
        assert!(generator.surface().alive() > 0);

        // Everything is spawned before the window closes and lives at most 4 s.
        tokio::time::sleep(Duration::from_millis(4_001)).await;
        let stats = generator.surface().stats();
        assert_eq!(stats.alive, 0);
        assert_eq!(stats.removed, 600);
    }

    #[tokio::test(start_paused = true)]
    async fn test_particle_removed_after_its_own_lifetime() {
        let generator = generator(6);
        generator.run_session().await;
        let history = generator.surface().history();
        let started = history[0].at;

        tokio::time::sleep_until(started + Duration::from_millis(4_500)).await;
        let now = Instant::now();
        let ends = || history.iter().map(|r| r.at + r.particle.lifetime);
        // Particles ending exactly now may or may not have been swept yet.
        let surely_alive = ends().filter(|end| *end > now).count();
        let maybe_alive = ends().filter(|end| *end >= now).count();

        let alive = generator.surface().alive();
        assert!(alive >= surely_alive && alive <= maybe_alive);
        assert!(alive < history.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_overlapping_sessions() {
        let generator = generator(7);
        generator.trigger();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        generator.trigger();
        generator.trigger();

        tokio::time::sleep(Duration::from_millis(8_000)).await;
        assert_eq!(generator.sessions_started(), 3);

        let stats = generator.surface().stats();
        assert_eq!(stats.spawned, 1_800);
        assert_eq!(stats.alive, 0);
        assert!(stats.peak_alive > 600);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_seed_same_particles() {
        let a = generator(8);
        let b = generator(8);
        a.run_session().await;
        b.run_session().await;

        let pa: Vec<_> = a.surface().history().iter().map(|r| r.particle).collect();
        let pb: Vec<_> = b.surface().history().iter().map(|r| r.particle).collect();
        assert_eq!(pa, pb);
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_config() {
        let config = DustConfig {
            session_ms: 100,
            burst_interval_ms: 25,
            burst_size: 3,
            ..DustConfig::default()
        };
        let generator =
            DustGenerator::from_config(NullSurface::default(), &config, Some(1)).unwrap();
        let report = generator.run_session().await;
        assert_eq!(report.bursts, 4);
        assert_eq!(report.particles, 12);
        assert_eq!(generator.timing().burst_size, 3);
    }
}
