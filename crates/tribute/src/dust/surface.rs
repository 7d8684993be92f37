//! The rendering capability dust particles are drawn on.
//!
//! The generator only needs to append a transient element and later remove
//! it. Backends decide what "drawing" means.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::trace;

use super::particle::DustParticle;

/// Identifies one element on a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementHandle(u64);

impl ElementHandle {
    /// Wrap a backend-specific element id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The backend-specific element id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A visible surface that accepts transient elements.
///
/// Both operations are infallible. A backend that cannot draw should hand
/// out a handle anyway and treat removal of it as a no-op.
pub trait Surface: Send + Sync + 'static {
    /// Append an element rendering `particle` and return its handle.
    fn spawn_transient(&self, particle: &DustParticle) -> ElementHandle;

    /// Remove a previously spawned element. Unknown handles are ignored.
    fn remove(&self, handle: ElementHandle);
}

/// A surface that draws nothing.
#[derive(Debug, Default)]
pub struct NullSurface {
    next_id: AtomicU64,
}

impl Surface for NullSurface {
    fn spawn_transient(&self, _particle: &DustParticle) -> ElementHandle {
        ElementHandle(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn remove(&self, _handle: ElementHandle) {}
}

/// One spawn observed by a [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRecord {
    /// Handle given out for the element.
    pub handle: ElementHandle,
    /// When the element was appended.
    pub at: Instant,
    /// The particle drawn.
    pub particle: DustParticle,
}

/// Aggregate view of what a [`RecordingSurface`] has seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurfaceStats {
    /// Elements appended.
    pub spawned: u64,
    /// Elements removed.
    pub removed: u64,
    /// Elements currently visible.
    pub alive: u64,
    /// Most elements visible at once.
    pub peak_alive: u64,
    /// Smallest and largest particle size seen.
    pub size_range: Option<(f64, f64)>,
    /// Shortest and longest particle lifetime seen, in milliseconds.
    pub lifetime_range_ms: Option<(u64, u64)>,
    /// Distinct colors seen, as `#RRGGBB`.
    pub colors: Vec<String>,
}

#[derive(Debug, Default)]
struct RecordingState {
    next_id: u64,
    alive: HashMap<ElementHandle, DustParticle>,
    history: Vec<SpawnRecord>,
    removed: u64,
    peak_alive: u64,
}

/// An in-memory surface that remembers every element it was given.
///
/// Used by the CLI to summarise a run and by tests to inspect sessions.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    state: Mutex<RecordingState>,
}

impl RecordingSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RecordingState) -> T) -> T {
        // A poisoned lock only means a panic elsewhere; the counters are still usable.
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }

    /// Number of elements currently visible.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.with_state(|s| s.alive.len())
    }

    /// Every spawn so far, in order.
    #[must_use]
    pub fn history(&self) -> Vec<SpawnRecord> {
        self.with_state(|s| s.history.clone())
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> SurfaceStats {
        self.with_state(|s| {
            let mut colors: Vec<String> = Vec::new();
            let mut size_range: Option<(f64, f64)> = None;
            let mut lifetime_range: Option<(Duration, Duration)> = None;

            for record in &s.history {
                let p = &record.particle;
                size_range = Some(match size_range {
                    Some((lo, hi)) => (lo.min(p.size), hi.max(p.size)),
                    None => (p.size, p.size),
                });
                lifetime_range = Some(match lifetime_range {
                    Some((lo, hi)) => (lo.min(p.lifetime), hi.max(p.lifetime)),
                    None => (p.lifetime, p.lifetime),
                });
                let color = p.color.to_string();
                if !colors.contains(&color) {
                    colors.push(color);
                }
            }
            colors.sort();

            let millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
            SurfaceStats {
                spawned: s.history.len() as u64,
                removed: s.removed,
                alive: s.alive.len() as u64,
                peak_alive: s.peak_alive,
                size_range,
                lifetime_range_ms: lifetime_range.map(|(lo, hi)| (millis(lo), millis(hi))),
                colors,
            }
        })
    }
}

impl Surface for RecordingSurface {
    fn spawn_transient(&self, particle: &DustParticle) -> ElementHandle {
        self.with_state(|s| {
            let handle = ElementHandle(s.next_id);
            s.next_id += 1;
            s.alive.insert(handle, *particle);
            s.peak_alive = s.peak_alive.max(s.alive.len() as u64);
            s.history.push(SpawnRecord {
                handle,
                at: Instant::now(),
                particle: *particle,
            });
            trace!(
                element = handle.id(),
                color = %particle.color,
                size = particle.size,
                "dust spawned"
            );
            handle
        })
    }

    fn remove(&self, handle: ElementHandle) {
        self.with_state(|s| {
            if s.alive.remove(&handle).is_some() {
                s.removed += 1;
                trace!(element = handle.id(), "dust removed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dust::DustParams;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn particles(n: usize) -> Vec<DustParticle> {
        let params = DustParams::default();
        let mut rng = StdRng::seed_from_u64(9);
        (0..n).map(|_| params.sample(&mut rng)).collect()
    }

    #[test]
    fn test_element_handle_id() {
        assert_eq!(ElementHandle::new(17).id(), 17);
    }

    #[tokio::test]
    async fn test_recording_spawn_and_remove() {
        let surface = RecordingSurface::new();
        let handles: Vec<_> = particles(3)
            .iter()
            .map(|p| surface.spawn_transient(p))
            .collect();
        assert_eq!(surface.alive(), 3);

        surface.remove(handles[1]);
        assert_eq!(surface.alive(), 2);

        let stats = surface.stats();
        assert_eq!(stats.spawned, 3);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.alive, 2);
        assert_eq!(stats.peak_alive, 3);
    }

    #[tokio::test]
    async fn test_recording_remove_unknown_is_noop() {
        let surface = RecordingSurface::new();
        let handle = surface.spawn_transient(&particles(1)[0]);
        surface.remove(handle);
        surface.remove(handle);
        surface.remove(ElementHandle::new(999));

        let stats = surface.stats();
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.alive, 0);
    }

    #[tokio::test]
    async fn test_recording_handles_are_unique() {
        let surface = RecordingSurface::new();
        let mut ids: Vec<u64> = particles(50)
            .iter()
            .map(|p| surface.spawn_transient(p).id())
            .collect();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert_eq!(surface.history().len(), 50);
    }

    #[tokio::test]
    async fn test_stats_ranges() {
        let surface = RecordingSurface::new();
        let batch = particles(100);
        for p in &batch {
            surface.spawn_transient(p);
        }
        let stats = surface.stats();

        let (lo, hi) = stats.size_range.unwrap();
        assert!(lo >= 1.0 && hi <= 5.0 && lo <= hi);
        let (lo, hi) = stats.lifetime_range_ms.unwrap();
        assert!(lo >= 2_000 && hi <= 4_000 && lo <= hi);
        assert!(!stats.colors.is_empty());
        assert!(stats.colors.len() <= 4);
    }

    #[test]
    fn test_empty_stats() {
        let stats = RecordingSurface::new().stats();
        assert_eq!(stats, SurfaceStats::default());
    }

    #[test]
    fn test_null_surface_hands_out_handles() {
        let surface = NullSurface::default();
        let batch = particles(2);
        let a = surface.spawn_transient(&batch[0]);
        let b = surface.spawn_transient(&batch[1]);
        assert_ne!(a, b);
        surface.remove(a);
    }
}
