//! Time sources used for token age computation.
//!
//! Readings are durations since the clock's own origin; only the difference
//! of two readings from the same clock carries meaning.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic readings for token age checks.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Monotonic clock with a wall-clock fallback.
///
/// If the monotonic reading ever fails to advance past the origin the clock
/// answers with wall-clock time since the wall origin instead. Wall time can
/// jump when the system clock is adjusted, which may make a token look
/// fresher or older than it is; ages are still bounded by the next reading.
///
/// `Instant` is monotonic on every supported platform, so the fallback only
/// runs if the platform clock misbehaves.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    wall_origin: Duration,
}

impl SystemClock {
    /// Clock whose origin is the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            wall_origin: wall_clock(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        elapsed_or_wall(
            Instant::now().checked_duration_since(self.origin),
            self.wall_origin,
            wall_clock,
        )
    }
}

fn elapsed_or_wall(
    monotonic: Option<Duration>,
    wall_origin: Duration,
    wall: impl FnOnce() -> Duration,
) -> Duration {
    monotonic.unwrap_or_else(|| wall().saturating_sub(wall_origin))
}

fn wall_clock() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Manually advanced clock. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn reading(&self) -> MutexGuard<'_, Duration> {
        // a plain Duration cannot be left half-written
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the reading forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.reading() += by;
    }

    /// Jump to an absolute reading.
    pub fn set(&self, to: Duration) {
        *self.reading() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.reading()
    }
}
