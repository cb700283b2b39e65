//! Time source for order timestamps.
//!
//! Order fingerprints are derived from `updated_at`, so every mutation
//! needs a timestamp strictly greater than the last one. The repository
//! takes its clock as a dependency instead of reading the wall clock.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Smallest step between two timestamps. Matches PostgreSQL precision.
pub const TICK: Duration = Duration::microseconds(1);

/// A source of timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time, truncated to microseconds.
    fn now(&self) -> DateTime<Utc>;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Truncates a timestamp to microsecond precision.
pub fn truncate(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TICK).unwrap_or(at)
}

/// Wall clock that never repeats or goes backward.
///
/// If the wall clock stalls (low resolution) or steps backward, the
/// returned time advances by one tick past the previous reading.
#[derive(Debug)]
pub struct MonotonicClock {
    last: Mutex<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = truncate(Utc::now());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let next = if wall > *last { wall } else { *last + TICK };
        *last = next;
        next
    }
}

/// Manually driven clock for tests. Time only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(truncate(start)),
        }
    }

    /// Creates a clock frozen at the current wall time.
    pub fn frozen() -> Self {
        Self::at(Utc::now())
    }

    /// Moves the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = truncate(*now + by);
    }

    /// Sets the clock to an exact time.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = truncate(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
