//! Timestamp sources for the race clock

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of timestamps measured from an arbitrary, fixed origin
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock source backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually driven source for replays and tests.
///
/// Clones share the same reading, so a handle kept outside a clock can move
/// the clock's notion of "now".
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    nanos: Arc<AtomicU64>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source whose first reading is `start`
    pub fn starting_at(start: Duration) -> Self {
        let time = Self::new();
        time.set(start);
        time
    }

    /// Move the reading forward
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(saturating_nanos(by), Ordering::SeqCst);
    }

    /// Jump to an absolute reading
    pub fn set(&self, at: Duration) {
        self.nanos.store(saturating_nanos(at), Ordering::SeqCst);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time_clones_share_reading() {
        let time = ManualTime::new();
        let handle = time.clone();

        handle.advance(Duration::from_millis(250));
        assert_eq!(time.now(), Duration::from_millis(250));

        time.set(Duration::from_secs(3));
        assert_eq!(handle.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_monotonic_time_never_goes_back() {
        let time = MonotonicTime::new();
        let first = time.now();
        let second = time.now();
        assert!(second >= first);
    }
}
