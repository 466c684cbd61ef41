//! Two-state race stopwatch

use super::source::{MonotonicTime, TimeSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stopwatch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    /// Idle; `elapsed` reports the last completed measurement
    Waiting,
    /// Running; `elapsed` grows with the time source
    Measuring,
}

/// Race stopwatch.
///
/// Starting while already measuring, or finishing while waiting, is a silent
/// no-op. Before the first measurement `start == end`, so elapsed time is zero.
#[derive(Debug, Clone)]
pub struct RaceClock<T: TimeSource = MonotonicTime> {
    source: T,
    state: ClockState,
    start: Duration,
    end: Duration,
}

impl<T: TimeSource> RaceClock<T> {
    /// Create a waiting clock stamped with the current reading of `source`
    pub fn new(source: T) -> Self {
        let now = source.now();
        Self {
            source,
            state: ClockState::Waiting,
            start: now,
            end: now,
        }
    }

    /// Begin measuring (only from `Waiting`)
    pub fn start_measure(&mut self) {
        if self.state == ClockState::Waiting {
            self.start = self.source.now();
            self.state = ClockState::Measuring;
        }
    }

    /// Stop measuring (only from `Measuring`)
    pub fn finish_measure(&mut self) {
        if self.state == ClockState::Measuring {
            self.end = self.source.now().max(self.start);
            self.state = ClockState::Waiting;
        }
    }

    /// Time since start while measuring, otherwise the last measured span
    pub fn elapsed(&self) -> Duration {
        match self.state {
            ClockState::Measuring => self.source.now().saturating_sub(self.start),
            ClockState::Waiting => self.end.saturating_sub(self.start),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_measuring(&self) -> bool {
        self.state == ClockState::Measuring
    }

    pub fn source(&self) -> &T {
        &self.source
    }
}

impl Default for RaceClock<MonotonicTime> {
    fn default() -> Self {
        Self::new(MonotonicTime::new())
    }
}
