//! Per-zone confirmation counter

use serde::{Deserialize, Serialize};

/// Running count of positive zone verdicts.
///
/// The count is cumulative within a state: a negative verdict does not clear
/// it, only a state transition or a game reset does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceCounter {
    count: u32,
}

impl DebounceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one qualifying tick
    pub fn record(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Strictly greater than `threshold`
    pub fn exceeds(&self, threshold: u32) -> bool {
        self.count > threshold
    }
}
