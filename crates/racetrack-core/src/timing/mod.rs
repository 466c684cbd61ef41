//! Race timing

pub mod clock;
pub mod source;

pub use clock::{ClockState, RaceClock};
pub use source::{ManualTime, MonotonicTime, TimeSource};
