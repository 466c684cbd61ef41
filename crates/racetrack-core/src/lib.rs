//! Racetrack core game logic
//!
//! Vision-free building blocks of the race track game: the race clock and the
//! READY → PLAY → {GAME_OVER | CLEAR} state machine that turns per-frame
//! detector verdicts into debounced transitions.

pub mod rules;
pub mod timing;

// Re-export commonly used types
pub use rules::{
    DebounceCounter, GameState, GameStateMachine, MachineSnapshot, Observation, Transition,
    ZoneCheck, DEFAULT_DEBOUNCE_THRESHOLD,
};
pub use timing::{ClockState, ManualTime, MonotonicTime, RaceClock, TimeSource};
