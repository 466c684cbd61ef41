//! Game rules: states, debounce counters and the transition table

pub mod debounce;
pub mod machine;
pub mod state;

pub use debounce::DebounceCounter;
pub use machine::{
    GameStateMachine, MachineSnapshot, Observation, Transition, ZoneCheck,
    DEFAULT_DEBOUNCE_THRESHOLD,
};
pub use state::GameState;
