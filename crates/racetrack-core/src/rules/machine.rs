//! READY → PLAY → {GAME_OVER | CLEAR} state machine
//!
//! The machine never looks at pixels. Each tick the caller reports what the
//! detectors saw as an [`Observation`]; the machine updates its debounce
//! counters and collision flag, then applies the transition table:
//!
//! | From  | Condition              | To        |
//! |-------|------------------------|-----------|
//! | READY | start counter > N      | PLAY      |
//! | PLAY  | goal counter > N       | CLEAR     |
//! | PLAY  | collision flag set     | GAME_OVER |
//!
//! Rules are tried top to bottom and at most one fires per tick.

use super::debounce::DebounceCounter;
use super::state::GameState;
use crate::timing::{ClockState, MonotonicTime, RaceClock, TimeSource};
use log::info;
use serde::{Deserialize, Serialize};

/// Confirmations needed before a zone triggers a transition (strictly more than this)
pub const DEFAULT_DEBOUNCE_THRESHOLD: u32 = 10;

/// How a zone detector was consulted during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneCheck {
    /// Detector did not run
    #[default]
    Skipped,
    /// Detector ran without touching the counter
    Probe(bool),
    /// Detector ran and a positive verdict counts toward the zone
    Count(bool),
}

impl ZoneCheck {
    /// Whether the marker was seen in the zone
    pub fn hit(self) -> bool {
        matches!(self, ZoneCheck::Probe(true) | ZoneCheck::Count(true))
    }

    fn counts(self) -> bool {
        self == ZoneCheck::Count(true)
    }
}

/// Detector verdicts for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub start: ZoneCheck,
    pub goal: ZoneCheck,
    /// `None` when the collision check did not run; the flag is left as is.
    /// Reports outside PLAY are ignored.
    pub collision: Option<bool>,
}

impl Observation {
    /// Nothing was checked
    pub fn idle() -> Self {
        Self::default()
    }

    /// READY tick: start zone counted
    pub fn ready(at_start: bool) -> Self {
        Self {
            start: ZoneCheck::Count(at_start),
            ..Self::default()
        }
    }

    /// PLAY tick: start probed, goal counted, collision checked only in open track
    pub fn play(at_start: bool, at_goal: bool, collision: Option<bool>) -> Self {
        Self {
            start: ZoneCheck::Probe(at_start),
            goal: ZoneCheck::Count(at_goal),
            collision,
        }
    }
}

/// A state change that fired during [`GameStateMachine::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: GameState,
    pub to: GameState,
}

/// Serializable view of the machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub state: GameState,
    pub start_count: u32,
    pub goal_count: u32,
    pub collision: bool,
    pub clock: ClockState,
    pub elapsed_secs: f64,
}

/// Game state machine owning the counters, collision flag and race clock
#[derive(Debug, Clone)]
pub struct GameStateMachine<T: TimeSource = MonotonicTime> {
    state: GameState,
    start_pnt: DebounceCounter,
    goal_pnt: DebounceCounter,
    collision: bool,
    clock: RaceClock<T>,
    debounce_threshold: u32,
}

impl<T: TimeSource + Clone> GameStateMachine<T> {
    pub fn new(debounce_threshold: u32, time: T) -> Self {
        Self {
            state: GameState::Ready,
            start_pnt: DebounceCounter::new(),
            goal_pnt: DebounceCounter::new(),
            collision: false,
            clock: RaceClock::new(time),
            debounce_threshold,
        }
    }

    /// Apply one tick of verdicts and return the transition it caused, if any
    pub fn update(&mut self, observation: &Observation) -> Option<Transition> {
        self.observe(observation);
        self.advance()
    }

    /// Fold verdicts into counters and the collision flag without transitioning
    pub fn observe(&mut self, observation: &Observation) {
        if observation.start.counts() {
            self.start_pnt.record();
        }
        if observation.goal.counts() {
            self.goal_pnt.record();
        }
        // the collision flag only has meaning on open track
        if let (GameState::Play, Some(collided)) = (self.state, observation.collision) {
            self.collision = collided;
        }
    }

    /// Apply the transition table (first matching rule wins)
    pub fn advance(&mut self) -> Option<Transition> {
        let from = self.state;
        let to = match from {
            GameState::Ready if self.start_pnt.exceeds(self.debounce_threshold) => {
                self.start_pnt.reset();
                self.clock.start_measure();
                GameState::Play
            }
            GameState::Play if self.goal_pnt.exceeds(self.debounce_threshold) => {
                self.goal_pnt.reset();
                self.clock.finish_measure();
                GameState::Clear
            }
            GameState::Play if self.collision => {
                self.collision = false;
                GameState::GameOver
            }
            _ => return None,
        };

        self.state = to;
        info!("{} -> {} at {:.3}s", from, to, self.clock.elapsed_secs());
        Some(Transition { from, to })
    }

    /// Return to construction-time defaults with a fresh clock
    pub fn reset(&mut self) {
        let time = self.clock.source().clone();
        *self = Self::new(self.debounce_threshold, time);
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn start_count(&self) -> u32 {
        self.start_pnt.count()
    }

    pub fn goal_count(&self) -> u32 {
        self.goal_pnt.count()
    }

    pub fn collision(&self) -> bool {
        self.collision
    }

    pub fn debounce_threshold(&self) -> u32 {
        self.debounce_threshold
    }

    pub fn clock(&self) -> &RaceClock<T> {
        &self.clock
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.clock.elapsed_secs()
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            state: self.state,
            start_count: self.start_count(),
            goal_count: self.goal_count(),
            collision: self.collision,
            clock: self.clock.state(),
            elapsed_secs: self.elapsed_secs(),
        }
    }
}

impl Default for GameStateMachine<MonotonicTime> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_THRESHOLD, MonotonicTime::new())
    }
}
