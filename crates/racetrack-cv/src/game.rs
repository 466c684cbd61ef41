//! Frame-driven race game
//!
//! [`Game`] runs the detectors the current state asks for, draws the overlay
//! on a copy of the frame, and hands the verdicts to the core state machine.

use crate::backend::ImageprocBackend;
use crate::detection::{overlay, GameConfig, ShapeClassifier, ZoneDetector};
use crate::traits::VisionBackend;
use crate::Result;
use image::RgbImage;
use log::debug;
use racetrack_core::{
    GameState, GameStateMachine, MachineSnapshot, MonotonicTime, Observation, TimeSource, Transition,
};

/// Serializable view of a running game
pub type GameSnapshot = MachineSnapshot;

/// One race: detectors, overlay settings and the state machine they feed
pub struct Game<B: VisionBackend = ImageprocBackend, T: TimeSource = MonotonicTime> {
    config: GameConfig,
    backend: B,
    zones: ZoneDetector,
    shapes: ShapeClassifier,
    machine: GameStateMachine<T>,
    last_transition: Option<Transition>,
}

impl Game {
    /// Create new game on the pure-Rust backend and the monotonic clock
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_parts(config, ImageprocBackend::new(), MonotonicTime::new())
    }
}

impl<B: VisionBackend, T: TimeSource + Clone> Game<B, T> {
    /// Create new game from explicit parts
    pub fn with_parts(config: GameConfig, backend: B, time: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            zones: ZoneDetector::new(config.clone()),
            shapes: ShapeClassifier::new(config.clone()),
            machine: GameStateMachine::new(config.debounce_threshold, time),
            config,
            backend,
            last_transition: None,
        })
    }

    /// Process one frame and return its annotated copy.
    ///
    /// On error the machine is left exactly as it was before the call.
    pub fn tick(&mut self, frame: &RgbImage) -> Result<RgbImage> {
        let mut output = frame.clone();
        let observation = match self.machine.state() {
            GameState::Ready => self.tick_ready(frame, &mut output)?,
            GameState::Play => self.tick_play(frame, &mut output)?,
            GameState::GameOver => self.tick_game_over(&mut output),
            GameState::Clear => self.tick_clear(),
        };

        self.last_transition = self.machine.update(&observation);
        Ok(output)
    }

    fn tick_ready(&self, frame: &RgbImage, output: &mut RgbImage) -> Result<Observation> {
        let at_start = self.zones.detect(&self.backend, frame, &self.config.start_zone)?.centered;
        if at_start {
            debug!("start zone detected");
        }

        if self.config.overlay.enabled {
            overlay::draw_circle_marker(output, &self.config.overlay);
        }
        Ok(Observation::ready(at_start))
    }

    fn tick_play(&self, frame: &RgbImage, output: &mut RgbImage) -> Result<Observation> {
        let at_start = self.zones.detect(&self.backend, frame, &self.config.start_zone)?.centered;
        let at_goal = self.zones.detect(&self.backend, frame, &self.config.goal_zone)?.centered;
        if at_goal {
            debug!("goal zone detected");
        }

        let overlay_enabled = self.config.overlay.enabled;
        if overlay_enabled {
            overlay::draw_triangle_marker(output, &self.config.overlay);
        }

        // zone markers have edges of their own; only open track is checked
        let collision = if at_start || at_goal {
            None
        } else {
            let verdict = self.shapes.check_collision(&self.backend, frame)?;
            if overlay_enabled {
                overlay::draw_contours(output, &verdict.contours, &self.config.overlay);
            }
            Some(verdict.collided)
        };

        Ok(Observation::play(at_start, at_goal, collision))
    }

    fn tick_game_over(&self, output: &mut RgbImage) -> Observation {
        if self.config.overlay.enabled {
            overlay::draw_triangle_marker(output, &self.config.overlay);
        }
        Observation::idle()
    }

    fn tick_clear(&self) -> Observation {
        Observation::idle()
    }

    /// Back to READY with zeroed counters and a fresh clock
    pub fn reset(&mut self) {
        self.machine.reset();
        self.last_transition = None;
    }

    pub fn current_state(&self) -> GameState {
        self.machine.state()
    }

    /// Race time in seconds
    pub fn elapsed_time(&self) -> f64 {
        self.machine.elapsed_secs()
    }

    pub fn machine(&self) -> &GameStateMachine<T> {
        &self.machine
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.machine.snapshot()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Transition fired by the most recent tick
    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }
}
