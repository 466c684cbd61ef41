use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a race
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Waiting for the marker to settle on the start zone
    #[default]
    Ready,
    /// Race in progress, clock running
    Play,
    /// Marker left the track
    GameOver,
    /// Marker reached the goal zone
    Clear,
}

impl GameState {
    /// GAME_OVER and CLEAR only leave through an external reset
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::GameOver | GameState::Clear)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameState::Ready => "READY",
            GameState::Play => "PLAY",
            GameState::GameOver => "GAME_OVER",
            GameState::Clear => "CLEAR",
        };
        f.write_str(name)
    }
}
