//! Frame classification: colour zones, collision shapes and their overlays

pub mod config;
pub mod overlay;
pub mod shape;
pub mod zone;

pub use config::{GameConfig, OverlayConfig, PreprocessConfig, RoiConfig, ShapeConfig};
pub use shape::{CenterContours, CollisionVerdict, ShapeClassifier};
pub use zone::{ZoneDetector, ZoneVerdict};
