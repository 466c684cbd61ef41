//! Game configuration

use crate::color::ColorBand;
use crate::error::VisionError;
use crate::roi::RoiPolicy;
use crate::Result;
use anyhow::Context;
use racetrack_core::DEFAULT_DEBOUNCE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub roi: RoiConfig,
    pub start_zone: ColorBand,
    pub goal_zone: ColorBand,
    pub preprocessing: PreprocessConfig,
    pub shape: ShapeConfig,
    pub debounce_threshold: u32,
    pub overlay: OverlayConfig,
}

/// Centre region of interest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    pub half_size: u32,
    /// Allowed centroid offset on each axis, in ROI pixels
    pub center_tolerance: f64,
    pub policy: RoiPolicy,
}

/// Noise and lighting compensation applied before colour thresholding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub blur_kernel: u32,
    pub clahe_clip_limit: f64,
    pub clahe_tile_grid: u32,
}

/// Collision check parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    pub close_kernel: u32,
    pub approx_ratio: f64,
    /// Vertex count of the safe marker
    pub safe_vertices: usize,
}

/// Annotation drawn on the returned frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub marker_radius: u32,
    pub marker_color: (u8, u8, u8),
    pub contour_color: (u8, u8, u8),
    pub contour_thickness: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            roi: RoiConfig::default(),
            start_zone: ColorBand::blue(),
            goal_zone: ColorBand::red(),
            preprocessing: PreprocessConfig::default(),
            shape: ShapeConfig::default(),
            debounce_threshold: DEFAULT_DEBOUNCE_THRESHOLD,
            overlay: OverlayConfig::default(),
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            half_size: 30,
            center_tolerance: 25.0,
            policy: RoiPolicy::Reject,
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            clahe_clip_limit: 2.0,
            clahe_tile_grid: 8,
        }
    }
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            canny_low: 100.0,
            canny_high: 200.0,
            close_kernel: 5,
            approx_ratio: 0.04,
            safe_vertices: 3,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker_radius: 10,
            marker_color: (0, 255, 0),
            contour_color: (0, 0, 255),
            contour_thickness: 3,
        }
    }
}

impl GameConfig {
    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::from_json_str(&content)
            .with_context(|| format!("Failed to load config file: {:?}", path))?;
        Ok(config)
    }

    /// Parse and validate JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| VisionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| VisionError::InvalidConfig(e.to_string()))
    }

    pub fn with_debounce_threshold(mut self, threshold: u32) -> Self {
        self.debounce_threshold = threshold;
        self
    }

    /// Reject values the detectors cannot work with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(VisionError::InvalidConfig(msg));

        if self.roi.half_size == 0 {
            return invalid("roi.half_size must be positive".to_string());
        }
        if !(self.roi.center_tolerance >= 0.0) {
            return invalid(format!(
                "roi.center_tolerance must be non-negative, got {}",
                self.roi.center_tolerance
            ));
        }
        for (name, band) in [("start_zone", &self.start_zone), ("goal_zone", &self.goal_zone)] {
            if band.ranges().any(|range| range.is_empty()) {
                return invalid(format!("{name} has a range with lower > upper"));
            }
        }
        for (name, kernel) in [
            ("preprocessing.blur_kernel", self.preprocessing.blur_kernel),
            ("shape.close_kernel", self.shape.close_kernel),
        ] {
            if kernel % 2 == 0 {
                return invalid(format!("{name} must be odd, got {kernel}"));
            }
        }
        if self.preprocessing.clahe_tile_grid == 0 {
            return invalid("preprocessing.clahe_tile_grid must be positive".to_string());
        }
        if !(self.shape.canny_low >= 0.0 && self.shape.canny_high >= self.shape.canny_low) {
            return invalid(format!(
                "shape thresholds must satisfy 0 <= low <= high, got {}/{}",
                self.shape.canny_low, self.shape.canny_high
            ));
        }
        if !(self.shape.approx_ratio > 0.0) {
            return invalid("shape.approx_ratio must be positive".to_string());
        }
        Ok(())
    }
}
