//! Racetrack Computer Vision Library
//!
//! Frame classification for the race track game: colour zone detection at the
//! frame centre, contour based collision detection, and the frame-driven
//! [`Game`] that feeds their verdicts into the core state machine.

pub mod backend;
pub mod color;
pub mod detection;
pub mod error;
pub mod game;
pub mod roi;
pub mod utils;

// Re-export commonly used types
#[cfg(feature = "opencv")]
pub use backend::OpenCvBackend;
pub use backend::{Centroid, ColorConversion, Contour, ImageprocBackend};
pub use color::{ColorBand, HsvRange};
pub use detection::{GameConfig, ShapeClassifier, ZoneDetector};
pub use error::VisionError;
pub use game::{Game, GameSnapshot};
pub use roi::{Roi, RoiPolicy};
pub use traits::VisionBackend;

// Error handling
pub type Result<T> = std::result::Result<T, VisionError>;

/// Core traits for the CV system
pub mod traits {
    use super::*;
    use ::image::{GrayImage, RgbImage};

    /// The vision primitives the detectors are built from.
    ///
    /// Three-channel images are carried in `RgbImage` buffers whatever their
    /// colour space; the caller tracks which space a buffer holds. Masks and
    /// edge maps are `GrayImage`s with foreground 255 and background 0.
    pub trait VisionBackend {
        /// Mean filter with a square `kernel_size` window
        fn blur(&self, image: &RgbImage, kernel_size: u32) -> Result<RgbImage>;

        /// Contrast limited adaptive histogram equalisation of a luma plane
        fn equalize_local_contrast(
            &self,
            luma: &GrayImage,
            clip_limit: f64,
            tile_grid: u32,
        ) -> Result<GrayImage>;

        fn convert_color(&self, image: &RgbImage, conversion: ColorConversion) -> Result<RgbImage>;

        /// Select pixels of an HSV image inside `range` (inclusive)
        fn mask_in_range(&self, hsv: &RgbImage, range: &HsvRange) -> Result<GrayImage>;

        /// 8-connected components of a mask; index 0 is the background
        fn label_connected_components(&self, mask: &GrayImage) -> Result<Vec<Centroid>>;

        fn detect_edges(&self, image: &RgbImage, low_threshold: f32, high_threshold: f32) -> Result<GrayImage>;

        /// Dilation followed by erosion with a square element
        fn morphological_close(&self, image: &GrayImage, kernel_size: u32) -> Result<GrayImage>;

        /// Outermost borders only; holes and nested shapes are dropped
        fn find_external_contours(&self, image: &GrayImage) -> Result<Vec<Contour>>;

        /// Closed polygon approximation with tolerance `tolerance_ratio * arc_length`
        fn approx_polygon(&self, contour: &Contour, tolerance_ratio: f64) -> Result<Contour>;

        /// Perimeter of a closed contour
        fn arc_length(&self, contour: &Contour) -> Result<f64>;
    }
}
