//! Vision backends
//!
//! [`ImageprocBackend`] is the default pure-Rust implementation of
//! [`VisionBackend`](crate::traits::VisionBackend). With the `opencv` feature
//! the same primitives are also available through OpenCV.

pub mod clahe;
pub mod native;
#[cfg(feature = "opencv")]
pub mod opencv_backend;

pub use native::ImageprocBackend;
#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvBackend;

use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Ordered border points of a shape
pub type Contour = Vec<Point<i32>>;

/// Colour-space conversions the detectors need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorConversion {
    RgbToHsv,
    RgbToYuv,
    YuvToRgb,
}

/// Centre of mass of a connected region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
    /// Pixel count
    pub area: u32,
}

impl Centroid {
    pub fn new(x: f64, y: f64, area: u32) -> Self {
        Self { x, y, area }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Odd window sizes only; even kernels have no centre pixel
pub(crate) fn kernel_radius(kernel_size: u32) -> crate::Result<u32> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(crate::VisionError::DetectionFailure(format!(
            "kernel size must be odd, got {kernel_size}"
        )));
    }
    Ok(kernel_size / 2)
}
