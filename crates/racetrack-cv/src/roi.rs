//! Centre region of interest
//!
//! Every zone and shape check looks at the same fixed-size square around the
//! frame's geometric centre.

use crate::error::VisionError;
use crate::Result;
use image::{imageops, RgbImage};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// What to do with frames smaller than the region of interest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoiPolicy {
    /// Fail the tick with [`VisionError::InvalidFrameSize`]
    #[default]
    Reject,
    /// Shrink the square to whatever the frame can hold
    Clamp,
}

/// Axis-aligned rectangle in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// Square of side `2 * half_size` centred at `(width / 2, height / 2)`
    pub fn centered(width: u32, height: u32, half_size: u32, policy: RoiPolicy) -> Result<Self> {
        let side = half_size.saturating_mul(2);
        let too_small = || VisionError::InvalidFrameSize {
            width,
            height,
            required: side,
        };

        if width == 0 || height == 0 || side == 0 {
            return Err(too_small());
        }
        if policy == RoiPolicy::Reject && (width < side || height < side) {
            return Err(too_small());
        }

        let roi_width = side.min(width);
        let roi_height = side.min(height);
        let x = (width / 2).saturating_sub(half_size).min(width - roi_width);
        let y = (height / 2).saturating_sub(half_size).min(height - roi_height);

        Ok(Self {
            x,
            y,
            width: roi_width,
            height: roi_height,
        })
    }

    /// Centre region of `frame`
    pub fn for_frame(frame: &RgbImage, half_size: u32, policy: RoiPolicy) -> Result<Self> {
        Self::centered(frame.width(), frame.height(), half_size, policy)
    }

    /// Copy the region out of `frame`
    pub fn crop(&self, frame: &RgbImage) -> RgbImage {
        imageops::crop_imm(frame, self.x, self.y, self.width, self.height).to_image()
    }

    /// Centre of the region in its own coordinates
    pub fn local_center(&self) -> (f64, f64) {
        (f64::from(self.width / 2), f64::from(self.height / 2))
    }

    /// Translate a region-local point into frame coordinates
    pub fn to_frame(&self, point: Point<i32>) -> Point<i32> {
        Point::new(point.x + self.x as i32, point.y + self.y as i32)
    }
}
