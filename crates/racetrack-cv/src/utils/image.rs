//! Image buffer helpers shared by the backends and the frame runner

use ::image::{GrayImage, Luma, Rgb, RgbImage};
use anyhow::Context;
use std::path::Path;

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Load an image file as an RGB frame
    pub fn load_frame<P: AsRef<Path>>(path: P) -> anyhow::Result<RgbImage> {
        let frame = ::image::open(&path)
            .with_context(|| format!("Failed to open image: {:?}", path.as_ref()))?
            .to_rgb8();
        Ok(frame)
    }

    /// Save an RGB frame, format chosen by extension
    pub fn save_frame<P: AsRef<Path>>(frame: &RgbImage, path: P) -> anyhow::Result<()> {
        frame
            .save(&path)
            .with_context(|| format!("Failed to save image: {:?}", path.as_ref()))
    }

    /// Split a three-channel image into planes
    pub fn split_channels(image: &RgbImage) -> [GrayImage; 3] {
        [0, 1, 2].map(|c| Self::channel(image, c))
    }

    /// Interleave three planes of equal size
    pub fn merge_channels(planes: &[GrayImage; 3]) -> RgbImage {
        let (width, height) = planes[0].dimensions();
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                planes[0].get_pixel(x, y)[0],
                planes[1].get_pixel(x, y)[0],
                planes[2].get_pixel(x, y)[0],
            ])
        })
    }

    /// Copy out one channel
    pub fn channel(image: &RgbImage, index: usize) -> GrayImage {
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y)[index]])
        })
    }

    /// Overwrite one channel in place
    pub fn set_channel(image: &mut RgbImage, index: usize, plane: &GrayImage) {
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            pixel[index] = plane.get_pixel(x, y)[0];
        }
    }

    /// Per-pixel maximum of two masks (union for binary masks)
    pub fn union_masks(a: &GrayImage, b: &GrayImage) -> GrayImage {
        GrayImage::from_fn(a.width(), a.height(), |x, y| {
            Luma([a.get_pixel(x, y)[0].max(b.get_pixel(x, y)[0])])
        })
    }

    /// Number of foreground pixels
    pub fn count_nonzero(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] > 0).count()
    }
}
