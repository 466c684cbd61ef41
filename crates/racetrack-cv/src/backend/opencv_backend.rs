//! OpenCV backend (feature `opencv`)
//!
//! Buffers cross the boundary as continuous 8-bit `Mat`s holding the same
//! channel order as the `image` buffers, so RGB data uses the `RGB2*` codes.

use super::{kernel_radius, Centroid, ColorConversion, Contour};
use crate::color::HsvRange;
use crate::error::VisionError;
use crate::traits::VisionBackend;
use crate::Result;
use image::{GrayImage, RgbImage};
use imageproc::point::Point as PixelPoint;
use opencv::{
    core::{self, Mat, Point, Scalar, Size, Vector},
    imgproc,
    prelude::*,
};

/// Backend delegating to OpenCV's `imgproc`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvBackend;

impl OpenCvBackend {
    pub fn new() -> Self {
        Self
    }

    fn rgb_to_mat(image: &RgbImage) -> Result<Mat> {
        let flat = Mat::from_slice(image.as_raw())?;
        Ok(flat.reshape(3, image.height() as i32)?.try_clone()?)
    }

    fn gray_to_mat(image: &GrayImage) -> Result<Mat> {
        let flat = Mat::from_slice(image.as_raw())?;
        Ok(flat.reshape(1, image.height() as i32)?.try_clone()?)
    }

    fn mat_to_rgb(mat: &Mat) -> Result<RgbImage> {
        let size = mat.size()?;
        RgbImage::from_raw(size.width as u32, size.height as u32, mat.data_bytes()?.to_vec())
            .ok_or_else(|| VisionError::DetectionFailure("Mat is not an 8-bit RGB buffer".to_string()))
    }

    fn mat_to_gray(mat: &Mat) -> Result<GrayImage> {
        let size = mat.size()?;
        GrayImage::from_raw(size.width as u32, size.height as u32, mat.data_bytes()?.to_vec())
            .ok_or_else(|| VisionError::DetectionFailure("Mat is not an 8-bit mask".to_string()))
    }

    fn contour_to_vector(contour: &Contour) -> Vector<Point> {
        contour.iter().map(|p| Point::new(p.x, p.y)).collect()
    }
}

impl VisionBackend for OpenCvBackend {
    fn blur(&self, image: &RgbImage, kernel_size: u32) -> Result<RgbImage> {
        kernel_radius(kernel_size)?;
        let src = Self::rgb_to_mat(image)?;
        let mut dst = Mat::default();
        let side = kernel_size as i32;
        imgproc::blur_def(&src, &mut dst, Size::new(side, side))?;
        Self::mat_to_rgb(&dst)
    }

    fn equalize_local_contrast(
        &self,
        luma: &GrayImage,
        clip_limit: f64,
        tile_grid: u32,
    ) -> Result<GrayImage> {
        let src = Self::gray_to_mat(luma)?;
        let grid = tile_grid as i32;
        let mut clahe = imgproc::create_clahe(clip_limit, Size::new(grid, grid))?;
        let mut dst = Mat::default();
        clahe.apply(&src, &mut dst)?;
        Self::mat_to_gray(&dst)
    }

    fn convert_color(&self, image: &RgbImage, conversion: ColorConversion) -> Result<RgbImage> {
        let code = match conversion {
            ColorConversion::RgbToHsv => imgproc::COLOR_RGB2HSV,
            ColorConversion::RgbToYuv => imgproc::COLOR_RGB2YUV,
            ColorConversion::YuvToRgb => imgproc::COLOR_YUV2RGB,
        };
        let src = Self::rgb_to_mat(image)?;
        let mut dst = Mat::default();
        imgproc::cvt_color_def(&src, &mut dst, code)?;
        Self::mat_to_rgb(&dst)
    }

    fn mask_in_range(&self, hsv: &RgbImage, range: &HsvRange) -> Result<GrayImage> {
        let src = Self::rgb_to_mat(hsv)?;
        let [l0, l1, l2] = range.lower.map(f64::from);
        let [u0, u1, u2] = range.upper.map(f64::from);
        let mut dst = Mat::default();
        core::in_range(
            &src,
            &Scalar::new(l0, l1, l2, 0.0),
            &Scalar::new(u0, u1, u2, 0.0),
            &mut dst,
        )?;
        Self::mat_to_gray(&dst)
    }

    fn label_connected_components(&self, mask: &GrayImage) -> Result<Vec<Centroid>> {
        let src = Self::gray_to_mat(mask)?;
        let mut labels = Mat::default();
        let mut stats = Mat::default();
        let mut centroids = Mat::default();
        let count = imgproc::connected_components_with_stats_def(
            &src,
            &mut labels,
            &mut stats,
            &mut centroids,
        )?;

        (0..count)
            .map(|label| {
                let area = *stats.at_2d::<i32>(label, imgproc::CC_STAT_AREA)?;
                let x = *centroids.at_2d::<f64>(label, 0)?;
                let y = *centroids.at_2d::<f64>(label, 1)?;
                Ok(Centroid::new(x, y, area.max(0) as u32))
            })
            .collect()
    }

    fn detect_edges(&self, image: &RgbImage, low_threshold: f32, high_threshold: f32) -> Result<GrayImage> {
        let src = Self::rgb_to_mat(image)?;
        let mut dst = Mat::default();
        imgproc::canny_def(&src, &mut dst, f64::from(low_threshold), f64::from(high_threshold))?;
        Self::mat_to_gray(&dst)
    }

    fn morphological_close(&self, image: &GrayImage, kernel_size: u32) -> Result<GrayImage> {
        kernel_radius(kernel_size)?;
        let src = Self::gray_to_mat(image)?;
        let side = kernel_size as i32;
        let kernel = imgproc::get_structuring_element_def(imgproc::MORPH_RECT, Size::new(side, side))?;
        let mut dst = Mat::default();
        imgproc::morphology_ex_def(&src, &mut dst, imgproc::MORPH_CLOSE, &kernel)?;
        Self::mat_to_gray(&dst)
    }

    fn find_external_contours(&self, image: &GrayImage) -> Result<Vec<Contour>> {
        let src = Self::gray_to_mat(image)?;
        let mut contours: Vector<Vector<Point>> = Vector::new();
        imgproc::find_contours_def(
            &src,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
        )?;

        Ok(contours
            .iter()
            .map(|contour| contour.iter().map(|p| PixelPoint::new(p.x, p.y)).collect())
            .collect())
    }

    fn approx_polygon(&self, contour: &Contour, tolerance_ratio: f64) -> Result<Contour> {
        if contour.is_empty() {
            return Ok(Vec::new());
        }
        let curve = Self::contour_to_vector(contour);
        let epsilon = tolerance_ratio * self.arc_length(contour)?;
        let mut approx: Vector<Point> = Vector::new();
        imgproc::approx_poly_dp(&curve, &mut approx, epsilon, true)?;
        Ok(approx.iter().map(|p| PixelPoint::new(p.x, p.y)).collect())
    }

    fn arc_length(&self, contour: &Contour) -> Result<f64> {
        Ok(imgproc::arc_length(&Self::contour_to_vector(contour), true)?)
    }
}
