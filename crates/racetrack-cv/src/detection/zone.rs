//! Colour zone detection at the frame centre

use super::config::GameConfig;
use crate::backend::{Centroid, ColorConversion};
use crate::color::{is_centered, ColorBand};
use crate::roi::Roi;
use crate::traits::VisionBackend;
use crate::utils::ImageUtils;
use crate::Result;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Result of one zone check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneVerdict {
    /// Largest blob of the band sits within tolerance of the ROI centre
    pub centered: bool,
    /// Largest blob in ROI coordinates
    pub candidate: Option<Centroid>,
    pub roi: Roi,
}

/// Decides whether a marker of a given colour occupies the centre ROI
#[derive(Debug, Clone)]
pub struct ZoneDetector {
    config: GameConfig,
}

impl ZoneDetector {
    /// Create new detector
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    /// Run the zone check of `band` against `frame`
    pub fn detect<B: VisionBackend>(&self, backend: &B, frame: &RgbImage, band: &ColorBand) -> Result<ZoneVerdict> {
        let roi = Roi::for_frame(frame, self.config.roi.half_size, self.config.roi.policy)?;
        let hsv = self.preprocess(backend, &roi.crop(frame))?;

        let mut mask = backend.mask_in_range(&hsv, &band.primary)?;
        if let Some(secondary) = &band.secondary {
            mask = ImageUtils::union_masks(&mask, &backend.mask_in_range(&hsv, secondary)?);
        }

        let candidate = largest_component(backend.label_connected_components(&mask)?);
        let centered = candidate.is_some_and(|c| {
            is_centered(c.position(), roi.local_center(), self.config.roi.center_tolerance)
        });

        Ok(ZoneVerdict {
            centered,
            candidate,
            roi,
        })
    }

    /// Blur, equalise luma, convert to HSV
    fn preprocess<B: VisionBackend>(&self, backend: &B, crop: &RgbImage) -> Result<RgbImage> {
        let params = &self.config.preprocessing;
        let blurred = backend.blur(crop, params.blur_kernel)?;

        let mut yuv = backend.convert_color(&blurred, ColorConversion::RgbToYuv)?;
        let luma = ImageUtils::channel(&yuv, 0);
        let luma = backend.equalize_local_contrast(&luma, params.clahe_clip_limit, params.clahe_tile_grid)?;
        ImageUtils::set_channel(&mut yuv, 0, &luma);

        let rgb = backend.convert_color(&yuv, ColorConversion::YuvToRgb)?;
        backend.convert_color(&rgb, ColorConversion::RgbToHsv)
    }
}

/// Largest foreground component; label 0 is the background
fn largest_component(components: Vec<Centroid>) -> Option<Centroid> {
    let mut blobs: Vec<Centroid> = components.into_iter().skip(1).filter(|c| c.area > 0).collect();
    // stable: equal areas keep label order
    blobs.sort_by(|a, b| b.area.cmp(&a.area));
    blobs.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Contour, ImageprocBackend};
    use crate::color::HsvRange;
    use crate::error::VisionError;
    use crate::roi::RoiPolicy;
    use image::{GrayImage, Luma, Rgb};
    use imageproc::drawing::draw_filled_circle_mut;

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    fn frame_with_blob(color: Rgb<u8>, center: (i32, i32)) -> RgbImage {
        let mut frame = RgbImage::from_pixel(160, 120, Rgb([255, 255, 255]));
        draw_filled_circle_mut(&mut frame, center, 10, color);
        frame
    }

    fn detector() -> ZoneDetector {
        ZoneDetector::new(GameConfig::default())
    }

    #[test]
    fn test_centered_blue_blob() -> Result<()> {
        let verdict = detector().detect(&ImageprocBackend, &frame_with_blob(BLUE, (80, 60)), &ColorBand::blue())?;
        assert!(verdict.centered);

        let candidate = verdict.candidate.ok_or_else(|| VisionError::DetectionFailure("no blob".into()))?;
        assert!((candidate.x - 30.0).abs() < 1.5, "{candidate:?}");
        assert!((candidate.y - 30.0).abs() < 1.5, "{candidate:?}");
        Ok(())
    }

    #[test]
    fn test_wrong_colour_is_not_a_zone() -> Result<()> {
        let frame = frame_with_blob(RED, (80, 60));
        let verdict = detector().detect(&ImageprocBackend, &frame, &ColorBand::blue())?;
        assert!(!verdict.centered);
        assert!(verdict.candidate.is_none());

        assert!(detector().detect(&ImageprocBackend, &frame, &ColorBand::red())?.centered);
        Ok(())
    }

    #[test]
    fn test_blob_outside_roi_is_ignored() -> Result<()> {
        let verdict = detector().detect(&ImageprocBackend, &frame_with_blob(BLUE, (20, 20)), &ColorBand::blue())?;
        assert!(!verdict.centered);
        assert!(verdict.candidate.is_none());
        Ok(())
    }

    #[test]
    fn test_off_centre_blob_in_roi_corner() -> Result<()> {
        // only a sliver of the blob reaches into the ROI's top-left corner
        let verdict = detector().detect(&ImageprocBackend, &frame_with_blob(BLUE, (48, 28)), &ColorBand::blue())?;
        assert!(verdict.candidate.is_some());
        assert!(!verdict.centered);
        Ok(())
    }

    #[test]
    fn test_largest_component_wins() {
        let components = vec![
            Centroid::new(30.0, 30.0, 3000),
            Centroid::new(5.0, 5.0, 12),
            Centroid::new(31.0, 29.0, 40),
            Centroid::new(50.0, 50.0, 40),
        ];
        assert_eq!(largest_component(components), Some(Centroid::new(31.0, 29.0, 40)));
        assert_eq!(largest_component(vec![Centroid::new(30.0, 30.0, 3600)]), None);
    }

    #[test]
    fn test_small_frame_policies() -> Result<()> {
        let frame = RgbImage::from_pixel(40, 40, BLUE);
        assert!(matches!(
            detector().detect(&ImageprocBackend, &frame, &ColorBand::blue()),
            Err(VisionError::InvalidFrameSize { .. })
        ));

        let mut config = GameConfig::default();
        config.roi.policy = RoiPolicy::Clamp;
        let verdict = ZoneDetector::new(config).detect(&ImageprocBackend, &frame, &ColorBand::blue())?;
        assert_eq!((verdict.roi.width, verdict.roi.height), (40, 40));
        assert!(verdict.centered);
        Ok(())
    }

    /// Reports one blob at a fixed ROI position for any mask
    struct FixedBlob(Centroid);

    impl VisionBackend for FixedBlob {
        fn blur(&self, image: &RgbImage, _kernel_size: u32) -> Result<RgbImage> {
            Ok(image.clone())
        }

        fn equalize_local_contrast(&self, luma: &GrayImage, _clip: f64, _grid: u32) -> Result<GrayImage> {
            Ok(luma.clone())
        }

        fn convert_color(&self, image: &RgbImage, _conversion: ColorConversion) -> Result<RgbImage> {
            Ok(image.clone())
        }

        fn mask_in_range(&self, hsv: &RgbImage, _range: &HsvRange) -> Result<GrayImage> {
            Ok(GrayImage::from_pixel(hsv.width(), hsv.height(), Luma([255])))
        }

        fn label_connected_components(&self, _mask: &GrayImage) -> Result<Vec<Centroid>> {
            Ok(vec![Centroid::new(0.0, 0.0, 0), self.0])
        }

        fn detect_edges(&self, image: &RgbImage, _low: f32, _high: f32) -> Result<GrayImage> {
            Ok(GrayImage::new(image.width(), image.height()))
        }

        fn morphological_close(&self, image: &GrayImage, _kernel_size: u32) -> Result<GrayImage> {
            Ok(image.clone())
        }

        fn find_external_contours(&self, _image: &GrayImage) -> Result<Vec<Contour>> {
            Ok(Vec::new())
        }

        fn approx_polygon(&self, contour: &Contour, _tolerance_ratio: f64) -> Result<Contour> {
            Ok(contour.clone())
        }

        fn arc_length(&self, _contour: &Contour) -> Result<f64> {
            Ok(0.0)
        }
    }

    #[test]
    fn test_tolerance_edge_through_detect() -> Result<()> {
        let frame = RgbImage::from_pixel(160, 120, Rgb([255, 255, 255]));
        let centered_at = |x: f64, y: f64| -> Result<bool> {
            let backend = FixedBlob(Centroid::new(x, y, 50));
            Ok(detector().detect(&backend, &frame, &ColorBand::blue())?.centered)
        };

        // ROI centre is (30, 30) with a tolerance of 25
        assert!(centered_at(55.0, 30.0)?);
        assert!(!centered_at(56.0, 30.0)?);
        assert!(centered_at(30.0, 5.0)?);
        assert!(!centered_at(30.0, 4.0)?);
        assert!(centered_at(55.0, 55.0)?);
        assert!(!centered_at(55.0, 56.0)?);
        Ok(())
    }
}
