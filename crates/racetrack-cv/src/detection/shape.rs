//! Contour based collision check
//!
//! The track's safe marker is a triangle. Any edge structure in the centre
//! ROI is expected to be that marker; structure without a triangle among it
//! means the marker has run onto the boundary. An empty ROI is safe.

use super::config::GameConfig;
use crate::backend::Contour;
use crate::roi::Roi;
use crate::traits::VisionBackend;
use crate::Result;
use image::RgbImage;
use log::debug;

/// External contours of the centre ROI, in ROI coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CenterContours {
    pub roi: Roi,
    pub contours: Vec<Contour>,
    /// Polygon approximation of each contour, same order
    pub polygons: Vec<Contour>,
}

impl CenterContours {
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Number of polygons with exactly `vertices` corners
    pub fn count_with_vertices(&self, vertices: usize) -> usize {
        self.polygons.iter().filter(|p| p.len() == vertices).count()
    }
}

/// Result of one collision check
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionVerdict {
    pub collided: bool,
    pub contours: CenterContours,
    /// Contours classified as the safe marker
    pub triangles: usize,
}

/// Classifies the edge structure at the frame centre
#[derive(Debug, Clone)]
pub struct ShapeClassifier {
    config: GameConfig,
}

impl ShapeClassifier {
    /// Create new classifier
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    /// Edges, closing, external contours and their polygon approximations
    pub fn detect_center_contours<B: VisionBackend>(&self, backend: &B, frame: &RgbImage) -> Result<CenterContours> {
        let shape = &self.config.shape;
        let roi = Roi::for_frame(frame, self.config.roi.half_size, self.config.roi.policy)?;

        let edges = backend.detect_edges(&roi.crop(frame), shape.canny_low, shape.canny_high)?;
        let closed = backend.morphological_close(&edges, shape.close_kernel)?;
        let contours = backend.find_external_contours(&closed)?;
        let polygons = contours
            .iter()
            .map(|contour| backend.approx_polygon(contour, shape.approx_ratio))
            .collect::<Result<Vec<_>>>()?;

        Ok(CenterContours {
            roi,
            contours,
            polygons,
        })
    }

    /// Collided iff at least one contour exists and none is a triangle
    pub fn check_collision<B: VisionBackend>(&self, backend: &B, frame: &RgbImage) -> Result<CollisionVerdict> {
        let contours = self.detect_center_contours(backend, frame)?;
        let triangles = contours.count_with_vertices(self.config.shape.safe_vertices);
        let collided = !contours.is_empty() && triangles == 0;

        if collided {
            debug!("collision detected ({} contours)", contours.contours.len());
        }

        Ok(CollisionVerdict {
            collided,
            contours,
            triangles,
        })
    }
}
