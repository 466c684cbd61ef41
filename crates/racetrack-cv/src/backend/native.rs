//! Pure-Rust backend on top of `image` and `imageproc`

use super::{clahe, kernel_radius, Centroid, ColorConversion, Contour};
use crate::color::{self, HsvRange};
use crate::error::VisionError;
use crate::traits::VisionBackend;
use crate::utils::ImageUtils;
use crate::Result;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::box_filter;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::morphology::close;
use imageproc::point::Point;
use imageproc::region_labelling::{connected_components, Connectivity};

/// Default backend; no native libraries required
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocBackend;

impl ImageprocBackend {
    pub fn new() -> Self {
        Self
    }
}

impl VisionBackend for ImageprocBackend {
    fn blur(&self, image: &RgbImage, kernel_size: u32) -> Result<RgbImage> {
        let radius = kernel_radius(kernel_size)?;
        let planes = ImageUtils::split_channels(image).map(|plane| box_filter(&plane, radius, radius));
        Ok(ImageUtils::merge_channels(&planes))
    }

    fn equalize_local_contrast(
        &self,
        luma: &GrayImage,
        clip_limit: f64,
        tile_grid: u32,
    ) -> Result<GrayImage> {
        if tile_grid == 0 {
            return Err(VisionError::DetectionFailure(
                "CLAHE tile grid must be positive".to_string(),
            ));
        }
        Ok(clahe::equalize(luma, clip_limit, tile_grid))
    }

    fn convert_color(&self, image: &RgbImage, conversion: ColorConversion) -> Result<RgbImage> {
        let convert = match conversion {
            ColorConversion::RgbToHsv => color::rgb_to_hsv,
            ColorConversion::RgbToYuv => color::rgb_to_yuv,
            ColorConversion::YuvToRgb => color::yuv_to_rgb,
        };

        let mut out = image.clone();
        for pixel in out.pixels_mut() {
            *pixel = Rgb(convert(pixel.0));
        }
        Ok(out)
    }

    fn mask_in_range(&self, hsv: &RgbImage, range: &HsvRange) -> Result<GrayImage> {
        Ok(GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
            if range.contains(hsv.get_pixel(x, y).0) {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    fn label_connected_components(&self, mask: &GrayImage) -> Result<Vec<Centroid>> {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
        let count = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;

        // (sum x, sum y, pixels) per label; labels are consecutive from 1
        let mut sums = vec![(0u64, 0u64, 0u32); count + 1];
        for (x, y, label) in labels.enumerate_pixels() {
            let entry = &mut sums[label[0] as usize];
            entry.0 += u64::from(x);
            entry.1 += u64::from(y);
            entry.2 += 1;
        }

        Ok(sums
            .into_iter()
            .map(|(sx, sy, n)| {
                if n == 0 {
                    Centroid::new(0.0, 0.0, 0)
                } else {
                    Centroid::new(sx as f64 / f64::from(n), sy as f64 / f64::from(n), n)
                }
            })
            .collect())
    }

    fn detect_edges(&self, image: &RgbImage, low_threshold: f32, high_threshold: f32) -> Result<GrayImage> {
        if !(low_threshold >= 0.0 && high_threshold >= low_threshold) {
            return Err(VisionError::DetectionFailure(format!(
                "invalid edge thresholds {low_threshold}/{high_threshold}"
            )));
        }

        // gradients are taken per channel and the strongest response kept
        let mut edges = GrayImage::new(image.width(), image.height());
        for plane in ImageUtils::split_channels(image) {
            let plane_edges = canny(&plane, low_threshold, high_threshold);
            for (out, edge) in edges.pixels_mut().zip(plane_edges.pixels()) {
                out[0] = out[0].max(edge[0]);
            }
        }
        Ok(edges)
    }

    fn morphological_close(&self, image: &GrayImage, kernel_size: u32) -> Result<GrayImage> {
        let radius = kernel_radius(kernel_size)?;
        let radius = u8::try_from(radius).map_err(|_| {
            VisionError::DetectionFailure(format!("closing kernel {kernel_size} is too large"))
        })?;
        Ok(close(image, Norm::LInf, radius))
    }

    fn find_external_contours(&self, image: &GrayImage) -> Result<Vec<Contour>> {
        Ok(find_contours::<i32>(image)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| c.points)
            .collect())
    }

    fn approx_polygon(&self, contour: &Contour, tolerance_ratio: f64) -> Result<Contour> {
        if contour.len() < 3 {
            return Ok(contour.clone());
        }
        let epsilon = tolerance_ratio * self.arc_length(contour)?;
        if epsilon <= 0.0 {
            return Ok(contour.clone());
        }
        Ok(approximate_closed(contour, epsilon))
    }

    fn arc_length(&self, contour: &Contour) -> Result<f64> {
        Ok(arc_length(contour, true))
    }
}

/// Douglas–Peucker on a closed curve.
///
/// The curve is split at two mutually distant points, found by three rounds
/// of farthest-point search, so where the trace happens to start never
/// becomes a vertex by itself. Both arcs are simplified as open chains and
/// vertices lying on the segment between their neighbours are dropped.
fn approximate_closed(contour: &[Point<i32>], epsilon: f64) -> Contour {
    let (mut from, mut to) = (0, 0);
    for _ in 0..3 {
        from = to;
        to = farthest_from(contour, from);
    }
    if from == to {
        return vec![contour[0]];
    }

    let mut polygon = approximate_polygon_dp(&cyclic_arc(contour, from, to), epsilon, false);
    let mut back = approximate_polygon_dp(&cyclic_arc(contour, to, from), epsilon, false);

    // each arc ends where the other starts
    polygon.pop();
    back.pop();
    polygon.extend(back);

    drop_collinear(&mut polygon, epsilon);
    polygon
}

fn farthest_from(contour: &[Point<i32>], origin: usize) -> usize {
    let o = contour[origin];
    contour
        .iter()
        .enumerate()
        .fold((origin, 0i64), |best, (i, p)| {
            let dx = i64::from(p.x - o.x);
            let dy = i64::from(p.y - o.y);
            let d = dx * dx + dy * dy;
            if d > best.1 { (i, d) } else { best }
        })
        .0
}

/// Points `from..=to`, wrapping past the end of the contour
fn cyclic_arc(contour: &[Point<i32>], from: usize, to: usize) -> Vec<Point<i32>> {
    let n = contour.len();
    let len = (to + n - from) % n + 1;
    contour.iter().cycle().skip(from).take(len).copied().collect()
}

fn drop_collinear(polygon: &mut Contour, epsilon: f64) {
    let mut i = 0;
    while polygon.len() > 3 && i < polygon.len() {
        let n = polygon.len();
        let prev = polygon[(i + n - 1) % n];
        let next = polygon[(i + 1) % n];
        if lies_between(prev, polygon[i], next, epsilon) {
            polygon.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Whether `point` is within `epsilon / √2` of the line through `start` and
/// `end` and not beyond either end of the segment
fn lies_between(start: Point<i32>, point: Point<i32>, end: Point<i32>, epsilon: f64) -> bool {
    let (dx, dy) = (f64::from(end.x - start.x), f64::from(end.y - start.y));
    let (px, py) = (f64::from(point.x - start.x), f64::from(point.y - start.y));
    let cross = px * dy - py * dx;
    let ahead = px * f64::from(end.x - point.x) + py * f64::from(end.y - point.y);
    cross * cross <= 0.5 * epsilon * epsilon * (dx * dx + dy * dy) && ahead >= 0.0
}
