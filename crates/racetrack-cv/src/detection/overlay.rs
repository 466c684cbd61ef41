//! Frame annotation
//!
//! Everything here draws on the output copy of a frame; detection never sees
//! these pixels.

use super::config::OverlayConfig;
use super::shape::CenterContours;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

fn rgb((r, g, b): (u8, u8, u8)) -> Rgb<u8> {
    Rgb([r, g, b])
}

fn frame_center(frame: &RgbImage) -> (i32, i32) {
    ((frame.width() / 2) as i32, (frame.height() / 2) as i32)
}

/// Ring at the frame centre (READY)
pub fn draw_circle_marker(frame: &mut RgbImage, config: &OverlayConfig) {
    let center = frame_center(frame);
    let radius = config.marker_radius as i32;
    for r in [radius, radius + 1] {
        draw_hollow_circle_mut(frame, center, r, rgb(config.marker_color));
    }
}

/// Filled upward triangle at the frame centre (PLAY, GAME_OVER)
pub fn draw_triangle_marker(frame: &mut RgbImage, config: &OverlayConfig) {
    let (cx, cy) = frame_center(frame);
    let r = config.marker_radius.max(1) as f64;
    let half_base = (r * 3f64.sqrt() / 2.0).round() as i32;
    let drop = (r / 2.0).round() as i32;

    let triangle = [
        Point::new(cx, cy - r as i32),
        Point::new(cx + half_base, cy + drop),
        Point::new(cx - half_base, cy + drop),
    ];
    draw_polygon_mut(frame, &triangle, rgb(config.marker_color));
}

/// Approximated contours, translated from ROI into frame coordinates
pub fn draw_contours(frame: &mut RgbImage, contours: &CenterContours, config: &OverlayConfig) {
    let color = rgb(config.contour_color);
    let spread = (config.contour_thickness.max(1) / 2) as i32;

    for polygon in &contours.polygons {
        let points: Vec<Point<i32>> = polygon.iter().map(|p| contours.roi.to_frame(*p)).collect();
        for (i, start) in points.iter().enumerate() {
            let end = points[(i + 1) % points.len()];
            for dy in -spread..=spread {
                for dx in -spread..=spread {
                    draw_line_segment_mut(
                        frame,
                        ((start.x + dx) as f32, (start.y + dy) as f32),
                        ((end.x + dx) as f32, (end.y + dy) as f32),
                        color,
                    );
                }
            }
        }
    }
}
