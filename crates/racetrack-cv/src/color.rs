//! Colour bands and pixel colour-space conversions
//!
//! HSV values follow the 8-bit convention used by OpenCV: hue in `[0, 180)`,
//! saturation and value in `[0, 255]`. YUV is the analogue YUV used for
//! luma-only contrast equalisation.

use serde::{Deserialize, Serialize};

/// Inclusive box in HSV space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|c| self.lower[c] > self.upper[c])
    }
}

/// Colour a zone is painted in: one HSV range, or the union of two for hues
/// that wrap around 0 (red)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBand {
    pub primary: HsvRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<HsvRange>,
}

impl ColorBand {
    pub const fn single(range: HsvRange) -> Self {
        Self {
            primary: range,
            secondary: None,
        }
    }

    pub const fn union(primary: HsvRange, secondary: HsvRange) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// Start zone colour
    pub const fn blue() -> Self {
        Self::single(HsvRange::new([90, 128, 64], [150, 255, 255]))
    }

    /// Goal zone colour
    pub const fn red() -> Self {
        Self::union(
            HsvRange::new([0, 50, 50], [6, 255, 255]),
            HsvRange::new([174, 50, 50], [180, 255, 255]),
        )
    }

    pub fn ranges(&self) -> impl Iterator<Item = &HsvRange> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        self.ranges().any(|range| range.contains(hsv))
    }
}

/// Inclusive ±`tolerance` test on both axes
pub fn is_centered(point: (f64, f64), center: (f64, f64), tolerance: f64) -> bool {
    (point.0 - center.0).abs() <= tolerance && (point.1 - center.1).abs() <= tolerance
}

/// RGB to 8-bit HSV
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = i32::from(max - min);
    let v = i32::from(max);

    let s = if max == 0 { 0 } else { (255 * diff + v / 2) / v };

    let h = if diff == 0 {
        0
    } else {
        let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
        // sextant offset in units of `diff`; 6 * diff spans 180 hue steps
        let sextant = if r == v {
            g - b
        } else if g == v {
            (b - r) + 2 * diff
        } else {
            (r - g) + 4 * diff
        };
        let h = (30.0 * f64::from(sextant) / f64::from(diff)).round() as i32;
        if h < 0 { h + 180 } else { h.min(179) }
    };

    [h as u8, s as u8, max]
}

/// RGB to YUV (luma in channel 0, chroma offset by 128)
pub fn rgb_to_yuv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = 0.492 * (b - y) + 128.0;
    let v = 0.877 * (r - y) + 128.0;
    [saturate(y), saturate(u), saturate(v)]
}

/// Inverse of [`rgb_to_yuv`]
pub fn yuv_to_rgb([y, u, v]: [u8; 3]) -> [u8; 3] {
    let (y, u, v) = (f64::from(y), f64::from(u) - 128.0, f64::from(v) - 128.0);
    let r = y + 1.140 * v;
    let g = y - 0.395 * u - 0.581 * v;
    let b = y + 2.032 * u;
    [saturate(r), saturate(g), saturate(b)]
}

fn saturate(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
