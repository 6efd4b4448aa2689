// src/imaging/color.rs
use super::ChartImage;

/// 8-bit HSV: hue in half-degrees `[0, 180)`, saturation and value in
/// `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> Hsv {
    let (rf, gf, bf) = (r as f64, g as f64, b as f64);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { (255.0 * diff / v).round() } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    let mut h = (h / 2.0).round();
    if h >= 180.0 {
        h -= 180.0;
    }

    Hsv {
        h: h as u8,
        s: s as u8,
        v: v as u8,
    }
}

/// Inclusive HSV box, same units as [`Hsv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.lower[0]..=self.upper[0]).contains(&hsv.h)
            && (self.lower[1]..=self.upper[1]).contains(&hsv.s)
            && (self.lower[2]..=self.upper[2]).contains(&hsv.v)
    }
}

/// Count pixels in rows `y0..height` that fall inside any of `ranges`.
/// A pixel matching several ranges counts once.
pub fn count_in_ranges(image: &ChartImage, y0: usize, ranges: &[HsvRange]) -> usize {
    let mut count = 0;
    for y in y0.min(image.height())..image.height() {
        for x in 0..image.width() {
            let hsv = rgb_to_hsv(image.rgb(x, y));
            if ranges.iter().any(|r| r.contains(hsv)) {
                count += 1;
            }
        }
    }
    count
}
