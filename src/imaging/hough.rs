// src/imaging/hough.rs
//
// Progressive probabilistic Hough transform for line segments.

use super::GrayImage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::f64::consts::PI;

// Fixed so that repeated runs over the same edge map return the same segments.
const SHUFFLE_SEED: u64 = 0x5EED_11E5;
const SHIFT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughParams {
    pub rho: f64,
    pub theta: f64,
    pub threshold: u32,
    pub min_line_length: f64,
    pub max_line_gap: i64,
}

impl HoughParams {
    /// One-pixel / one-degree resolution with the given vote threshold and
    /// segment constraints.
    pub fn new(threshold: u32, min_line_length: f64, max_line_gap: i64) -> Self {
        Self {
            rho: 1.0,
            theta: PI / 180.0,
            threshold,
            min_line_length,
            max_line_gap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSegment {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl LineSegment {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn dx(&self) -> i64 {
        self.x2 - self.x1
    }

    pub fn dy(&self) -> i64 {
        self.y2 - self.y1
    }

    /// Image-space slope (y grows downward); `None` for vertical segments.
    pub fn slope(&self) -> Option<f64> {
        if self.dx() == 0 {
            None
        } else {
            Some(self.dy() as f64 / self.dx() as f64)
        }
    }
}

struct Walk {
    x0: i64,
    y0: i64,
    dx0: i64,
    dy0: i64,
    xflag: bool,
}

impl Walk {
    #[inline]
    fn pixel(&self, x: i64, y: i64) -> (i64, i64) {
        if self.xflag {
            (x, y >> SHIFT)
        } else {
            (x >> SHIFT, y)
        }
    }
}

/// Detect line segments on a binary edge map. Every non-zero pixel is a
/// candidate; pixels are visited in a shuffled order, vote into a
/// (rho, theta) accumulator, and as soon as a bin reaches `threshold` the
/// corresponding line is walked in both directions (tolerating gaps up to
/// `max_line_gap`). Segments at least `min_line_length` long are returned and
/// their pixels removed from further voting.
pub fn probabilistic_hough(edges: &GrayImage, params: &HoughParams) -> Vec<LineSegment> {
    let (width, height) = (edges.width(), edges.height());
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let num_angle = (PI / params.theta).round() as usize;
    let num_rho = (((width + height) * 2 + 1) as f64 / params.rho).round() as usize;
    let trig: Vec<(f64, f64)> = (0..num_angle)
        .map(|n| {
            let angle = n as f64 * params.theta;
            (angle.cos() / params.rho, angle.sin() / params.rho)
        })
        .collect();

    let mut accum = vec![0i32; num_angle * num_rho];
    let mut mask = vec![false; width * height];
    let mut points: Vec<(usize, usize)> = Vec::new();
    for y in 0..height {
        for (x, &v) in edges.row(y).iter().enumerate() {
            if v != 0 {
                mask[y * width + x] = true;
                points.push((x, y));
            }
        }
    }
    points.shuffle(&mut StdRng::seed_from_u64(SHUFFLE_SEED));

    let rho_offset = (num_rho as i64 - 1) / 2;
    let rho_index = |x: usize, y: usize, n: usize| -> usize {
        let (c, s) = trig[n];
        let r = (x as f64 * c + y as f64 * s).round() as i64 + rho_offset;
        r.clamp(0, num_rho as i64 - 1) as usize
    };

    let mut segments = Vec::new();

    for &(j, i) in &points {
        if !mask[i * width + j] {
            continue;
        }

        let mut max_val = params.threshold as i32 - 1;
        let mut max_n = 0usize;
        for n in 0..num_angle {
            let idx = n * num_rho + rho_index(j, i, n);
            accum[idx] += 1;
            if accum[idx] > max_val {
                max_val = accum[idx];
                max_n = n;
            }
        }

        if max_val < params.threshold as i32 {
            continue;
        }

        let (cos_n, sin_n) = trig[max_n];
        let a = -sin_n;
        let b = cos_n;
        let half = 1i64 << (SHIFT - 1);
        let walk = if a.abs() > b.abs() {
            Walk {
                x0: j as i64,
                y0: ((i as i64) << SHIFT) + half,
                dx0: if a > 0.0 { 1 } else { -1 },
                dy0: (b * (1i64 << SHIFT) as f64 / a.abs()).round() as i64,
                xflag: true,
            }
        } else {
            Walk {
                x0: ((j as i64) << SHIFT) + half,
                y0: i as i64,
                dx0: (a * (1i64 << SHIFT) as f64 / b.abs()).round() as i64,
                dy0: if b > 0.0 { 1 } else { -1 },
                xflag: false,
            }
        };

        let mut line_end = [(j as i64, i as i64); 2];
        for (k, end) in line_end.iter_mut().enumerate() {
            let (mut dx, mut dy) = (walk.dx0, walk.dy0);
            if k > 0 {
                dx = -dx;
                dy = -dy;
            }
            let (mut x, mut y) = (walk.x0, walk.y0);
            let mut gap = 0i64;
            loop {
                let (j1, i1) = walk.pixel(x, y);
                if j1 < 0 || j1 >= width as i64 || i1 < 0 || i1 >= height as i64 {
                    break;
                }
                if mask[i1 as usize * width + j1 as usize] {
                    gap = 0;
                    *end = (j1, i1);
                } else {
                    gap += 1;
                    if gap > params.max_line_gap {
                        break;
                    }
                }
                x += dx;
                y += dy;
            }
        }

        let good_line = (line_end[1].0 - line_end[0].0).abs() as f64 >= params.min_line_length
            || (line_end[1].1 - line_end[0].1).abs() as f64 >= params.min_line_length;

        for (k, end) in line_end.iter().enumerate() {
            let (mut dx, mut dy) = (walk.dx0, walk.dy0);
            if k > 0 {
                dx = -dx;
                dy = -dy;
            }
            let (mut x, mut y) = (walk.x0, walk.y0);
            loop {
                let (j1, i1) = walk.pixel(x, y);
                if j1 < 0 || j1 >= width as i64 || i1 < 0 || i1 >= height as i64 {
                    break;
                }
                let m = i1 as usize * width + j1 as usize;
                if mask[m] {
                    if good_line {
                        for n in 0..num_angle {
                            let idx = n * num_rho + rho_index(j1 as usize, i1 as usize, n);
                            accum[idx] -= 1;
                        }
                    }
                    mask[m] = false;
                }
                if (j1, i1) == *end {
                    break;
                }
                x += dx;
                y += dy;
            }
        }

        if good_line {
            segments.push(LineSegment::new(
                line_end[0].0,
                line_end[0].1,
                line_end[1].0,
                line_end[1].1,
            ));
        }
    }

    log::debug!(
        "Hough: {} edge points, {} segments (threshold {}, min length {}, gap {})",
        points.len(),
        segments.len(),
        params.threshold,
        params.min_line_length,
        params.max_line_gap
    );
    segments
}
