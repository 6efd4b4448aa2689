// src/imaging/contours.rs
//
// Outer borders of the outermost foreground blobs in a binary map. Blobs
// sitting inside the hole of another blob are not reported.

use super::GrayImage;

// Clockwise in image coordinates (y down), starting east.
const DIRS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const WEST: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

/// Closed border of one blob as an ordered list of pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<(i64, i64)>,
}

impl Contour {
    /// Polygon area enclosed by the border (shoelace over pixel centres).
    pub fn area(&self) -> f64 {
        self.moments().m00
    }

    pub fn bounding_rect(&self) -> BoundingRect {
        let (mut min_x, mut min_y) = (i64::MAX, i64::MAX);
        let (mut max_x, mut max_y) = (i64::MIN, i64::MIN);
        for &(x, y) in &self.points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if self.points.is_empty() {
            return BoundingRect { x: 0, y: 0, width: 0, height: 0 };
        }
        BoundingRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    /// Spatial moments of the border polygon (Green's theorem), orientation
    /// normalised so `m00` is never negative.
    pub fn moments(&self) -> Moments {
        let n = self.points.len();
        if n < 3 {
            return Moments { m00: 0.0, m10: 0.0, m01: 0.0 };
        }
        let (mut a00, mut a10, mut a01) = (0.0, 0.0, 0.0);
        for k in 0..n {
            let (xi, yi) = self.points[k];
            let (xj, yj) = self.points[(k + 1) % n];
            let (xi, yi, xj, yj) = (xi as f64, yi as f64, xj as f64, yj as f64);
            let cross = xi * yj - xj * yi;
            a00 += cross;
            a10 += (xi + xj) * cross;
            a01 += (yi + yj) * cross;
        }
        let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
        Moments {
            m00: sign * a00 / 2.0,
            m10: sign * a10 / 6.0,
            m01: sign * a01 / 6.0,
        }
    }

    /// Integer centroid (truncated), `None` for degenerate borders.
    pub fn centroid(&self) -> Option<(i64, i64)> {
        let m = self.moments();
        if m.m00 == 0.0 {
            return None;
        }
        Some(((m.m10 / m.m00) as i64, (m.m01 / m.m00) as i64))
    }
}

/// Flood the background reachable from outside the image (4-connected,
/// the image is treated as framed by background). Foreground blobs are
/// 8-connected, so this is the complementary connectivity.
fn outside_background(src: &GrayImage) -> Vec<bool> {
    let (w, h) = (src.width(), src.height());
    let mut outside = vec![false; w * h];
    let mut stack = Vec::new();
    let mut seed = |x: usize, y: usize, stack: &mut Vec<(usize, usize)>| {
        if src.get(x, y) == 0 && !outside[y * w + x] {
            outside[y * w + x] = true;
            stack.push((x, y));
        }
    };
    for x in 0..w {
        seed(x, 0, &mut stack);
        seed(x, h - 1, &mut stack);
    }
    for y in 0..h {
        seed(0, y, &mut stack);
        seed(w - 1, y, &mut stack);
    }
    while let Some((x, y)) = stack.pop() {
        let mut neighbours = Vec::with_capacity(4);
        if x > 0 {
            neighbours.push((x - 1, y));
        }
        if x + 1 < w {
            neighbours.push((x + 1, y));
        }
        if y > 0 {
            neighbours.push((x, y - 1));
        }
        if y + 1 < h {
            neighbours.push((x, y + 1));
        }
        for (nx, ny) in neighbours {
            let i = ny * w + nx;
            if src.get(nx, ny) == 0 && !outside[i] {
                outside[i] = true;
                stack.push((nx, ny));
            }
        }
    }
    outside
}

fn trace_border(src: &GrayImage, start: (i64, i64)) -> Vec<(i64, i64)> {
    let (w, h) = (src.width() as i64, src.height() as i64);
    let is_fg = |(x, y): (i64, i64)| x >= 0 && y >= 0 && x < w && y < h && src.get(x as usize, y as usize) != 0;

    let mut points = vec![start];
    let mut current = start;
    // Direction from `current` towards the last background pixel examined.
    let mut back = WEST;
    let mut first_move: Option<usize> = None;
    let limit = 4 * (w * h) as usize + 8;

    for _ in 0..limit {
        let mut next = None;
        for step in 1..=8 {
            let d = (back + step) % 8;
            let candidate = (current.0 + DIRS[d].0, current.1 + DIRS[d].1);
            if is_fg(candidate) {
                next = Some((d, candidate));
                break;
            }
        }
        let Some((d, candidate)) = next else {
            // Isolated pixel.
            break;
        };

        if current == start {
            match first_move {
                None => first_move = Some(d),
                Some(first) if first == d => break,
                Some(_) => {}
            }
        }

        // The background pixel checked just before `candidate`, seen from it.
        let prev = (current.0 + DIRS[(d + 7) % 8].0, current.1 + DIRS[(d + 7) % 8].1);
        let rel = (prev.0 - candidate.0, prev.1 - candidate.1);
        back = DIRS.iter().position(|&dir| dir == rel).unwrap_or(WEST);
        current = candidate;
        if current == start {
            continue;
        }
        points.push(current);
    }
    points
}

/// Outer borders of every outermost 8-connected foreground blob, in raster
/// order of each blob's first pixel.
pub fn find_external_contours(src: &GrayImage) -> Vec<Contour> {
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let outside = outside_background(src);
    let mut label = vec![false; w * h];
    let mut contours = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if src.get(x, y) == 0 || label[i] {
                continue;
            }

            // Collect the blob and note whether it touches the outer background.
            let mut external = false;
            let mut stack = vec![(x, y)];
            label[i] = true;
            while let Some((cx, cy)) = stack.pop() {
                if cx == 0 || cy == 0 || cx + 1 == w || cy + 1 == h {
                    external = true;
                }
                for ny in cy.saturating_sub(1)..=(cy + 1).min(h - 1) {
                    for nx in cx.saturating_sub(1)..=(cx + 1).min(w - 1) {
                        let j = ny * w + nx;
                        if src.get(nx, ny) == 0 {
                            if outside[j] {
                                external = true;
                            }
                        } else if !label[j] {
                            label[j] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            if external {
                contours.push(Contour {
                    points: trace_border(src, (x as i64, y as i64)),
                });
            }
        }
    }

    log::debug!("Found {} external contours", contours.len());
    contours
}
