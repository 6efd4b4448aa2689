// src/imaging/canny.rs
use super::filters::replicate;
use super::GrayImage;

// tan(22.5°) and tan(67.5°)
const TG22: f64 = 0.414_213_562_373_095;
const TG67: f64 = 2.414_213_562_373_095;

/// 3x3 Sobel derivatives with replicated borders.
fn sobel(src: &GrayImage) -> (Vec<i32>, Vec<i32>) {
    let (w, h) = (src.width(), src.height());
    let px = |x: isize, y: isize| src.get(replicate(x, w), replicate(y, h)) as i32;
    let mut dx = vec![0i32; w * h];
    let mut dy = vec![0i32; w * h];
    for y in 0..h as isize {
        for x in 0..w as isize {
            let gx = (px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x - 1, y) + px(x - 1, y + 1));
            let gy = (px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x, y - 1) + px(x + 1, y - 1));
            let i = y as usize * w + x as usize;
            dx[i] = gx;
            dy[i] = gy;
        }
    }
    (dx, dy)
}

/// Canny edge extraction with L1 gradient magnitude, four-sector
/// non-maximum suppression and 8-connected hysteresis between `low` and
/// `high`. Edge pixels are 255.
pub fn canny(src: &GrayImage, low: f64, high: f64) -> GrayImage {
    let (w, h) = (src.width(), src.height());
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let (dx, dy) = sobel(src);
    let magnitude: Vec<i32> = dx.iter().zip(&dy).map(|(a, b)| a.abs() + b.abs()).collect();
    let mag_at = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0
        } else {
            magnitude[y as usize * w + x as usize]
        }
    };

    // 0 = suppressed, 1 = weak candidate, 2 = strong
    let mut state = vec![0u8; w * h];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let m = magnitude[i];
            if (m as f64) <= low {
                continue;
            }
            let (xi, yi) = (x as isize, y as isize);
            let xs = dx[i].abs() as f64;
            let ys = dy[i].abs() as f64;

            let is_peak = if ys < xs * TG22 {
                m > mag_at(xi - 1, yi) && m >= mag_at(xi + 1, yi)
            } else if ys > xs * TG67 {
                m > mag_at(xi, yi - 1) && m >= mag_at(xi, yi + 1)
            } else {
                let s: isize = if (dx[i] < 0) != (dy[i] < 0) { -1 } else { 1 };
                m > mag_at(xi - s, yi - 1) && m > mag_at(xi + s, yi + 1)
            };

            if !is_peak {
                continue;
            }
            if (m as f64) > high {
                state[i] = 2;
                stack.push((x, y));
            } else {
                state[i] = 1;
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        out.set(x, y, 255);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let j = ny * w + nx;
                if state[j] == 1 {
                    state[j] = 2;
                    stack.push((nx, ny));
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_image_has_no_edges() {
        let src = GrayImage::from_raw(10, 10, vec![255; 100]).unwrap();
        assert_eq!(canny(&src, 50.0, 150.0).count_nonzero(), 0);
    }

    #[test]
    fn test_vertical_step_yields_thin_vertical_edge() {
        let mut src = GrayImage::new(20, 12);
        src.fill_rect(10, 0, 20, 12, 255);
        let edges = canny(&src, 50.0, 150.0);
        assert!(edges.count_nonzero() > 0);
        for y in 0..12 {
            let row: Vec<usize> = (0..20).filter(|&x| edges.get(x, y) == 255).collect();
            assert_eq!(row.len(), 1, "row {} should hold a single edge pixel", y);
            assert!(row[0] == 9 || row[0] == 10);
        }
    }

    #[test]
    fn test_weak_gradient_below_low_threshold_is_dropped() {
        let mut src = GrayImage::new(20, 12);
        src.fill_rect(10, 0, 20, 12, 10);
        // Peak L1 magnitude is 4 * 10 = 40.
        assert_eq!(canny(&src, 50.0, 150.0).count_nonzero(), 0);
    }
}
