// src/imaging/filters.rs
use super::GrayImage;

const BINOMIAL_5: [u32; 5] = [1, 4, 6, 4, 1];

/// Mirror an out-of-range index back into `0..n` without repeating the edge
/// pixel (`gfedcb|abcdefgh|gfedcba`).
#[inline]
pub(crate) fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * (n - 1) - i;
        } else {
            return i as usize;
        }
    }
}

#[inline]
pub(crate) fn replicate(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}

/// 5x5 Gaussian smoothing with the binomial kernel `[1 4 6 4 1] / 16`
/// applied separably, reflect-101 borders.
pub fn gaussian_blur_5x5(src: &GrayImage) -> GrayImage {
    let (w, h) = (src.width(), src.height());
    let mut horizontal = vec![0u32; w * h];
    for y in 0..h {
        let row = src.row(y);
        for x in 0..w {
            let mut acc = 0u32;
            for (k, weight) in BINOMIAL_5.iter().enumerate() {
                let sx = reflect101(x as isize + k as isize - 2, w);
                acc += weight * row[sx] as u32;
            }
            horizontal[y * w + x] = acc;
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u32;
            for (k, weight) in BINOMIAL_5.iter().enumerate() {
                let sy = reflect101(y as isize + k as isize - 2, h);
                acc += weight * horizontal[sy * w + x];
            }
            out.set(x, y, ((acc + 128) >> 8).min(255) as u8);
        }
    }
    out
}

/// Normalized 1-D Gaussian kernel. A non-positive sigma is derived from the
/// kernel size as `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (size as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}

/// Separable Gaussian-weighted local mean with replicated borders, rounded
/// back to 8 bits.
fn gaussian_local_mean(src: &GrayImage, block_size: usize) -> GrayImage {
    let (w, h) = (src.width(), src.height());
    let kernel = gaussian_kernel(block_size, 0.0);
    let radius = (block_size / 2) as isize;

    let mut horizontal = vec![0f64; w * h];
    for y in 0..h {
        let row = src.row(y);
        for x in 0..w {
            horizontal[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * row[replicate(x as isize + k as isize - radius, w)] as f64)
                .sum();
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let acc: f64 = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    weight * horizontal[replicate(y as isize + k as isize - radius, h) * w + x]
                })
                .sum();
            out.set(x, y, acc.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

/// Inverted adaptive threshold: a pixel becomes 255 when it is at least
/// `offset` darker than its Gaussian-weighted neighbourhood, else 0.
pub fn adaptive_threshold_inv(src: &GrayImage, block_size: usize, offset: f64) -> GrayImage {
    let mean = gaussian_local_mean(src, block_size);
    let offset = offset.ceil() as i32;
    let mut out = GrayImage::new(src.width(), src.height());
    for (i, (&s, &m)) in src.data().iter().zip(mean.data()).enumerate() {
        let diff = s as i32 - m as i32;
        if diff <= -offset {
            out.set(i % src.width(), i / src.width(), 255);
        }
    }
    out
}

/// Dilation with a 3x3 square structuring element, one iteration.
/// Out-of-image neighbours are ignored.
pub fn dilate_3x3(src: &GrayImage) -> GrayImage {
    let (w, h) = (src.width(), src.height());
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        for x in 0..w {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            let mut max = 0u8;
            for yy in y0..=y1 {
                for &v in &src.row(yy)[x0..=x1] {
                    max = max.max(v);
                }
            }
            out.set(x, y, max);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect101_borders() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(-3, 1), 0);
    }

    #[test]
    fn test_gaussian_kernel_sigma_from_size() {
        let kernel = gaussian_kernel(11, 0.0);
        assert_eq!(kernel.len(), 11);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(kernel[5] > kernel[4] && kernel[4] > kernel[0]);
        assert!((kernel[0] - kernel[10]).abs() < 1e-15);
    }

    #[test]
    fn test_blur_keeps_uniform_image() {
        let src = GrayImage::from_raw(7, 6, vec![123; 42]).unwrap();
        assert_eq!(gaussian_blur_5x5(&src), src);
    }

    #[test]
    fn test_blur_spreads_single_pixel() {
        let mut src = GrayImage::new(9, 9);
        src.set(4, 4, 255);
        let out = gaussian_blur_5x5(&src);
        // Centre weight is 36/256.
        assert_eq!(out.get(4, 4), 36);
        assert!(out.get(3, 4) > 0);
        assert_eq!(out.get(0, 0), 0);
    }

    #[test]
    fn test_adaptive_threshold_marks_dark_pixels() {
        let mut src = GrayImage::from_raw(21, 21, vec![200; 441]).unwrap();
        src.set(10, 10, 10);
        let out = adaptive_threshold_inv(&src, 11, 2.0);
        assert_eq!(out.get(10, 10), 255);
        assert_eq!(out.get(0, 0), 0);
        assert_eq!(out.count_nonzero(), 1);
    }

    #[test]
    fn test_dilate_grows_pixel_to_square() {
        let mut src = GrayImage::new(5, 5);
        src.set(2, 2, 255);
        let out = dilate_3x3(&src);
        assert_eq!(out.count_nonzero(), 9);
        assert_eq!(out.get(1, 1), 255);
        assert_eq!(out.get(0, 0), 0);

        let mut corner = GrayImage::new(3, 3);
        corner.set(0, 0, 255);
        assert_eq!(dilate_3x3(&corner).count_nonzero(), 4);
    }
}
