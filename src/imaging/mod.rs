// src/imaging/mod.rs
//
// Pixel buffers and the preprocessing chain every detector reads from.

use crate::errors::{AnalyzerError, Result};

pub mod canny;
pub mod color;
pub mod contours;
pub mod decode;
pub mod filters;
pub mod hough;

pub use contours::{find_external_contours, Contour};
pub use decode::decode_chart_image;
pub use hough::{probabilistic_hough, HoughParams, LineSegment};

const ADAPTIVE_BLOCK_SIZE: usize = 11;
const ADAPTIVE_OFFSET: f64 = 2.0;
const CANNY_LOW: f64 = 50.0;
const CANNY_HIGH: f64 = 150.0;

/// Single-channel 8-bit buffer, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(AnalyzerError::InvalidImage(format!(
                "expected {} bytes for {}x{} gray image, got {}",
                width * height,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Mean over columns `x0..x1` and rows `y0..y1`; 0.0 for an empty window.
    pub fn region_mean(&self, x0: usize, x1: usize, y0: usize, y1: usize) -> f64 {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return 0.0;
        }
        let mut sum: u64 = 0;
        for y in y0..y1 {
            sum += self.row(y)[x0..x1].iter().map(|&v| v as u64).sum::<u64>();
        }
        sum as f64 / ((x1 - x0) * (y1 - y0)) as f64
    }

    /// Sum of every row, indexed by y.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.height)
            .map(|y| self.row(y).iter().map(|&v| v as f64).sum())
            .collect()
    }

    /// Draw a straight line with Bresenham stepping. Used to build synthetic
    /// edge maps.
    pub fn draw_line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, value: u8) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                self.set(x as usize, y as usize, value);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, value: u8) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.set(x, y, value);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Gray,
    Rgb,
}

impl PixelLayout {
    pub fn channels(&self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
        }
    }
}

/// The uploaded chart as captured. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    width: usize,
    height: usize,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl ChartImage {
    pub fn new(width: usize, height: usize, layout: PixelLayout, data: Vec<u8>) -> Result<Self> {
        let expected = width * height * layout.channels();
        if data.len() != expected {
            return Err(AnalyzerError::InvalidImage(format!(
                "expected {} bytes for {}x{} {:?} image, got {}",
                expected,
                width,
                height,
                layout,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    pub fn from_gray(gray: GrayImage) -> Self {
        Self {
            width: gray.width,
            height: gray.height,
            layout: PixelLayout::Gray,
            data: gray.data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn is_color(&self) -> bool {
        self.layout == PixelLayout::Rgb
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGB triple at `(x, y)`; gray pixels are replicated across channels.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        match self.layout {
            PixelLayout::Gray => {
                let v = self.data[y * self.width + x];
                [v, v, v]
            }
            PixelLayout::Rgb => {
                let i = (y * self.width + x) * 3;
                [self.data[i], self.data[i + 1], self.data[i + 2]]
            }
        }
    }

    /// Luminance conversion, `Y = 0.299R + 0.587G + 0.114B`.
    pub fn to_gray(&self) -> GrayImage {
        match self.layout {
            PixelLayout::Gray => GrayImage {
                width: self.width,
                height: self.height,
                data: self.data.clone(),
            },
            PixelLayout::Rgb => {
                let data = self
                    .data
                    .chunks_exact(3)
                    .map(|px| {
                        let y = 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
                        y.round().clamp(0.0, 255.0) as u8
                    })
                    .collect();
                GrayImage {
                    width: self.width,
                    height: self.height,
                    data,
                }
            }
        }
    }
}

/// Derived read-only views shared by all detectors for one analysis run.
#[derive(Debug, Clone)]
pub struct PreprocessedViews {
    pub gray: GrayImage,
    pub edges: GrayImage,
    pub original: ChartImage,
}

impl PreprocessedViews {
    pub fn width(&self) -> usize {
        self.gray.width()
    }

    pub fn height(&self) -> usize {
        self.gray.height()
    }
}

/// Gray → 5x5 Gaussian → inverted adaptive threshold → Canny → 3x3 dilation.
pub fn preprocess_image(image: &ChartImage) -> Result<PreprocessedViews> {
    if image.is_empty() {
        return Err(AnalyzerError::InvalidImage(format!(
            "image has zero area ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let gray = image.to_gray();
    let blurred = filters::gaussian_blur_5x5(&gray);
    let thresholded =
        filters::adaptive_threshold_inv(&blurred, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);
    let edges = canny::canny(&thresholded, CANNY_LOW, CANNY_HIGH);
    let dilated = filters::dilate_3x3(&edges);

    log::debug!(
        "Preprocessed {}x{} chart ({} edge pixels after dilation)",
        image.width(),
        image.height(),
        dilated.count_nonzero()
    );

    Ok(PreprocessedViews {
        gray,
        edges: dilated,
        original: image.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_area_image_is_rejected() {
        let image = ChartImage::new(0, 10, PixelLayout::Gray, Vec::new()).unwrap();
        match preprocess_image(&image) {
            Err(AnalyzerError::InvalidImage(_)) => {}
            other => panic!("expected InvalidImage, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_buffer_length_mismatch_is_rejected() {
        assert!(ChartImage::new(4, 4, PixelLayout::Rgb, vec![0; 16]).is_err());
        assert!(GrayImage::from_raw(3, 3, vec![0; 8]).is_err());
    }

    #[test]
    fn test_luminance_conversion() {
        let image = ChartImage::new(3, 1, PixelLayout::Rgb, vec![255, 0, 0, 0, 255, 0, 0, 0, 255])
            .unwrap();
        let gray = image.to_gray();
        assert_eq!(gray.data(), &[76, 150, 29]);
    }

    #[test]
    fn test_uniform_image_produces_no_edges() {
        let image = ChartImage::from_gray(GrayImage::from_raw(40, 30, vec![200; 1200]).unwrap());
        let views = preprocess_image(&image).unwrap();
        assert_eq!(views.edges.count_nonzero(), 0);
        assert_eq!(views.gray.width(), 40);
        assert_eq!(views.original, image);
    }

    #[test]
    fn test_dark_line_on_light_background_produces_edges() {
        let mut gray = GrayImage::from_raw(80, 60, vec![230; 80 * 60]).unwrap();
        gray.fill_rect(10, 28, 70, 32, 20);
        let views = preprocess_image(&ChartImage::from_gray(gray)).unwrap();
        assert!(views.edges.count_nonzero() > 0);
        // Nothing survives far away from the drawn bar.
        assert_eq!(views.edges.get(40, 5), 0);
    }

    #[test]
    fn test_region_mean_and_row_sums() {
        let mut gray = GrayImage::new(4, 2);
        gray.fill_rect(2, 0, 4, 2, 100);
        assert_eq!(gray.region_mean(2, 4, 0, 2), 100.0);
        assert_eq!(gray.region_mean(0, 4, 0, 2), 50.0);
        assert_eq!(gray.row_sums(), vec![200.0, 200.0]);
        assert_eq!(gray.region_mean(3, 3, 0, 2), 0.0);
    }
}
