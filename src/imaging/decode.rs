// src/imaging/decode.rs
use super::{ChartImage, PixelLayout};
use crate::errors::{AnalyzerError, Result};
use image::imageops::FilterType;
use image::DynamicImage;

/// Decode an uploaded JPEG/PNG into a [`ChartImage`]. Images whose longer
/// side exceeds `max_dimension` are scaled down keeping the aspect ratio.
pub fn decode_chart_image(bytes: &[u8], max_dimension: Option<u32>) -> Result<ChartImage> {
    if bytes.is_empty() {
        return Err(AnalyzerError::InvalidImage("empty upload".to_string()));
    }
    let decoded = image::load_from_memory(bytes)?;
    let decoded = match max_dimension {
        Some(max) => downscale(decoded, max),
        None => decoded,
    };

    let (width, height) = (decoded.width() as usize, decoded.height() as usize);
    if decoded.color().has_color() {
        ChartImage::new(width, height, PixelLayout::Rgb, decoded.to_rgb8().into_raw())
    } else {
        ChartImage::new(width, height, PixelLayout::Gray, decoded.to_luma8().into_raw())
    }
}

fn downscale(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let longest = w.max(h);
    if max_dimension == 0 || longest <= max_dimension {
        return img;
    }
    let (nw, nh) = if h > w {
        let nw = (w as f64 * max_dimension as f64 / h as f64) as u32;
        (nw.max(1), max_dimension)
    } else {
        let nh = (h as f64 * max_dimension as f64 / w as f64) as u32;
        (max_dimension, nh.max(1))
    };
    log::debug!("Downscaling upload from {}x{} to {}x{}", w, h, nw, nh);
    img.resize_exact(nw, nh, FilterType::Triangle)
}
