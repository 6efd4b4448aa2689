// src/patterns/candlestick.rs
use crate::imaging::color::{count_in_ranges, HsvRange};
use crate::imaging::{ChartImage, PreprocessedViews};
use crate::patterns::PatternRecognizer;
use crate::types::Pattern;

// Hue in 8-bit half-degrees.
const GREEN: HsvRange = HsvRange::new([40, 40, 40], [80, 255, 255]);
const RED_LOW: HsvRange = HsvRange::new([0, 50, 50], [10, 255, 255]);
const RED_HIGH: HsvRange = HsvRange::new([170, 50, 50], [180, 255, 255]);

const DOMINANT_RATIO: f64 = 0.6;
const MIN_PIXELS: usize = 100;

pub struct CandlestickRecognizer;

impl PatternRecognizer for CandlestickRecognizer {
    fn name(&self) -> &'static str {
        "candlestick_bias"
    }

    fn detect(&self, views: &PreprocessedViews) -> Vec<Pattern> {
        detect_candlestick_bias(&views.original)
    }
}

/// Green versus red pixel share in the bottom third of a color chart, where
/// the most recent candles usually sit. Gray charts yield nothing.
pub fn detect_candlestick_bias(image: &ChartImage) -> Vec<Pattern> {
    if !image.is_color() || image.is_empty() {
        return Vec::new();
    }
    let y0 = 2 * image.height() / 3;
    let green = count_in_ranges(image, y0, &[GREEN]);
    let red = count_in_ranges(image, y0, &[RED_LOW, RED_HIGH]);
    log::debug!("Candle colors in bottom third: {} green, {} red", green, red);
    candle_bias_from_counts(green, red)
}

pub fn candle_bias_from_counts(green: usize, red: usize) -> Vec<Pattern> {
    let total = green + red;
    if total == 0 {
        return Vec::new();
    }
    let green_ratio = green as f64 / total as f64;
    let red_ratio = red as f64 / total as f64;

    let mut patterns = Vec::new();
    if green_ratio > DOMINANT_RATIO && green > MIN_PIXELS {
        patterns.push(Pattern::new(
            "Bullish Candle Pattern",
            "Recent candles show strong buying pressure, suggesting bullish momentum.",
            (0.5 + green_ratio).min(0.9),
        ));
    }
    if red_ratio > DOMINANT_RATIO && red > MIN_PIXELS {
        patterns.push(Pattern::new(
            "Bearish Candle Pattern",
            "Recent candles show strong selling pressure, suggesting bearish momentum.",
            (0.5 + red_ratio).min(0.9),
        ));
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{GrayImage, PixelLayout};

    fn two_tone(width: usize, height: usize, top: [u8; 3], bottom: [u8; 3]) -> ChartImage {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            let px = if y >= 2 * height / 3 { bottom } else { top };
            for _ in 0..width {
                data.extend_from_slice(&px);
            }
        }
        ChartImage::new(width, height, PixelLayout::Rgb, data).unwrap()
    }

    #[test]
    fn test_green_bottom_third_is_bullish() {
        let image = two_tone(30, 30, [220, 20, 20], [20, 200, 40]);
        let patterns = detect_candlestick_bias(&image);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].name, "Bullish Candle Pattern");
        assert_eq!(patterns[0].confidence, 0.9);
    }

    #[test]
    fn test_red_bottom_third_is_bearish() {
        let image = two_tone(30, 30, [20, 200, 40], [210, 15, 30]);
        let patterns = detect_candlestick_bias(&image);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].name, "Bearish Candle Pattern");
    }

    #[test]
    fn test_gray_image_is_skipped() {
        let gray = ChartImage::from_gray(GrayImage::new(30, 30));
        assert!(detect_candlestick_bias(&gray).is_empty());
    }

    #[test]
    fn test_counts_need_ratio_and_volume() {
        assert!(candle_bias_from_counts(90, 0).is_empty());
        assert!(candle_bias_from_counts(150, 120).is_empty());
        let mixed = candle_bias_from_counts(70, 130);
        assert_eq!(mixed.len(), 1);
        assert_eq!(mixed[0].name, "Bearish Candle Pattern");
        assert!((mixed[0].confidence - 0.9).abs() < 1e-12);
        let mild = candle_bias_from_counts(122, 78);
        assert!((mild[0].confidence - 0.9).abs() < 1e-12);
        assert!(candle_bias_from_counts(0, 0).is_empty());
    }
}
