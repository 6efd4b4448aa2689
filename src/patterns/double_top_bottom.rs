// src/patterns/double_top_bottom.rs
use crate::imaging::{GrayImage, PreprocessedViews};
use crate::patterns::{largest_contours, PatternRecognizer};
use crate::types::Pattern;
use serde::Serialize;

const EMIT_THRESHOLD: f64 = 0.7;
const DEFAULT_CONFIDENCE: f64 = 0.1;
const LEVEL_TOLERANCE: f64 = 0.05; // of image height
const MIN_SEPARATION: f64 = 0.15; // of image width
const TOP_BAND: f64 = 0.4;
const BOTTOM_BAND: f64 = 0.6;

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct DoubleTopBottom {
    pub double_top: f64,
    pub double_bottom: f64,
}

impl Default for DoubleTopBottom {
    fn default() -> Self {
        Self {
            double_top: DEFAULT_CONFIDENCE,
            double_bottom: DEFAULT_CONFIDENCE,
        }
    }
}

pub struct DoubleTopBottomRecognizer;

impl PatternRecognizer for DoubleTopBottomRecognizer {
    fn name(&self) -> &'static str {
        "double_top_bottom"
    }

    fn detect(&self, views: &PreprocessedViews) -> Vec<Pattern> {
        let result = detect_double_top_bottom(&views.edges);
        let mut patterns = Vec::new();
        if result.double_top > EMIT_THRESHOLD {
            patterns.push(Pattern::new(
                "Double Top",
                "Bearish reversal pattern indicating resistance and potential downward movement.",
                result.double_top,
            ));
        }
        if result.double_bottom > EMIT_THRESHOLD {
            patterns.push(Pattern::new(
                "Double Bottom",
                "Bullish reversal pattern indicating support and potential upward movement.",
                result.double_bottom,
            ));
        }
        patterns
    }
}

/// Look for adjacent (in x) centroids at the same level and well apart.
/// A later qualifying pair overwrites an earlier one.
pub fn score_double_top_bottom(centroids: &[(i64, i64)], width: usize, height: usize) -> DoubleTopBottom {
    let mut result = DoubleTopBottom::default();
    if centroids.len() < 2 {
        return result;
    }
    let mut sorted = centroids.to_vec();
    sorted.sort_by_key(|&(x, _)| x);

    let (w, h) = (width as f64, height as f64);
    let tolerance = h * LEVEL_TOLERANCE;
    for pair in sorted.windows(2) {
        let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
        let y_diff = (y1 - y2).abs() as f64;
        if y_diff >= tolerance {
            continue;
        }
        if ((x1 - x2).abs() as f64) <= w * MIN_SEPARATION {
            continue;
        }
        let confidence = 0.7 + 0.2 * (1.0 - y_diff / tolerance);
        if (y1 as f64) < h * TOP_BAND {
            result.double_top = confidence;
        }
        if (y1 as f64) > h * BOTTOM_BAND {
            result.double_bottom = confidence;
        }
    }

    result.double_top = result.double_top.min(0.9);
    result.double_bottom = result.double_bottom.min(0.9);
    result
}

pub fn detect_double_top_bottom(edges: &GrayImage) -> DoubleTopBottom {
    let (total, largest) = largest_contours(edges, 5);
    if total < 2 {
        return DoubleTopBottom::default();
    }
    let centroids: Vec<(i64, i64)> = largest.iter().filter_map(|c| c.centroid()).collect();
    let result = score_double_top_bottom(&centroids, edges.width(), edges.height());
    log::debug!(
        "Double top/bottom from centroids {:?}: top {:.2}, bottom {:.2}",
        centroids,
        result.double_top,
        result.double_bottom
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_with_too_few_centroids() {
        assert_eq!(score_double_top_bottom(&[(10, 10)], 100, 100), DoubleTopBottom::default());
        assert_eq!(detect_double_top_bottom(&GrayImage::new(40, 40)), DoubleTopBottom::default());
    }

    #[test]
    fn test_level_pair_near_top_is_double_top() {
        let result = score_double_top_bottom(&[(80, 20), (10, 20)], 200, 100);
        assert!((result.double_top - 0.9).abs() < 1e-12);
        assert_eq!(result.double_bottom, 0.1);
    }

    #[test]
    fn test_level_pair_near_bottom_is_double_bottom() {
        // y_diff 2 of tolerance 5: 0.7 + 0.2 * 0.6 = 0.82
        let result = score_double_top_bottom(&[(10, 80), (100, 82)], 200, 100);
        assert!((result.double_bottom - 0.82).abs() < 1e-12);
        assert_eq!(result.double_top, 0.1);
    }

    #[test]
    fn test_close_or_uneven_pairs_are_ignored() {
        // Too close in x.
        let result = score_double_top_bottom(&[(10, 20), (30, 20)], 200, 100);
        assert_eq!(result, DoubleTopBottom::default());
        // Different levels.
        let result = score_double_top_bottom(&[(10, 20), (150, 30)], 200, 100);
        assert_eq!(result, DoubleTopBottom::default());
        // Mid-frame level.
        let result = score_double_top_bottom(&[(10, 50), (150, 50)], 200, 100);
        assert_eq!(result, DoubleTopBottom::default());
    }

    #[test]
    fn test_detects_two_blobs_near_top() {
        let mut edges = GrayImage::new(200, 100);
        edges.fill_rect(20, 10, 41, 31, 255);
        edges.fill_rect(140, 10, 161, 31, 255);
        let result = detect_double_top_bottom(&edges);
        assert!((result.double_top - 0.9).abs() < 1e-12);
        assert_eq!(result.double_bottom, 0.1);
    }
}
