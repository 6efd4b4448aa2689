// src/patterns/head_shoulders.rs
use crate::imaging::{GrayImage, PreprocessedViews};
use crate::patterns::{largest_contours, PatternRecognizer};
use crate::types::Pattern;

const EMIT_THRESHOLD: f64 = 0.7;

pub struct HeadAndShouldersRecognizer;

impl PatternRecognizer for HeadAndShouldersRecognizer {
    fn name(&self) -> &'static str {
        "head_and_shoulders"
    }

    fn detect(&self, views: &PreprocessedViews) -> Vec<Pattern> {
        let confidence = detect_head_and_shoulders(&views.edges);
        if confidence > EMIT_THRESHOLD {
            vec![Pattern::new(
                "Head and Shoulders",
                "Reversal pattern indicating a potential trend change from bullish to bearish.",
                confidence,
            )]
        } else {
            Vec::new()
        }
    }
}

/// Score from the bounding-box heights of the three largest contours, taken
/// in area order: the middle one must be the tallest.
pub fn score_head_and_shoulders(contour_count: usize, heights: &[i64]) -> f64 {
    if contour_count < 3 || heights.len() < 3 {
        return 0.0;
    }
    let (left, head, right) = (heights[0], heights[1], heights[2]);
    if head > left && head > right {
        let shoulder = left.max(right).max(1) as f64;
        (0.6 + 0.2 * (head as f64 / shoulder)).min(0.9)
    } else {
        0.2
    }
}

pub fn detect_head_and_shoulders(edges: &GrayImage) -> f64 {
    let (total, largest) = largest_contours(edges, 5);
    let heights: Vec<i64> = largest
        .iter()
        .take(3)
        .map(|c| c.bounding_rect().height)
        .collect();
    let confidence = score_head_and_shoulders(total, &heights);
    log::debug!(
        "Head and shoulders: {} contours, heights {:?}, confidence {:.2}",
        total,
        heights,
        confidence
    );
    confidence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_contours_scores_zero() {
        assert_eq!(score_head_and_shoulders(2, &[10, 20]), 0.0);
        assert_eq!(detect_head_and_shoulders(&GrayImage::new(50, 50)), 0.0);
    }

    #[test]
    fn test_tallest_middle_scores_high() {
        // 0.6 + 0.2 * (30 / 25) = 0.84
        let score = score_head_and_shoulders(4, &[20, 30, 25]);
        assert!((score - 0.84).abs() < 1e-12);
        // Very tall head is capped.
        assert_eq!(score_head_and_shoulders(3, &[10, 100, 10]), 0.9);
    }

    #[test]
    fn test_middle_not_tallest_scores_low() {
        assert_eq!(score_head_and_shoulders(3, &[30, 20, 10]), 0.2);
        assert_eq!(score_head_and_shoulders(3, &[20, 20, 10]), 0.2);
    }

    #[test]
    fn test_detects_from_drawn_blobs() {
        let mut edges = GrayImage::new(120, 80);
        // Areas: widest first, the tall narrow one second, a small third.
        edges.fill_rect(5, 40, 51, 60, 255); // 45 x 19 polygon, height 20
        edges.fill_rect(55, 10, 65, 70, 255); // 9 x 59 polygon, height 60
        edges.fill_rect(80, 50, 100, 58, 255); // 19 x 7 polygon, height 8
        assert_eq!(detect_head_and_shoulders(&edges), 0.9);
    }
}
