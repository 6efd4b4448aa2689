// src/patterns/triangle.rs
use crate::imaging::{probabilistic_hough, GrayImage, HoughParams, LineSegment, PreprocessedViews};
use crate::patterns::PatternRecognizer;
use crate::types::Pattern;
use serde::Serialize;

const HOUGH_THRESHOLD: u32 = 50;
const MIN_LINE_LENGTH: f64 = 30.0;
const MAX_LINE_GAP: i64 = 10;
const DEFAULT_CONFIDENCE: f64 = 0.1;
const FLAT_SLOPE: f64 = 0.1;
const SYMMETRY_TOLERANCE: f64 = 0.2;
const EMIT_THRESHOLD: f64 = 0.65;

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TrianglePatterns {
    pub ascending: f64,
    pub descending: f64,
    pub symmetric: f64,
}

impl Default for TrianglePatterns {
    fn default() -> Self {
        Self {
            ascending: DEFAULT_CONFIDENCE,
            descending: DEFAULT_CONFIDENCE,
            symmetric: DEFAULT_CONFIDENCE,
        }
    }
}

pub struct TriangleRecognizer;

impl PatternRecognizer for TriangleRecognizer {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn detect(&self, views: &PreprocessedViews) -> Vec<Pattern> {
        let triangles = detect_triangle_patterns(&views.edges);
        let candidates = [
            (
                "Ascending Triangle",
                "Bullish continuation pattern with higher lows and horizontal resistance.",
                triangles.ascending,
            ),
            (
                "Descending Triangle",
                "Bearish continuation pattern with lower highs and horizontal support.",
                triangles.descending,
            ),
            (
                "Symmetric Triangle",
                "Neutral pattern indicating consolidation before a potential breakout.",
                triangles.symmetric,
            ),
        ];
        candidates
            .into_iter()
            .filter(|(_, _, confidence)| *confidence > EMIT_THRESHOLD)
            .map(|(name, description, confidence)| Pattern::new(name, description, confidence))
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Score converging-line formations from segment slopes. Image y grows
/// downward, so a positive slope is a falling line.
pub fn score_triangles(segments: &[LineSegment]) -> TrianglePatterns {
    let mut result = TrianglePatterns::default();
    if segments.len() < 2 {
        return result;
    }

    let mut up = Vec::new();
    let mut down = Vec::new();
    for slope in segments.iter().filter_map(LineSegment::slope) {
        if slope > 0.0 {
            down.push(slope);
        } else if slope < 0.0 {
            up.push(slope);
        }
    }
    if up.len() < 2 || down.len() < 2 {
        return result;
    }

    let variance_factor = 1.0 / (1.0 + population_variance(&up) + population_variance(&down));
    let score = (0.6 + 0.3 * variance_factor).min(0.9);

    let (up_avg, down_avg) = (mean(&up).abs(), mean(&down).abs());
    if (up_avg - down_avg).abs() < SYMMETRY_TOLERANCE * up_avg.max(down_avg) {
        result.symmetric = score;
    }
    if down.iter().any(|s| s.abs() < FLAT_SLOPE) && up.iter().any(|&s| s < -FLAT_SLOPE) {
        result.ascending = score;
    }
    if up.iter().any(|s| s.abs() < FLAT_SLOPE) && down.iter().any(|&s| s > FLAT_SLOPE) {
        result.descending = score;
    }
    result
}

pub fn detect_triangle_patterns(edges: &GrayImage) -> TrianglePatterns {
    let segments = probabilistic_hough(
        edges,
        &HoughParams::new(HOUGH_THRESHOLD, MIN_LINE_LENGTH, MAX_LINE_GAP),
    );
    let result = score_triangles(&segments);
    log::debug!(
        "Triangles from {} segments: ascending {:.2}, descending {:.2}, symmetric {:.2}",
        segments.len(),
        result.ascending,
        result.descending,
        result.symmetric
    );
    result
}
