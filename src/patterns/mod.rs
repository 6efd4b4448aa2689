// src/patterns/mod.rs
use crate::imaging::{find_external_contours, Contour, GrayImage, PreprocessedViews};
use crate::types::Pattern;

// Trait for shape recognizers run after trend classification
pub trait PatternRecognizer: Sync {
    fn name(&self) -> &'static str;
    fn detect(&self, views: &PreprocessedViews) -> Vec<Pattern>; // Only patterns above the emission threshold
}

// Declare submodules
mod candlestick;
mod double_top_bottom;
mod head_shoulders;
mod trend_lines;
mod triangle;

// Export detectors and recognizers
pub use candlestick::{candle_bias_from_counts, detect_candlestick_bias, CandlestickRecognizer};
pub use double_top_bottom::{
    detect_double_top_bottom, score_double_top_bottom, DoubleTopBottom, DoubleTopBottomRecognizer,
};
pub use head_shoulders::{
    detect_head_and_shoulders, score_head_and_shoulders, HeadAndShouldersRecognizer,
};
pub use trend_lines::{classify_trend_segments, detect_trend_lines, TrendLines};
pub use triangle::{detect_triangle_patterns, score_triangles, TrianglePatterns, TriangleRecognizer};

// Run order after the trend observations; output keeps this order.
pub const SHAPE_RECOGNIZERS: &[&dyn PatternRecognizer] = &[
    &HeadAndShouldersRecognizer,
    &DoubleTopBottomRecognizer,
    &TriangleRecognizer,
    &CandlestickRecognizer,
];

/// Number of external contours on the edge map and the `n` largest by area
/// (stable for equal areas).
pub(crate) fn largest_contours(edges: &GrayImage, n: usize) -> (usize, Vec<Contour>) {
    let contours = find_external_contours(edges);
    let total = contours.len();
    let mut with_area: Vec<(f64, Contour)> = contours.into_iter().map(|c| (c.area(), c)).collect();
    with_area.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    (total, with_area.into_iter().take(n).map(|(_, c)| c).collect())
}

/// Trend observations, then every shape recognizer in order. When nothing
/// clears its threshold a single weak-trend entry is synthesized from the
/// strongest trend class.
pub fn identify_patterns(views: &PreprocessedViews) -> Vec<Pattern> {
    let trend = detect_trend_lines(&views.edges);
    let mut patterns = trend.patterns();

    for recognizer in SHAPE_RECOGNIZERS {
        let found = recognizer.detect(views);
        if !found.is_empty() {
            log::debug!("{} recognizer emitted {} pattern(s)", recognizer.name(), found.len());
        }
        patterns.extend(found);
    }

    if patterns.is_empty() {
        let fallback = trend.fallback_pattern();
        log::debug!(
            "No pattern cleared its threshold, falling back to {} ({:.2})",
            fallback.name,
            fallback.confidence
        );
        patterns.push(fallback);
    }

    patterns
}
