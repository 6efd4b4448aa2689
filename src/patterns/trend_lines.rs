// src/patterns/trend_lines.rs
use crate::imaging::{probabilistic_hough, GrayImage, HoughParams, LineSegment};
use crate::types::Pattern;
use serde::Serialize;

const HOUGH_THRESHOLD: u32 = 50;
const MIN_LINE_LENGTH: f64 = 50.0;
const MAX_LINE_GAP: i64 = 10;
const MIN_X_EXTENT: i64 = 20;
const HORIZONTAL_SLOPE: f64 = 0.1;
const PLURALITY_BONUS: f64 = 0.1;
const EMIT_THRESHOLD: f64 = 0.6;

/// Confidence per trend class. Not a distribution: the plurality class gets
/// a bonus, so values need not sum to one.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TrendLines {
    pub uptrend: f64,
    pub downtrend: f64,
    pub sideways: f64,
}

impl Default for TrendLines {
    fn default() -> Self {
        Self {
            uptrend: 0.3,
            downtrend: 0.3,
            sideways: 0.5,
        }
    }
}

impl TrendLines {
    /// Observations for every class above 0.6, in up/down/sideways order.
    pub fn patterns(&self) -> Vec<Pattern> {
        let mut patterns = Vec::new();
        if self.uptrend > EMIT_THRESHOLD {
            patterns.push(Pattern::new(
                "Uptrend",
                "Price is making higher highs and higher lows, indicating bullish momentum.",
                self.uptrend,
            ));
        }
        if self.downtrend > EMIT_THRESHOLD {
            patterns.push(Pattern::new(
                "Downtrend",
                "Price is making lower highs and lower lows, indicating bearish momentum.",
                self.downtrend,
            ));
        }
        if self.sideways > EMIT_THRESHOLD {
            patterns.push(Pattern::new(
                "Sideways/Consolidation",
                "Price is moving within a range, indicating potential accumulation or distribution.",
                self.sideways,
            ));
        }
        patterns
    }

    pub fn strongest(&self) -> f64 {
        self.uptrend.max(self.downtrend).max(self.sideways)
    }

    /// Weak-trend entry carrying the strongest class; ties prefer uptrend,
    /// then downtrend.
    pub fn fallback_pattern(&self) -> Pattern {
        let strength = self.strongest();
        if self.uptrend == strength {
            Pattern::new(
                "Weak Uptrend",
                "A mild bullish trend is visible but no clear pattern has formed.",
                strength,
            )
        } else if self.downtrend == strength {
            Pattern::new(
                "Weak Downtrend",
                "A mild bearish trend is visible but no clear pattern has formed.",
                strength,
            )
        } else {
            Pattern::new(
                "Neutral Market",
                "No clear trend or pattern is visible. The market appears to be neutral.",
                strength,
            )
        }
    }
}

/// Classify segments by image-space slope. Segments narrower than 20px are
/// ignored; y grows downward so a positive slope is a downtrend.
pub fn classify_trend_segments(segments: &[LineSegment]) -> TrendLines {
    let (mut up, mut down, mut flat) = (0usize, 0usize, 0usize);
    for seg in segments {
        if seg.dx().abs() < MIN_X_EXTENT {
            continue;
        }
        let Some(slope) = seg.slope() else { continue };
        if slope.abs() < HORIZONTAL_SLOPE {
            flat += 1;
        } else if slope > 0.0 {
            down += 1;
        } else {
            up += 1;
        }
    }

    let total = up + down + flat;
    if total == 0 {
        return TrendLines::default();
    }

    let mut trend = TrendLines {
        uptrend: up as f64 / total as f64,
        downtrend: down as f64 / total as f64,
        sideways: flat as f64 / total as f64,
    };
    let strongest = trend.strongest();
    if trend.uptrend == strongest {
        trend.uptrend += PLURALITY_BONUS;
    } else if trend.downtrend == strongest {
        trend.downtrend += PLURALITY_BONUS;
    } else {
        trend.sideways += PLURALITY_BONUS;
    }

    trend.uptrend = trend.uptrend.min(1.0);
    trend.downtrend = trend.downtrend.min(1.0);
    trend.sideways = trend.sideways.min(1.0);
    trend
}

pub fn detect_trend_lines(edges: &GrayImage) -> TrendLines {
    let segments = probabilistic_hough(
        edges,
        &HoughParams::new(HOUGH_THRESHOLD, MIN_LINE_LENGTH, MAX_LINE_GAP),
    );
    let trend = classify_trend_segments(&segments);
    log::debug!(
        "Trend lines from {} segments: up {:.2}, down {:.2}, sideways {:.2}",
        segments.len(),
        trend.uptrend,
        trend.downtrend,
        trend.sideways
    );
    trend
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_lines_returns_documented_defaults() {
        let edges = GrayImage::new(100, 100);
        let trend = detect_trend_lines(&edges);
        assert_eq!(trend, TrendLines { uptrend: 0.3, downtrend: 0.3, sideways: 0.5 });
        assert!(trend.patterns().is_empty());
        assert_eq!(trend.fallback_pattern().name, "Neutral Market");
    }

    #[test]
    fn test_only_short_or_vertical_segments_use_defaults() {
        let segments = [LineSegment::new(0, 0, 10, 30), LineSegment::new(5, 0, 5, 80)];
        assert_eq!(classify_trend_segments(&segments), TrendLines::default());
    }

    #[test]
    fn test_plurality_gets_bonus() {
        let segments = [
            LineSegment::new(0, 100, 100, 0),  // up
            LineSegment::new(0, 90, 100, 10),  // up
            LineSegment::new(0, 0, 100, 100),  // down
            LineSegment::new(0, 50, 100, 52),  // flat
        ];
        let trend = classify_trend_segments(&segments);
        assert!((trend.uptrend - 0.6).abs() < 1e-12);
        assert_eq!(trend.downtrend, 0.25);
        assert_eq!(trend.sideways, 0.25);
        // 0.6 is not strictly above the emission threshold.
        assert!(trend.patterns().is_empty());
    }

    #[test]
    fn test_all_horizontal_caps_at_one() {
        let segments = [LineSegment::new(0, 50, 100, 50), LineSegment::new(10, 20, 90, 21)];
        let trend = classify_trend_segments(&segments);
        assert_eq!(trend.sideways, 1.0);
        assert_eq!(trend.uptrend, 0.0);
        let patterns = trend.patterns();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].name, "Sideways/Consolidation");
    }

    #[test]
    fn test_drawn_uptrend_is_detected() {
        let mut edges = GrayImage::new(200, 200);
        edges.draw_line(10, 190, 190, 10, 255);
        let trend = detect_trend_lines(&edges);
        assert_eq!(trend.uptrend, 1.0);
        let patterns = trend.patterns();
        assert_eq!(patterns[0].name, "Uptrend");
    }

    #[test]
    fn test_fallback_tie_prefers_uptrend() {
        let trend = TrendLines { uptrend: 0.4, downtrend: 0.4, sideways: 0.2 };
        assert_eq!(trend.fallback_pattern().name, "Weak Uptrend");
        let trend = TrendLines { uptrend: 0.1, downtrend: 0.45, sideways: 0.2 };
        let fallback = trend.fallback_pattern();
        assert_eq!(fallback.name, "Weak Downtrend");
        assert_eq!(fallback.confidence, 0.45);
    }
}
