// src/analyzer.rs
use crate::errors::Result;
use crate::imaging::{preprocess_image, ChartImage};
use crate::indicators::extract_indicators;
use crate::patterns::identify_patterns;
use crate::types::{AnalysisResult, Pattern, Timeframe};
use rand::Rng;

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisOptions {
    /// Scale pattern confidences by the timeframe multiplier.
    pub timeframe_weighting: bool,
}

/// Preprocess once, then run pattern detection and indicator synthesis over
/// the shared views.
pub fn analyze_chart<R: Rng + ?Sized>(
    image: &ChartImage,
    timeframe: &Timeframe,
    rng: &mut R,
) -> Result<AnalysisResult> {
    analyze_chart_with(image, timeframe, AnalysisOptions::default(), rng)
}

pub fn analyze_chart_with<R: Rng + ?Sized>(
    image: &ChartImage,
    timeframe: &Timeframe,
    options: AnalysisOptions,
    rng: &mut R,
) -> Result<AnalysisResult> {
    let views = preprocess_image(image)?;

    let mut patterns = identify_patterns(&views);
    if options.timeframe_weighting {
        apply_timeframe_weighting(&mut patterns, timeframe);
    }
    let indicators = extract_indicators(&views, rng);

    log::info!(
        "Analyzed {}x{} chart on {}: {} pattern(s), S {:?} R {:?}",
        image.width(),
        image.height(),
        timeframe,
        patterns.len(),
        indicators.support_resistance.support,
        indicators.support_resistance.resistance
    );
    Ok(AnalysisResult {
        patterns,
        indicators,
    })
}

pub fn apply_timeframe_weighting(patterns: &mut [Pattern], timeframe: &Timeframe) {
    let multiplier = timeframe.confidence_multiplier();
    for pattern in patterns.iter_mut() {
        pattern.confidence = (pattern.confidence * multiplier).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AnalyzerError;
    use crate::imaging::{GrayImage, PixelLayout};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blank_chart() -> ChartImage {
        ChartImage::from_gray(GrayImage::from_raw(160, 100, vec![240; 160 * 100]).unwrap())
    }

    #[test]
    fn test_zero_area_is_invalid() {
        let empty = ChartImage::new(0, 10, PixelLayout::Rgb, Vec::new()).unwrap();
        let err = analyze_chart(&empty, &Timeframe::H1, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidImage(_)));
    }

    #[test]
    fn test_blank_chart_yields_neutral_market() {
        let result = analyze_chart(&blank_chart(), &Timeframe::H1, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(result.patterns.len(), 1);
        assert_eq!(result.patterns[0].name, "Neutral Market");
        assert_eq!(result.patterns[0].confidence, 0.5);
        assert_eq!(result.indicators.support_resistance.support.len(), 2);
        assert_eq!(result.indicators.support_resistance.resistance.len(), 2);
    }

    #[test]
    fn test_weighting_is_opt_in_and_clamped() {
        let options = AnalysisOptions { timeframe_weighting: true };
        let mut rng = StdRng::seed_from_u64(9);
        let weighted = analyze_chart_with(&blank_chart(), &Timeframe::M1, options, &mut rng).unwrap();
        assert!((weighted.patterns[0].confidence - 0.4).abs() < 1e-12);

        let mut patterns = vec![Pattern::new("Uptrend", "", 0.95)];
        apply_timeframe_weighting(&mut patterns, &Timeframe::W1);
        assert_eq!(patterns[0].confidence, 1.0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = analyze_chart(&blank_chart(), &"4h".into(), &mut StdRng::seed_from_u64(3)).unwrap();
        let b = analyze_chart(&blank_chart(), &"4h".into(), &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }
}
