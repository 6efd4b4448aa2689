// src/indicators/mod.rs
//
// Indicator values derived from image statistics. There is no price series
// behind a chart image, so brightness sampling and line detection stand in
// for it, jittered by an injected random source.
use crate::imaging::{GrayImage, PreprocessedViews};
use crate::types::IndicatorSet;
use rand::Rng;

mod moving_averages;
mod oscillators;
pub mod peaks;
mod support_resistance;

pub use moving_averages::{ma_trend, synthesize_moving_averages};
pub use oscillators::{
    rsi_from_brightness, rsi_zone, stochastic_zone, synthesize_macd, synthesize_oscillators,
    synthesize_stochastic,
};
pub use support_resistance::{
    edge_density_rows, extract_support_resistance, horizontal_levels, levels_from_rows,
    row_to_price,
};

pub const PRICE_MIN: f64 = 50.0;
pub const PRICE_MAX: f64 = 200.0;
const REFERENCE_STRIP: f64 = 0.1;

/// Mean brightness of the right-most tenth of the chart (at least one
/// column) mapped linearly onto the synthetic price range.
pub fn reference_price(gray: &GrayImage) -> f64 {
    let width = gray.width();
    let strip = ((width as f64 * REFERENCE_STRIP) as usize).max(1);
    let brightness = gray.region_mean(width.saturating_sub(strip), width, 0, gray.height());
    PRICE_MIN + brightness / 255.0 * (PRICE_MAX - PRICE_MIN)
}

pub fn extract_indicators<R: Rng + ?Sized>(views: &PreprocessedViews, rng: &mut R) -> IndicatorSet {
    let price = reference_price(&views.gray);
    log::debug!("Reference price {:.2}", price);
    let moving_averages = synthesize_moving_averages(price, rng);
    let oscillators = synthesize_oscillators(&views.gray, rng);
    let support_resistance = extract_support_resistance(&views.edges, rng);
    IndicatorSet {
        moving_averages,
        oscillators,
        support_resistance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{preprocess_image, ChartImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reference_price_maps_brightness() {
        let white = GrayImage::from_raw(50, 20, vec![255; 1000]).unwrap();
        assert_eq!(reference_price(&white), 200.0);
        assert_eq!(reference_price(&GrayImage::new(50, 20)), 50.0);

        // Only the right-most 5 columns count.
        let mut half = GrayImage::new(50, 20);
        half.fill_rect(45, 0, 50, 20, 255);
        assert_eq!(reference_price(&half), 200.0);
    }

    #[test]
    fn test_narrow_image_uses_one_column() {
        let mut gray = GrayImage::new(5, 4);
        gray.fill_rect(4, 0, 5, 4, 255);
        assert_eq!(reference_price(&gray), 200.0);
    }

    #[test]
    fn test_extract_indicators_is_fully_populated() {
        let gray = GrayImage::from_raw(120, 90, vec![200; 120 * 90]).unwrap();
        let views = preprocess_image(&ChartImage::from_gray(gray)).unwrap();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let indicators = extract_indicators(&views, &mut rng);
            assert_eq!(indicators.support_resistance.support.len(), 2);
            assert_eq!(indicators.support_resistance.resistance.len(), 2);
            assert_eq!(indicators.moving_averages.iter().count(), 5);
        }
    }
}
