// src/indicators/moving_averages.rs
use crate::types::{MovingAverage, MovingAverages, TrendBias};
use rand::Rng;

// Maximum relative deviation of each series from the reference price.
const SMA_20_SPREAD: f64 = 0.05;
const SMA_50_SPREAD: f64 = 0.08;
const SMA_200_SPREAD: f64 = 0.15;
const EMA_12_SPREAD: f64 = 0.03;
const EMA_26_SPREAD: f64 = 0.06;

/// An average sitting below the reference price reads as bullish.
pub fn ma_trend(value: f64, reference_price: f64) -> TrendBias {
    if value < reference_price {
        TrendBias::Bullish
    } else {
        TrendBias::Bearish
    }
}

fn jittered<R: Rng + ?Sized>(reference_price: f64, spread: f64, rng: &mut R) -> MovingAverage {
    let value = reference_price * (1.0 + rng.gen_range(-spread..spread));
    MovingAverage {
        value,
        trend: ma_trend(value, reference_price),
    }
}

pub fn synthesize_moving_averages<R: Rng + ?Sized>(reference_price: f64, rng: &mut R) -> MovingAverages {
    MovingAverages {
        sma_20: jittered(reference_price, SMA_20_SPREAD, rng),
        sma_50: jittered(reference_price, SMA_50_SPREAD, rng),
        sma_200: jittered(reference_price, SMA_200_SPREAD, rng),
        ema_12: jittered(reference_price, EMA_12_SPREAD, rng),
        ema_26: jittered(reference_price, EMA_26_SPREAD, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_values_stay_within_spread() {
        let spreads = [SMA_20_SPREAD, SMA_50_SPREAD, SMA_200_SPREAD, EMA_12_SPREAD, EMA_26_SPREAD];
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mas = synthesize_moving_averages(120.0, &mut rng);
            for ((name, ma), spread) in mas.iter().zip(spreads) {
                let deviation = (ma.value / 120.0 - 1.0).abs();
                assert!(deviation <= spread + 1e-12, "{} deviates {}", name, deviation);
                assert_eq!(ma.trend, ma_trend(ma.value, 120.0));
            }
        }
    }

    #[test]
    fn test_trend_convention() {
        assert_eq!(ma_trend(99.0, 100.0), TrendBias::Bullish);
        assert_eq!(ma_trend(100.0, 100.0), TrendBias::Bearish);
        assert_eq!(ma_trend(101.0, 100.0), TrendBias::Bearish);
    }

    #[test]
    fn test_same_seed_same_values() {
        let a = synthesize_moving_averages(80.0, &mut StdRng::seed_from_u64(7));
        let b = synthesize_moving_averages(80.0, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }
}
