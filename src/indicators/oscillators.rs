// src/indicators/oscillators.rs
use crate::imaging::GrayImage;
use crate::types::{Macd, OscillatorZone, Oscillators, Rsi, Stochastic, TrendBias};
use rand::Rng;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;
const STOCH_OVERBOUGHT: f64 = 80.0;
const STOCH_OVERSOLD: f64 = 20.0;

pub fn rsi_zone(value: f64) -> OscillatorZone {
    if value > RSI_OVERBOUGHT {
        OscillatorZone::Overbought
    } else if value < RSI_OVERSOLD {
        OscillatorZone::Oversold
    } else {
        OscillatorZone::Neutral
    }
}

/// Both lines must agree for an extreme reading.
pub fn stochastic_zone(k: f64, d: f64) -> OscillatorZone {
    if k >= STOCH_OVERBOUGHT && d >= STOCH_OVERBOUGHT {
        OscillatorZone::Overbought
    } else if k <= STOCH_OVERSOLD && d <= STOCH_OVERSOLD {
        OscillatorZone::Oversold
    } else {
        OscillatorZone::Neutral
    }
}

/// RSI from the mean brightness of the bottom third, where an oscillator
/// panel usually sits.
pub fn rsi_from_brightness(gray: &GrayImage) -> Rsi {
    let (w, h) = (gray.width(), gray.height());
    let brightness = gray.region_mean(0, w, 2 * h / 3, h);
    let value = (brightness / 255.0 * 100.0).clamp(0.0, 100.0);
    Rsi {
        value,
        trend: rsi_zone(value),
    }
}

pub fn synthesize_macd<R: Rng + ?Sized>(rng: &mut R) -> Macd {
    let line = rng.gen_range(-2.0..2.0);
    let signal = line * (1.0 + rng.gen_range(-0.5..0.5));
    Macd {
        line,
        signal,
        histogram: line - signal,
        trend: if line > signal {
            TrendBias::Bullish
        } else {
            TrendBias::Bearish
        },
    }
}

pub fn synthesize_stochastic<R: Rng + ?Sized>(rng: &mut R) -> Stochastic {
    let k: f64 = rng.gen_range(0.0..100.0);
    let d = k * (1.0 + rng.gen_range(-0.2..0.2));
    Stochastic {
        k,
        d,
        trend: stochastic_zone(k, d),
    }
}

pub fn synthesize_oscillators<R: Rng + ?Sized>(gray: &GrayImage, rng: &mut R) -> Oscillators {
    Oscillators {
        rsi: rsi_from_brightness(gray),
        macd: synthesize_macd(rng),
        stochastic: synthesize_stochastic(rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rsi_reads_bottom_third() {
        let mut gray = GrayImage::new(30, 30);
        gray.fill_rect(0, 20, 30, 30, 255);
        let rsi = rsi_from_brightness(&gray);
        assert_eq!(rsi.value, 100.0);
        assert_eq!(rsi.trend, OscillatorZone::Overbought);

        let dark = rsi_from_brightness(&GrayImage::new(30, 30));
        assert_eq!(dark.value, 0.0);
        assert_eq!(dark.trend, OscillatorZone::Oversold);
    }

    #[test]
    fn test_zone_boundaries() {
        assert_eq!(rsi_zone(70.0), OscillatorZone::Neutral);
        assert_eq!(rsi_zone(70.1), OscillatorZone::Overbought);
        assert_eq!(rsi_zone(30.0), OscillatorZone::Neutral);
        assert_eq!(rsi_zone(29.9), OscillatorZone::Oversold);
        assert_eq!(stochastic_zone(80.0, 85.0), OscillatorZone::Overbought);
        assert_eq!(stochastic_zone(90.0, 79.0), OscillatorZone::Neutral);
        assert_eq!(stochastic_zone(20.0, 5.0), OscillatorZone::Oversold);
    }

    #[test]
    fn test_synthetic_oscillators_are_consistent() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let macd = synthesize_macd(&mut rng);
            assert!((-2.0..2.0).contains(&macd.line));
            assert!((macd.histogram - (macd.line - macd.signal)).abs() < 1e-12);
            assert_eq!(macd.trend == TrendBias::Bullish, macd.line > macd.signal);

            let stoch = synthesize_stochastic(&mut rng);
            assert!((0.0..100.0).contains(&stoch.k));
            assert!(stoch.d >= 0.0 && stoch.d <= 120.0);
            assert_eq!(stoch.trend, stochastic_zone(stoch.k, stoch.d));
        }
    }
}
