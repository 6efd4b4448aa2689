// src/suggestion/rule_based.rs
use crate::types::{
    round2, AnalysisResult, OscillatorZone, SupportResistance, Timeframe, TradeAction,
    TradingSuggestion, TrendBias,
};

const MA_WEIGHT: f64 = 1.0;
const RSI_WEIGHT: f64 = 2.0;
const MACD_WEIGHT: f64 = 2.0;
const STOCH_WEIGHT: f64 = 1.0;
const TREND_PATTERN_WEIGHT: f64 = 2.0;
const TRIANGLE_WEIGHT: f64 = 1.0;
const STRENGTH_PER_POINT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalScore {
    pub bullish: f64,
    pub bearish: f64,
}

impl SignalScore {
    pub fn diff(&self) -> f64 {
        self.bullish - self.bearish
    }
}

/// Weighted bullish/bearish tally. Pattern names are matched by keyword so
/// "Weak Uptrend" and "Bullish Candle Pattern" count like their strong forms.
pub fn score_signals(analysis: &AnalysisResult) -> SignalScore {
    let mut score = SignalScore::default();
    let indicators = &analysis.indicators;

    for (_, ma) in indicators.moving_averages.iter() {
        match ma.trend {
            TrendBias::Bullish => score.bullish += MA_WEIGHT,
            TrendBias::Bearish => score.bearish += MA_WEIGHT,
        }
    }

    let oscillators = &indicators.oscillators;
    match oscillators.rsi.trend {
        OscillatorZone::Oversold => score.bullish += RSI_WEIGHT,
        OscillatorZone::Overbought => score.bearish += RSI_WEIGHT,
        OscillatorZone::Neutral => {}
    }
    match oscillators.macd.trend {
        TrendBias::Bullish => score.bullish += MACD_WEIGHT,
        TrendBias::Bearish => score.bearish += MACD_WEIGHT,
    }
    match oscillators.stochastic.trend {
        OscillatorZone::Oversold => score.bullish += STOCH_WEIGHT,
        OscillatorZone::Overbought => score.bearish += STOCH_WEIGHT,
        OscillatorZone::Neutral => {}
    }

    for pattern in &analysis.patterns {
        let name = pattern.name.as_str();
        let weighted = TREND_PATTERN_WEIGHT * pattern.confidence;
        if ["Uptrend", "Bullish", "Double Bottom"].iter().any(|k| name.contains(k)) {
            score.bullish += weighted;
        } else if ["Downtrend", "Bearish", "Double Top"].iter().any(|k| name.contains(k)) {
            score.bearish += weighted;
        } else if name.contains("Head and Shoulders") {
            score.bearish += weighted;
        } else if name.contains("Triangle") {
            if name.contains("Ascending") {
                score.bullish += TRIANGLE_WEIGHT * pattern.confidence;
            } else if name.contains("Descending") {
                score.bearish += TRIANGLE_WEIGHT * pattern.confidence;
            }
        }
    }

    score
}

pub fn action_for_diff(diff: f64) -> TradeAction {
    if diff > 4.0 {
        TradeAction::StrongLong
    } else if diff > 2.0 {
        TradeAction::Long
    } else if diff > 0.0 {
        TradeAction::WeakLong
    } else if diff == 0.0 {
        TradeAction::Neutral
    } else if diff > -2.0 {
        TradeAction::WeakShort
    } else if diff > -4.0 {
        TradeAction::Short
    } else {
        TradeAction::StrongShort
    }
}

pub fn rationale_for(action: TradeAction, timeframe: &Timeframe) -> String {
    let tf = timeframe.label();
    match action {
        TradeAction::StrongLong => format!(
            "Multiple bullish indicators and patterns suggest strong upward momentum on the {} timeframe. Moving averages are aligned bullishly with positive oscillator readings.",
            tf
        ),
        TradeAction::Long => format!(
            "Bullish signals outweigh bearish ones on the {} timeframe. Technical indicators suggest potential upward movement with moderate strength.",
            tf
        ),
        TradeAction::WeakLong => format!(
            "Slightly bullish signals on the {} timeframe, but caution is advised. Some indicators show positive momentum, but conviction is not strong.",
            tf
        ),
        TradeAction::Neutral => format!(
            "Mixed signals on the {} timeframe suggest a sideways market. Equal bullish and bearish pressure indicates no clear direction at this time.",
            tf
        ),
        TradeAction::WeakShort => format!(
            "Slightly bearish signals on the {} timeframe. Some indicators show negative momentum, but conviction is not strong.",
            tf
        ),
        TradeAction::Short => format!(
            "Bearish signals outweigh bullish ones on the {} timeframe. Technical indicators suggest potential downward movement with moderate strength.",
            tf
        ),
        TradeAction::StrongShort => format!(
            "Multiple bearish indicators and patterns suggest strong downward momentum on the {} timeframe. Moving averages are aligned bearishly with negative oscillator readings.",
            tf
        ),
    }
}

pub fn strength_for_diff(diff: f64) -> u8 {
    if diff == 0.0 {
        return 0;
    }
    (STRENGTH_PER_POINT * diff.abs()).round().min(100.0) as u8
}

/// Entry, stop and target, rounded to cents. Entry sits midway between the
/// lowest support and the last resistance level.
pub fn price_levels(action: TradeAction, levels: &SupportResistance) -> (f64, f64, f64) {
    let (s0, r0, r_last) = match (
        levels.support.first(),
        levels.resistance.first(),
        levels.resistance.last(),
    ) {
        (Some(&s), Some(&r), Some(&rl)) => (s, r, rl),
        _ => return (0.0, 0.0, 0.0),
    };
    let entry = (s0 + r_last) / 2.0;
    let (stop, target) = if action.is_long() {
        (s0 * 0.99, r0 * 1.01)
    } else if action.is_short() {
        (r0 * 1.01, s0 * 0.99)
    } else {
        (s0 * 0.98, r0 * 1.02)
    };
    (round2(entry), round2(stop), round2(target))
}

pub fn generate_rule_based_suggestion(
    analysis: &AnalysisResult,
    timeframe: &Timeframe,
) -> TradingSuggestion {
    let score = score_signals(analysis);
    let diff = score.diff();
    let action = action_for_diff(diff);
    let (entry_point, stop_loss, take_profit) =
        price_levels(action, &analysis.indicators.support_resistance);
    log::debug!(
        "Rule-based score: bullish {:.2}, bearish {:.2}, diff {:.2} -> {}",
        score.bullish,
        score.bearish,
        diff,
        action
    );
    TradingSuggestion {
        action,
        rationale: rationale_for(action, timeframe),
        entry_point,
        stop_loss,
        take_profit,
        strength: strength_for_diff(diff),
    }
}
