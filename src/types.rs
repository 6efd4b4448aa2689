// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Detection output ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pattern {
    pub name: String,
    pub description: String,
    pub confidence: f64,
}

impl Pattern {
    pub fn new(name: impl Into<String>, description: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            confidence,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendBias {
    Bullish,
    Bearish,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorZone {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MovingAverage {
    pub value: f64,
    pub trend: TrendBias,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MovingAverages {
    pub sma_20: MovingAverage,
    pub sma_50: MovingAverage,
    pub sma_200: MovingAverage,
    pub ema_12: MovingAverage,
    pub ema_26: MovingAverage,
}

impl MovingAverages {
    /// Named series in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &MovingAverage)> {
        [
            ("sma_20", &self.sma_20),
            ("sma_50", &self.sma_50),
            ("sma_200", &self.sma_200),
            ("ema_12", &self.ema_12),
            ("ema_26", &self.ema_26),
        ]
        .into_iter()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Rsi {
    pub value: f64,
    pub trend: OscillatorZone,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
    pub trend: TrendBias,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
    pub trend: OscillatorZone,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Oscillators {
    pub rsi: Rsi,
    pub macd: Macd,
    pub stochastic: Stochastic,
}

/// Two support levels (ascending) and two resistance levels (descending).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SupportResistance {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub moving_averages: MovingAverages,
    pub oscillators: Oscillators,
    pub support_resistance: SupportResistance,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub patterns: Vec<Pattern>,
    pub indicators: IndicatorSet,
}

// --- Suggestion output ---
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    #[serde(rename = "STRONG LONG")]
    StrongLong,
    #[serde(rename = "LONG")]
    Long,
    #[serde(rename = "WEAK LONG")]
    WeakLong,
    #[serde(rename = "NEUTRAL")]
    Neutral,
    #[serde(rename = "WEAK SHORT")]
    WeakShort,
    #[serde(rename = "SHORT")]
    Short,
    #[serde(rename = "STRONG SHORT")]
    StrongShort,
}

impl TradeAction {
    pub const ALL: [TradeAction; 7] = [
        TradeAction::StrongLong,
        TradeAction::Long,
        TradeAction::WeakLong,
        TradeAction::Neutral,
        TradeAction::WeakShort,
        TradeAction::Short,
        TradeAction::StrongShort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::StrongLong => "STRONG LONG",
            TradeAction::Long => "LONG",
            TradeAction::WeakLong => "WEAK LONG",
            TradeAction::Neutral => "NEUTRAL",
            TradeAction::WeakShort => "WEAK SHORT",
            TradeAction::Short => "SHORT",
            TradeAction::StrongShort => "STRONG SHORT",
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(
            self,
            TradeAction::StrongLong | TradeAction::Long | TradeAction::WeakLong
        )
    }

    pub fn is_short(&self) -> bool {
        matches!(
            self,
            TradeAction::StrongShort | TradeAction::Short | TradeAction::WeakShort
        )
    }

    /// Lenient match used for model output: case-insensitive, `_` and `-`
    /// read as spaces.
    pub fn parse_loose(raw: &str) -> Option<TradeAction> {
        let normalized = raw
            .trim()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == normalized)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TradingSuggestion {
    pub action: TradeAction,
    pub rationale: String,
    pub entry_point: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub strength: u8,
}

// --- Timeframe ---
/// Chart timeframe tag. Unknown tokens are kept verbatim and never rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
    Other(String),
}

impl Timeframe {
    pub const KNOWN: [Timeframe; 8] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
    ];

    pub fn label(&self) -> &str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1D",
            Timeframe::W1 => "1W",
            Timeframe::Other(raw) => raw,
        }
    }

    /// Lower timeframes are noisier, so their confidences are scaled down.
    pub fn confidence_multiplier(&self) -> f64 {
        match self {
            Timeframe::M1 => 0.8,
            Timeframe::M5 => 0.85,
            Timeframe::M15 => 0.9,
            Timeframe::M30 => 0.95,
            Timeframe::H1 => 1.0,
            Timeframe::H4 => 1.05,
            Timeframe::D1 => 1.1,
            Timeframe::W1 => 1.15,
            Timeframe::Other(_) => 1.0,
        }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::H1
    }
}

impl FromStr for Timeframe {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "1m" => Timeframe::M1,
            "5m" => Timeframe::M5,
            "15m" => Timeframe::M15,
            "30m" => Timeframe::M30,
            "1h" => Timeframe::H1,
            "4h" => Timeframe::H4,
            "1D" => Timeframe::D1,
            "1W" => Timeframe::W1,
            other => Timeframe::Other(other.to_string()),
        })
    }
}

impl From<&str> for Timeframe {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(tf) => tf,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Timeframe {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Timeframe::from(raw.as_str()))
    }
}

/// Round to two decimal places, the precision of every reported price level.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_accepts_unknown_tokens() {
        let tf: Timeframe = "3h".into();
        assert_eq!(tf, Timeframe::Other("3h".to_string()));
        assert_eq!(tf.label(), "3h");
        assert_eq!(tf.confidence_multiplier(), 1.0);
    }

    #[test]
    fn test_timeframe_multiplier_is_monotonic() {
        let multipliers: Vec<f64> = Timeframe::KNOWN
            .iter()
            .map(|tf| tf.confidence_multiplier())
            .collect();
        assert!(multipliers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(multipliers.first(), Some(&0.8));
        assert_eq!(multipliers.last(), Some(&1.15));
    }

    #[test]
    fn test_timeframe_serde_uses_label() {
        let json = serde_json::to_string(&Timeframe::D1).unwrap();
        assert_eq!(json, "\"1D\"");
        let back: Timeframe = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(back, Timeframe::H4);
    }

    #[test]
    fn test_trade_action_serializes_with_spaces() {
        let json = serde_json::to_string(&TradeAction::StrongShort).unwrap();
        assert_eq!(json, "\"STRONG SHORT\"");
    }

    #[test]
    fn test_trade_action_loose_parse() {
        assert_eq!(TradeAction::parse_loose("strong_long"), Some(TradeAction::StrongLong));
        assert_eq!(TradeAction::parse_loose(" Weak  Short "), Some(TradeAction::WeakShort));
        assert_eq!(TradeAction::parse_loose("BUY"), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(101.23456), 101.23);
        assert_eq!(round2(1.006), 1.01);
    }
}
