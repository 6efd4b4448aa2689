// src/risk.rs
use crate::types::{round2, TradingSuggestion};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRating {
    Excellent,
    Acceptable,
    Poor,
}

impl RiskRating {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 2.0 {
            RiskRating::Excellent
        } else if ratio >= 1.0 {
            RiskRating::Acceptable
        } else {
            RiskRating::Poor
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RiskRating::Excellent => {
                "Excellent risk-reward ratio. The potential reward significantly outweighs the risk."
            }
            RiskRating::Acceptable => {
                "Acceptable risk-reward ratio. The potential reward outweighs the risk."
            }
            RiskRating::Poor => {
                "Poor risk-reward ratio. Consider adjusting your entry, stop loss, or take profit levels."
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RiskReward {
    pub risk: f64,
    pub reward: f64,
    /// Reward per unit of risk; 0 when the stop sits on the entry.
    pub ratio: f64,
    pub rating: RiskRating,
    pub message: String,
}

pub fn assess_risk_reward(suggestion: &TradingSuggestion) -> RiskReward {
    let risk = (suggestion.entry_point - suggestion.stop_loss).abs();
    let reward = (suggestion.take_profit - suggestion.entry_point).abs();
    let ratio = if risk > 0.0 { reward / risk } else { 0.0 };
    let rating = RiskRating::from_ratio(ratio);
    RiskReward {
        risk: round2(risk),
        reward: round2(reward),
        ratio: round2(ratio),
        rating,
        message: rating.message().to_string(),
    }
}
