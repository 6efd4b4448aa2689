// src/lib.rs
pub mod analyzer;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod imaging;
pub mod indicators;
pub mod patterns;
pub mod risk;
pub mod suggestion;
pub mod types;

pub use analyzer::{analyze_chart, analyze_chart_with, AnalysisOptions};
pub use errors::{AnalyzerError, Result};
pub use imaging::{decode_chart_image, preprocess_image, ChartImage, GrayImage, PreprocessedViews};
pub use indicators::extract_indicators;
pub use patterns::identify_patterns;
pub use suggestion::{generate_rule_based_suggestion, get_trading_suggestion};
pub use types::{AnalysisResult, IndicatorSet, Pattern, Timeframe, TradeAction, TradingSuggestion};
