// src/suggestion/mod.rs
use crate::errors::{AnalyzerError, Result};
use crate::types::{AnalysisResult, Timeframe, TradingSuggestion};
use async_trait::async_trait;
use serde::Serialize;

mod ai;
mod rule_based;

pub use ai::{build_prompt, parse_suggestion_json, OpenAiClient, DEFAULT_BASE_URL, DEFAULT_MODEL, SYSTEM_PROMPT};
pub use rule_based::{
    action_for_diff, generate_rule_based_suggestion, price_levels, rationale_for, score_signals,
    strength_for_diff, SignalScore,
};

/// External source of trading suggestions. Any error makes the dispatcher
/// fall back to the rule-based engine.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn suggest(&self, analysis: &AnalysisResult, timeframe: &Timeframe) -> Result<TradingSuggestion>;
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Generative,
    RuleBased,
}

/// Follow-up the caller should apply to its [`SuggestionSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchSignal {
    Continue,
    DisableGenerative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub suggestion: TradingSuggestion,
    pub source: SuggestionSource,
    pub signal: DispatchSignal,
}

/// Caller-owned switch for the generative path.
#[derive(Debug, Clone, Default)]
pub struct SuggestionSettings {
    api_key: Option<String>,
    disabled: bool,
}

impl SuggestionSettings {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            disabled: false,
        }
    }

    pub fn rule_based_only() -> Self {
        Self::default()
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn is_available(&self) -> bool {
        self.has_credential() && !self.disabled
    }

    pub fn apply(&mut self, signal: DispatchSignal) {
        if signal == DispatchSignal::DisableGenerative && !self.disabled {
            log::error!("Generative suggestions disabled for the rest of this process");
            self.disabled = true;
        }
    }
}

fn is_quota_error(err: &AnalyzerError) -> bool {
    matches!(err, AnalyzerError::QuotaExceeded(_)) || err.to_string().to_ascii_lowercase().contains("quota")
}

/// Ask the provider when one is given, otherwise (or on any failure) use the
/// rule-based engine. Never fails.
pub async fn get_trading_suggestion(
    provider: Option<&dyn SuggestionProvider>,
    analysis: &AnalysisResult,
    timeframe: &Timeframe,
) -> DispatchOutcome {
    let mut signal = DispatchSignal::Continue;

    if let Some(provider) = provider {
        match provider.suggest(analysis, timeframe).await {
            Ok(suggestion) => {
                log::info!("{} suggested {} ({}%)", provider.name(), suggestion.action, suggestion.strength);
                return DispatchOutcome {
                    suggestion,
                    source: SuggestionSource::Generative,
                    signal,
                };
            }
            Err(e) => {
                if e.is_external() {
                    log::warn!("{} suggestion failed, using rule-based fallback: {}", provider.name(), e);
                } else {
                    log::error!("{} provider error, using rule-based fallback: {}", provider.name(), e);
                }
                if is_quota_error(&e) {
                    signal = DispatchSignal::DisableGenerative;
                }
            }
        }
    }

    DispatchOutcome {
        suggestion: generate_rule_based_suggestion(analysis, timeframe),
        source: SuggestionSource::RuleBased,
        signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::rule_based::tests::balanced_analysis;
    use crate::types::{Pattern, TradeAction};

    enum Mock {
        Fixed(TradingSuggestion),
        Fails(fn() -> AnalyzerError),
        Payload(&'static str),
    }

    #[async_trait]
    impl SuggestionProvider for Mock {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn suggest(&self, _: &AnalysisResult, _: &Timeframe) -> Result<TradingSuggestion> {
            match self {
                Mock::Fixed(s) => Ok(s.clone()),
                Mock::Fails(make) => Err(make()),
                Mock::Payload(raw) => parse_suggestion_json(raw),
            }
        }
    }

    fn analysis() -> AnalysisResult {
        balanced_analysis(vec![Pattern::new("Uptrend", "", 0.75)])
    }

    fn fixed() -> TradingSuggestion {
        TradingSuggestion {
            action: TradeAction::Short,
            rationale: "model".to_string(),
            entry_point: 10.0,
            stop_loss: 11.0,
            take_profit: 8.0,
            strength: 60,
        }
    }

    #[tokio::test]
    async fn test_no_provider_is_rule_based() {
        let outcome = get_trading_suggestion(None, &analysis(), &Timeframe::H1).await;
        assert_eq!(outcome.source, SuggestionSource::RuleBased);
        assert_eq!(outcome.signal, DispatchSignal::Continue);
        assert_eq!(outcome.suggestion, generate_rule_based_suggestion(&analysis(), &Timeframe::H1));
    }

    #[tokio::test]
    async fn test_provider_success_is_used() {
        let mock = Mock::Fixed(fixed());
        let outcome = get_trading_suggestion(Some(&mock), &analysis(), &Timeframe::H1).await;
        assert_eq!(outcome.source, SuggestionSource::Generative);
        assert_eq!(outcome.suggestion, fixed());
    }

    #[tokio::test]
    async fn test_failures_fall_back() {
        let expected = generate_rule_based_suggestion(&analysis(), &Timeframe::M5);
        let failing = [
            Mock::Fails(|| AnalyzerError::ExternalService("timed out".to_string())),
            Mock::Fails(|| AnalyzerError::Config("bad base url".to_string())),
            Mock::Payload("{\"action\": \"LONG\""),
            Mock::Payload(r#"{"rationale": "x", "entry_point": 1, "stop_loss": 2, "take_profit": 3}"#),
        ];
        for mock in &failing {
            let outcome = get_trading_suggestion(Some(mock), &analysis(), &Timeframe::M5).await;
            assert_eq!(outcome.source, SuggestionSource::RuleBased);
            assert_eq!(outcome.signal, DispatchSignal::Continue);
            assert_eq!(outcome.suggestion, expected);
        }
    }

    #[tokio::test]
    async fn test_quota_disables_generative_path() {
        let mock = Mock::Fails(|| AnalyzerError::QuotaExceeded("insufficient_quota".to_string()));
        let mut settings = SuggestionSettings::new(Some("sk-test".to_string()));
        assert!(settings.is_available());

        let outcome = get_trading_suggestion(Some(&mock), &analysis(), &Timeframe::H1).await;
        assert_eq!(outcome.source, SuggestionSource::RuleBased);
        assert_eq!(outcome.signal, DispatchSignal::DisableGenerative);

        settings.apply(outcome.signal);
        assert!(!settings.is_available());
        assert!(settings.has_credential());
    }

    #[test]
    fn test_blank_key_is_no_credential() {
        assert!(!SuggestionSettings::new(Some("  ".to_string())).is_available());
        assert!(!SuggestionSettings::rule_based_only().is_available());
    }
}
