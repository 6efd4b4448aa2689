// src/suggestion/ai.rs
use crate::errors::{AnalyzerError, Result};
use crate::suggestion::SuggestionProvider;
use crate::types::{round2, AnalysisResult, Timeframe, TradeAction, TradingSuggestion};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt::Write as _;
use std::time::Duration;

pub const SYSTEM_PROMPT: &str =
    "You are an expert technical analyst who provides unbiased trading suggestions based on chart analysis.";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_TOKENS: u32 = 500;
const DEFAULT_STRENGTH: u8 = 75;
const REQUIRED_FIELDS: [&str; 5] = ["action", "rationale", "entry_point", "stop_loss", "take_profit"];

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalyzerError::Config(format!("could not build HTTP client: {}", e)))?;
        let model = model.into();
        info!("🤖 Generative suggestions enabled (model {}, timeout {:?})", model, timeout);
        Ok(Self {
            client,
            api_key: api_key.into(),
            model,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request_body(&self, analysis: &AnalysisResult, timeframe: &Timeframe) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(analysis, timeframe)}
            ],
            "response_format": {"type": "json_object"},
            "max_tokens": MAX_TOKENS
        })
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn is_quota_message(text: &str) -> bool {
    text.to_ascii_lowercase().contains("quota")
}

#[async_trait]
impl SuggestionProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn suggest(
        &self,
        analysis: &AnalysisResult,
        timeframe: &Timeframe,
    ) -> Result<TradingSuggestion> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(analysis, timeframe))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            if is_quota_message(&body) {
                return Err(AnalyzerError::QuotaExceeded(body));
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Generative endpoint rate limited the request");
            }
            return Err(AnalyzerError::ExternalService(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatCompletion = serde_json::from_str(&body)?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AnalyzerError::MalformedResponse("completion has no content".to_string()))?;
        debug!("Generative suggestion payload: {}", content);
        parse_suggestion_json(&content)
    }
}

/// User prompt listing every detected pattern and indicator reading.
pub fn build_prompt(analysis: &AnalysisResult, timeframe: &Timeframe) -> String {
    let mut patterns = String::new();
    for p in &analysis.patterns {
        let _ = writeln!(patterns, "- {} (Confidence: {:.2}): {}", p.name, p.confidence, p.description);
    }

    let indicators = &analysis.indicators;
    let mut mas = String::from("Moving Averages:\n");
    for (name, ma) in indicators.moving_averages.iter() {
        let _ = writeln!(mas, "- {}: {:.2} ({:?})", name.to_ascii_uppercase(), ma.value, ma.trend);
    }

    let osc = &indicators.oscillators;
    let mut oscillators = String::from("Oscillators:\n");
    let _ = writeln!(oscillators, "- RSI: {:.2} ({:?})", osc.rsi.value, osc.rsi.trend);
    let _ = writeln!(
        oscillators,
        "- MACD Line: {:.2}, Signal: {:.2} ({:?})",
        osc.macd.line, osc.macd.signal, osc.macd.trend
    );
    let _ = writeln!(oscillators, "- Stochastic K: {:.2} ({:?})", osc.stochastic.k, osc.stochastic.trend);

    let sr = &indicators.support_resistance;
    let levels = format!(
        "Support and Resistance:\n- Support: {:?}\n- Resistance: {:?}\n",
        sr.support, sr.resistance
    );

    let actions: Vec<String> = TradeAction::ALL.iter().map(|a| format!("\"{}\"", a)).collect();
    format!(
        "Analyze the following stock chart data and provide a trading suggestion for the {tf} timeframe:\n\n\
         Detected Patterns:\n{patterns}\n\
         Technical Indicators:\n{mas}\n{oscillators}\n{levels}\n\
         Based on this analysis, provide a trading suggestion in JSON format with the following fields:\n\
         1. action: A clear directional recommendation using one of {actions}\n\
         2. rationale: A brief explanation of the recommendation (2-3 sentences)\n\
         3. entry_point: A suggested entry price\n\
         4. stop_loss: A suggested stop loss price\n\
         5. take_profit: A suggested take profit price\n\
         6. strength: A confidence percentage (0-100) indicating the strength of the signal\n\n\
         Your suggestion should be fair, unbiased, and based solely on the technical analysis provided.",
        tf = timeframe,
        patterns = patterns,
        mas = mas,
        oscillators = oscillators,
        levels = levels,
        actions = actions.join(", "),
    )
}

fn number_field(obj: &Map<String, Value>, field: &str) -> Result<f64> {
    let value = match obj.get(field) {
        None | Some(Value::Null) => return Err(AnalyzerError::MissingField(field.to_string())),
        Some(v) => v,
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| AnalyzerError::MalformedResponse(format!("{} is not a number: {}", field, value)))
}

/// Validate the model's JSON object. Every required field must be present;
/// numbers may arrive as strings and are rounded to cents.
pub fn parse_suggestion_json(content: &str) -> Result<TradingSuggestion> {
    let value: Value = serde_json::from_str(content)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AnalyzerError::MalformedResponse("expected a JSON object".to_string()))?;

    for field in REQUIRED_FIELDS {
        if obj.get(field).map_or(true, Value::is_null) {
            return Err(AnalyzerError::MissingField(field.to_string()));
        }
    }

    let raw_action = obj.get("action").and_then(Value::as_str).unwrap_or_default();
    let action = TradeAction::parse_loose(raw_action)
        .ok_or_else(|| AnalyzerError::MalformedResponse(format!("unknown action {:?}", raw_action)))?;

    let rationale = match obj.get("rationale") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => return Err(AnalyzerError::MissingField("rationale".to_string())),
    };

    let strength = match obj.get("strength") {
        None | Some(Value::Null) => DEFAULT_STRENGTH,
        Some(_) => number_field(obj, "strength")?.round().clamp(0.0, 100.0) as u8,
    };

    Ok(TradingSuggestion {
        action,
        rationale,
        entry_point: round2(number_field(obj, "entry_point")?),
        stop_loss: round2(number_field(obj, "stop_loss")?),
        take_profit: round2(number_field(obj, "take_profit")?),
        strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::rule_based::tests::balanced_analysis;
    use crate::types::Pattern;

    #[test]
    fn test_parses_complete_payload() {
        let suggestion = parse_suggestion_json(
            r#"{"action": "LONG", "rationale": "Momentum.", "entry_point": 101.234,
                "stop_loss": "97.5", "take_profit": "$1,110.00", "strength": 82.6}"#,
        )
        .unwrap();
        assert_eq!(suggestion.action, TradeAction::Long);
        assert_eq!(suggestion.entry_point, 101.23);
        assert_eq!(suggestion.stop_loss, 97.5);
        assert_eq!(suggestion.take_profit, 1110.0);
        assert_eq!(suggestion.strength, 83);
    }

    #[test]
    fn test_strength_defaults_and_clamps() {
        let base = r#""action": "weak_short", "rationale": "x", "entry_point": 1, "stop_loss": 2, "take_profit": 0.5"#;
        let defaulted = parse_suggestion_json(&format!("{{{}}}", base)).unwrap();
        assert_eq!(defaulted.strength, 75);
        assert_eq!(defaulted.action, TradeAction::WeakShort);
        let clamped = parse_suggestion_json(&format!("{{{}, \"strength\": 250}}", base)).unwrap();
        assert_eq!(clamped.strength, 100);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = parse_suggestion_json(
            r#"{"rationale": "x", "entry_point": 1, "stop_loss": 2, "take_profit": 3}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzerError::MissingField(ref f) if f == "action"));
    }

    #[test]
    fn test_bad_payloads_are_errors() {
        assert!(matches!(
            parse_suggestion_json("not json").unwrap_err(),
            AnalyzerError::Json(_)
        ));
        assert!(matches!(
            parse_suggestion_json("[1, 2]").unwrap_err(),
            AnalyzerError::MalformedResponse(_)
        ));
        assert!(matches!(
            parse_suggestion_json(
                r#"{"action": "BUY", "rationale": "x", "entry_point": 1, "stop_loss": 2, "take_profit": 3}"#
            )
            .unwrap_err(),
            AnalyzerError::MalformedResponse(_)
        ));
        assert!(matches!(
            parse_suggestion_json(
                r#"{"action": "LONG", "rationale": "x", "entry_point": "soon", "stop_loss": 2, "take_profit": 3}"#
            )
            .unwrap_err(),
            AnalyzerError::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_prompt_lists_analysis() {
        let analysis = balanced_analysis(vec![Pattern::new("Uptrend", "Higher highs.", 0.75)]);
        let prompt = build_prompt(&analysis, &Timeframe::H4);
        assert!(prompt.contains("for the 4h timeframe"));
        assert!(prompt.contains("- Uptrend (Confidence: 0.75): Higher highs."));
        assert!(prompt.contains("- SMA_20: 100.00 (Bullish)"));
        assert!(prompt.contains("- Stochastic K: 90.00 (Overbought)"));
        assert!(prompt.contains("- Support: [80.0, 90.0]"));
        assert!(prompt.contains("\"STRONG SHORT\""));
    }

    #[test]
    fn test_quota_detection() {
        assert!(is_quota_message(r#"{"error": {"code": "insufficient_quota"}}"#));
        assert!(is_quota_message("You exceeded your current Quota"));
        assert!(!is_quota_message("Rate limit reached"));
    }
}
