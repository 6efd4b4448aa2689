// src/handlers.rs
use crate::analyzer::{analyze_chart_with, AnalysisOptions};
use crate::config::AppConfig;
use crate::errors::AnalyzerError;
use crate::imaging::decode_chart_image;
use crate::risk::{assess_risk_reward, RiskReward};
use crate::suggestion::{
    get_trading_suggestion, DispatchOutcome, SuggestionProvider, SuggestionSettings, SuggestionSource,
};
use crate::types::{AnalysisResult, IndicatorSet, Pattern, Timeframe, TradingSuggestion};
use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared per-server state. The settings flag is the only mutable part.
pub struct AppState {
    pub config: AppConfig,
    pub settings: Mutex<SuggestionSettings>,
    pub provider: Option<Box<dyn SuggestionProvider>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, AnalyzerError> {
        let settings = config.suggestion_settings();
        let provider = config
            .openai_client()?
            .map(|c| Box::new(c) as Box<dyn SuggestionProvider>);
        Ok(Self::with_provider(config, settings, provider))
    }

    pub fn with_provider(
        config: AppConfig,
        settings: SuggestionSettings,
        provider: Option<Box<dyn SuggestionProvider>>,
    ) -> Self {
        Self {
            config,
            settings: Mutex::new(settings),
            provider,
        }
    }

    /// Dispatch a suggestion and apply any follow-up signal to the settings.
    async fn suggest(&self, analysis: &AnalysisResult, timeframe: &Timeframe, rule_based: bool) -> DispatchOutcome {
        let available = !rule_based && self.settings.lock().is_available();
        let provider = if available { self.provider.as_deref() } else { None };
        let outcome = get_trading_suggestion(provider, analysis, timeframe).await;
        self.settings.lock().apply(outcome.signal);
        outcome
    }
}

#[derive(Deserialize)]
pub struct AnalyzeQuery {
    pub timeframe: Option<String>,
    pub seed: Option<u64>,
    pub rule_based: Option<bool>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub id: Uuid,
    pub timeframe: Timeframe,
    pub analyzed_at: DateTime<Utc>,
    pub patterns: Vec<Pattern>,
    pub indicators: IndicatorSet,
    pub trading_suggestion: TradingSuggestion,
    pub suggestion_source: SuggestionSource,
    pub risk_reward: RiskReward,
}

#[derive(Deserialize)]
pub struct SuggestRequest {
    pub analysis: AnalysisResult,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub rule_based: bool,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub trading_suggestion: TradingSuggestion,
    pub suggestion_source: SuggestionSource,
    pub risk_reward: RiskReward,
}

/// `POST /analyze` with the raw image as the body.
pub async fn analyze_handler(
    state: web::Data<AppState>,
    query: web::Query<AnalyzeQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AnalyzerError> {
    let timeframe = query
        .timeframe
        .as_deref()
        .map(Timeframe::from)
        .unwrap_or_default();
    log::info!("📈 Analyze request: {} bytes, timeframe {}", body.len(), timeframe);

    let max_dimension = state.config.max_dimension();
    let options = AnalysisOptions {
        timeframe_weighting: state.config.timeframe_weighting,
    };
    let seed = query.seed;
    let analysis_timeframe = timeframe.clone();
    let analysis = web::block(move || {
        let image = decode_chart_image(&body, max_dimension)?;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        analyze_chart_with(&image, &analysis_timeframe, options, &mut rng)
    })
    .await
    .map_err(|e| AnalyzerError::Task(e.to_string()))??;

    let outcome = state
        .suggest(&analysis, &timeframe, query.rule_based.unwrap_or(false))
        .await;
    let risk_reward = assess_risk_reward(&outcome.suggestion);

    Ok(HttpResponse::Ok().json(AnalyzeResponse {
        id: Uuid::new_v4(),
        timeframe,
        analyzed_at: Utc::now(),
        patterns: analysis.patterns,
        indicators: analysis.indicators,
        trading_suggestion: outcome.suggestion,
        suggestion_source: outcome.source,
        risk_reward,
    }))
}

/// `POST /suggest` for an analysis computed earlier.
pub async fn suggest_handler(
    state: web::Data<AppState>,
    request: web::Json<SuggestRequest>,
) -> Result<HttpResponse, AnalyzerError> {
    let request = request.into_inner();
    if request.analysis.indicators.support_resistance.support.is_empty()
        || request.analysis.indicators.support_resistance.resistance.is_empty()
    {
        return Err(AnalyzerError::InvalidRequest(
            "analysis needs support and resistance levels".to_string(),
        ));
    }
    let outcome = state
        .suggest(&request.analysis, &request.timeframe, request.rule_based)
        .await;
    let risk_reward = assess_risk_reward(&outcome.suggestion);
    Ok(HttpResponse::Ok().json(SuggestResponse {
        trading_suggestion: outcome.suggestion,
        suggestion_source: outcome.source,
        risk_reward,
    }))
}

pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK, chart analyzer is running")
}

/// Routes and body limits, shared by the server and handler tests.
pub fn configure(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.app_data(web::PayloadConfig::new(max_upload_bytes))
        .app_data(web::JsonConfig::default().limit(max_upload_bytes))
        .route("/analyze", web::post().to(analyze_handler))
        .route("/suggest", web::post().to(suggest_handler))
        .route("/health", web::get().to(health_check));
}
