// src/config.rs
use crate::errors::{AnalyzerError, Result};
use crate::suggestion::{OpenAiClient, SuggestionSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:4200";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 800;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub ai_timeout: Duration,
    /// Uploads are scaled down so their longer side fits; 0 disables.
    pub max_image_dimension: u32,
    pub max_upload_bytes: usize,
    pub timeframe_weighting: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            ai_timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            timeframe_weighting: false,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AnalyzerError::Config(format!("{} has invalid value {:?}", key, value))),
    }
}

fn parse_flag(key: &str, raw: Option<String>) -> Result<bool> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(AnalyzerError::Config(format!("{} must be a boolean, got {:?}", key, v))),
        },
    }
}

impl AppConfig {
    /// Read settings from the process environment after loading `.env`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_secs = parse_var("AI_TIMEOUT_SECS", lookup("AI_TIMEOUT_SECS"), DEFAULT_AI_TIMEOUT_SECS)?;
        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", lookup("PORT"), defaults.port)?,
            cors_origin: lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            openai_model: lookup("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            ai_timeout: Duration::from_secs(timeout_secs),
            max_image_dimension: parse_var(
                "MAX_IMAGE_DIMENSION",
                lookup("MAX_IMAGE_DIMENSION"),
                defaults.max_image_dimension,
            )?,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", lookup("MAX_UPLOAD_BYTES"), defaults.max_upload_bytes)?,
            timeframe_weighting: parse_flag("TIMEFRAME_WEIGHTING", lookup("TIMEFRAME_WEIGHTING"))?,
        })
    }

    pub fn max_dimension(&self) -> Option<u32> {
        (self.max_image_dimension > 0).then_some(self.max_image_dimension)
    }

    pub fn suggestion_settings(&self) -> SuggestionSettings {
        SuggestionSettings::new(self.openai_api_key.clone())
    }

    /// Generative client when a key is configured.
    pub fn openai_client(&self) -> Result<Option<OpenAiClient>> {
        self.openai_api_key
            .as_ref()
            .map(|key| {
                OpenAiClient::new(key.clone(), self.openai_model.clone(), self.openai_base_url.clone(), self.ai_timeout)
            })
            .transpose()
    }
}

/// Initialise log4rs from `log4rs.yaml`, or env_logger when the file is
/// missing or invalid.
pub fn setup_logging(config_path: &str) {
    match log4rs::init_file(config_path, Default::default()) {
        Ok(()) => log::info!("Logging configured from {}", config_path),
        Err(e) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("chart_analyzer=debug,info"))
                .init();
            log::warn!("Could not load {} ({}), using env_logger", config_path, e);
        }
    }
}
