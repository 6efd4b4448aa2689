// src/errors.rs
use actix_web::{HttpResponse, ResponseError};

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("External service quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Reqwest error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Analysis task failed: {0}")]
    Task(String),
}

impl AnalyzerError {
    /// True for failures of the generative suggestion call. These never reach
    /// the caller; the dispatcher falls back to the rule-based engine.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            AnalyzerError::ExternalService(_)
                | AnalyzerError::QuotaExceeded(_)
                | AnalyzerError::MissingField(_)
                | AnalyzerError::MalformedResponse(_)
                | AnalyzerError::Http(_)
                | AnalyzerError::Json(_)
        )
    }
}

impl ResponseError for AnalyzerError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AnalyzerError::InvalidImage(msg) => {
                log::warn!("Rejected image: {}", msg);
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "invalid_image",
                    "message": msg,
                }))
            }
            AnalyzerError::InvalidRequest(msg) => {
                log::warn!("Rejected request: {}", msg);
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "invalid_request",
                    "message": msg,
                }))
            }
            AnalyzerError::ImageDecode(e) => {
                log::warn!("Could not decode upload: {}", e);
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "invalid_image",
                    "message": "Upload is not a readable JPEG or PNG image",
                }))
            }
            AnalyzerError::Config(msg) => {
                log::error!("Configuration error: {}", msg);
                HttpResponse::InternalServerError().body("Server configuration error")
            }
            other => {
                log::error!("Unhandled analyzer error: {}", other);
                HttpResponse::InternalServerError().body("Error processing chart")
            }
        }
    }
}
