use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("Campaign expired")]
    CampaignExpired { expiry_date: DateTime<Utc> },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    AuthError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        // 错误响应统一为 { "error": <message> }，活动过期时附带过期信息
        match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                HttpResponse::build(StatusCode::BAD_REQUEST).json(json!({ "error": msg }))
            }
            AppError::PreconditionFailed(msg) => {
                log::warn!("Precondition failed: {msg}");
                HttpResponse::build(StatusCode::BAD_REQUEST).json(json!({ "error": msg }))
            }
            AppError::CampaignExpired { expiry_date } => {
                HttpResponse::build(StatusCode::BAD_REQUEST).json(json!({
                    "error": "Campaign expired",
                    "is_expired": true,
                    "expiry_date": expiry_date.to_rfc3339(),
                }))
            }
            AppError::NotFound(msg) => {
                HttpResponse::build(StatusCode::NOT_FOUND).json(json!({ "error": msg }))
            }
            AppError::Conflict(msg) => {
                log::warn!("Conflict: {msg}");
                HttpResponse::build(StatusCode::CONFLICT).json(json!({ "error": msg }))
            }
            AppError::RateLimited(msg) => {
                HttpResponse::build(StatusCode::TOO_MANY_REQUESTS).json(json!({ "error": msg }))
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                HttpResponse::build(StatusCode::UNAUTHORIZED).json(json!({ "error": msg }))
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                HttpResponse::build(StatusCode::UNAUTHORIZED)
                    .json(json!({ "error": "Invalid access token" }))
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
                    .json(json!({ "error": msg }))
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
                    .json(json!({ "error": "Database error" }))
            }
            AppError::MigrateError(err) => {
                log::error!("Migration error: {err}");
                HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
                    .json(json!({ "error": "Migration error" }))
            }
        }
    }
}
