use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    KommoApi(kommo::KommoError),
    SostApi(sost::SostError),
    ConfigError(String),
    JsonError(serde_json::Error),
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::KommoApi(err) => write!(f, "Kommo API error: {}", err),
            AppError::SostApi(err) => write!(f, "SOST API error: {}", err),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::JsonError(err) => write!(f, "JSON error: {}", err),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<kommo::KommoError> for AppError {
    fn from(err: kommo::KommoError) -> Self {
        AppError::KommoApi(err)
    }
}

impl From<sost::SostError> for AppError {
    fn from(err: sost::SostError) -> Self {
        AppError::SostApi(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::KommoApi(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            AppError::SostApi(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::JsonError(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = json!({
            "error": error_message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
