//! Tipos de erro para o crate kommo

use thiserror::Error;

/// Erros do cliente Kommo
#[derive(Debug, Error)]
pub enum KommoError {
    /// Erro de requisição HTTP (timeout, conexão, etc)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API da Kommo (status code não-2xx)
    #[error("Kommo API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Recurso não encontrado (lead, drive_url, etc)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl KommoError {
    /// Status HTTP retornado pela API, quando houver
    pub fn status(&self) -> Option<u16> {
        match self {
            KommoError::ApiError { status, .. } => Some(*status),
            KommoError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, KommoError>;
