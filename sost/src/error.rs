//! Tipos de erro para o crate sost

use thiserror::Error;

/// Erros do cliente SOST
#[derive(Debug, Error)]
pub enum SostError {
    /// Erro de requisição HTTP (timeout, VPN fora do ar, etc)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API (status code não-2xx, exceto 404)
    #[error("SOST API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Parcela/boleto inexistente para o pagador (404 ou lista vazia)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resposta não é o binário esperado (JSON de erro, falha de código de barras)
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// PDF acima do limite configurado
    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, SostError>;
