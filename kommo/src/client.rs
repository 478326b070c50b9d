//! Cliente HTTP para a API v4 da Kommo

use crate::error::{KommoError, Result};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Cliente para interagir com a API da Kommo
///
/// Clonar é barato: o `reqwest::Client` e o cache do `drive_url` são compartilhados.
#[derive(Clone)]
pub struct KommoClient {
    http_client: HttpClient,
    access_token: String,
    base_url: String,
    pub(crate) drive_url: Arc<OnceCell<String>>,
}

impl KommoClient {
    /// Cria um novo cliente para `https://{subdomain}.kommo.com/api/v4`
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(subdomain: &str, access_token: impl Into<String>) -> Result<Self> {
        if subdomain.trim().is_empty() {
            return Err(KommoError::ConfigError("KOMMO_SUBDOMAIN vazio".to_string()));
        }
        Self::with_base_url(
            format!("https://{}.kommo.com/api/v4", subdomain.trim()),
            access_token,
        )
    }

    /// Cria um cliente apontando para uma URL base arbitrária (proxy, testes)
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(KommoError::ConfigError("KOMMO_ACCESS_TOKEN vazio".to_string()));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| KommoError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            access_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            drive_url: Arc::new(OnceCell::new()),
        })
    }

    /// Fixa o `drive_url` em vez de descobri-lo via `/account?with=drive_url`
    pub fn with_drive_url(self, drive_url: impl Into<String>) -> Self {
        let drive_url = drive_url.into().trim_end_matches('/').to_string();
        Self {
            drive_url: Arc::new(OnceCell::new_with(Some(drive_url))),
            ..self
        }
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http_client
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// GET relativo à API v4, parseando JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        Ok(response.json().await?)
    }

    /// PATCH relativo à API v4
    pub(crate) async fn patch(&self, endpoint: &str, body: &Value) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("PATCH {} with body: {}", url, serde_json::to_string(body).unwrap_or_default());

        let response = self
            .http_client
            .patch(&url)
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// POST relativo à API v4, parseando JSON
    pub(crate) async fn post_json<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.post_json_absolute(&url, body).await
    }

    /// POST para uma URL absoluta (Kommo Drive) com o token Bearer
    pub(crate) async fn post_json_absolute<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T> {
        tracing::debug!("POST {} with body: {}", url, serde_json::to_string(body).unwrap_or_default());

        let response = self
            .http_client
            .post(url)
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        Ok(response.json().await?)
    }

    /// Processa a resposta HTTP e trata erros
    pub(crate) async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("Kommo API error ({}): {}", status_code, error_body);

        // A Kommo responde erros no formato problem+json (title/detail)
        let message = match serde_json::from_str::<Value>(&error_body) {
            Ok(json) => json
                .get("detail")
                .or_else(|| json.get("title"))
                .or_else(|| json.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or(&error_body)
                .to_string(),
            Err(_) => error_body,
        };

        Err(KommoError::ApiError {
            status: status_code,
            message,
        })
    }

    /// URL base da API v4
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
