//! Cliente HTTP para a API SOST

use crate::error::{Result, SostError};
use crate::types::{Installment, InstallmentKind, InstallmentsEnvelope};
use reqwest::{Client as HttpClient, Response, StatusCode};
use std::time::Duration;

/// Limite padrão do PDF em memória (mesmo teto do body do webhook)
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct SostClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    max_document_bytes: u64,
}

impl SostClient {
    /// Cria um novo cliente SOST
    ///
    /// # Timeouts
    ///
    /// - Total: 30s (a geração do PDF é lenta)
    /// - Connect: 5s
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SostError::ConfigError("X_API_KEY_BOLETO vazio".to_string()));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SostError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        })
    }

    /// Altera o limite de tamanho do PDF
    pub fn with_max_document_bytes(mut self, limit: u64) -> Self {
        self.max_document_bytes = limit;
        self
    }

    async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("GET {}", url);

        Ok(self
            .http_client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?)
    }

    /// Lista as parcelas do pagador
    ///
    /// 404 e lista vazia são tratados igualmente como `NotFound`.
    pub async fn list_installments(
        &self,
        payer_id: &str,
        kind: InstallmentKind,
    ) -> Result<Vec<Installment>> {
        let endpoint = format!("/parcelas/{}/{}", payer_id.trim(), kind.as_path());
        let response = self.get(&endpoint).await?;
        let response = self.handle_response(response, &endpoint).await?;

        let envelope: InstallmentsEnvelope = response.json().await?;
        let items = envelope.dados.unwrap_or_default();

        if items.is_empty() {
            return Err(SostError::NotFound(format!(
                "nenhuma parcela {} para o documento {}",
                kind.as_path(),
                payer_id
            )));
        }

        tracing::info!(
            "📄 {} parcela(s) {} encontradas para o documento {}",
            items.len(),
            kind.as_path(),
            payer_id
        );
        Ok(items)
    }

    /// Baixa o PDF do boleto
    ///
    /// Respostas com `Content-Type` JSON são `MalformedPayload`; a checagem do
    /// primeiro byte fica com quem consome (ver `is_error_document`).
    pub async fn fetch_document(
        &self,
        document_number: &str,
        payer_id: &str,
        installment: &str,
    ) -> Result<Vec<u8>> {
        let endpoint = format!(
            "/boleto/{}/{}/{}",
            document_number.trim(),
            payer_id.trim(),
            installment.trim()
        );
        let response = self.get(&endpoint).await?;
        let mut response = self.handle_response(response, &endpoint).await?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);
        if is_json {
            let body = response.text().await.unwrap_or_default();
            return Err(SostError::MalformedPayload(body));
        }

        let limit = self.max_document_bytes;
        if let Some(size) = response.content_length() {
            if size > limit {
                return Err(SostError::PayloadTooLarge { size, limit });
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > limit {
                return Err(SostError::PayloadTooLarge {
                    size: bytes.len() as u64,
                    limit,
                });
            }
        }

        tracing::info!("📥 Boleto {} parcela {} recebido ({} bytes)", document_number, installment, bytes.len());
        Ok(bytes)
    }

    async fn handle_response(&self, response: Response, endpoint: &str) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::NOT_FOUND {
            tracing::warn!("⚠️ SOST 404 em {}", endpoint);
            return Err(SostError::NotFound(endpoint.to_string()));
        }

        // Falha de geração do código de barras vem como erro com corpo JSON
        if body.to_lowercase().contains("barcode") {
            tracing::warn!("⚠️ SOST falha de código de barras em {}: {}", endpoint, body);
            return Err(SostError::MalformedPayload(body));
        }

        tracing::error!("SOST API error ({}) em {}: {}", status.as_u16(), endpoint, body);
        Err(SostError::ApiError {
            status: status.as_u16(),
            message: body,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> SostClient {
        SostClient::new(server.url("/api"), "chave").unwrap()
    }

    #[tokio::test]
    async fn test_list_installments() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/parcelas/12345678000199/a_vencer")
                    .header("X-API-KEY", "chave");
                then.status(200).json_body(json!({"dados": [
                    {"numnota": 10, "prest": 1, "datavencimento": "2025-01-10", "valor": "100.00"},
                    {"numnota": 10, "prest": 2, "datavencimento": "2025-02-10", "valor": "100.00"}
                ]}));
            })
            .await;

        let items = client_for(&server)
            .list_installments("12345678000199", InstallmentKind::Upcoming)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].installment, "2");
    }

    #[tokio::test]
    async fn test_empty_list_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/parcelas/1/vencidos");
                then.status(200).json_body(json!({"dados": []}));
            })
            .await;

        let err = client_for(&server)
            .list_installments("1", InstallmentKind::Overdue)
            .await
            .unwrap_err();
        assert!(matches!(err, SostError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_404_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/boleto/10/1/1");
                then.status(404).body("not found");
            })
            .await;

        let err = client_for(&server).fetch_document("10", "1", "1").await.unwrap_err();
        assert!(matches!(err, SostError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/parcelas/1/todos");
                then.status(502).body("bad gateway");
            })
            .await;

        let err = client_for(&server)
            .list_installments("1", InstallmentKind::All)
            .await
            .unwrap_err();
        assert!(matches!(err, SostError::ApiError { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_barcode_error_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/boleto/10/1/2");
                then.status(500).json_body(json!({"detail": "Barcode generation failed"}));
            })
            .await;

        let err = client_for(&server).fetch_document("10", "1", "2").await.unwrap_err();
        assert!(matches!(err, SostError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_fetch_document_bytes_and_limit() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/boleto/10/1/1");
                then.status(200)
                    .header("Content-Type", "application/pdf")
                    .body("%PDF-1.4 conteudo");
            })
            .await;

        let bytes = client_for(&server).fetch_document("10", "1", "1").await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let err = client_for(&server)
            .with_max_document_bytes(4)
            .fetch_document("10", "1", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, SostError::PayloadTooLarge { limit: 4, .. }));
    }

    #[tokio::test]
    async fn test_json_content_type_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/boleto/10/1/3");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .body(r#"{"erro": "boleto indisponivel"}"#);
            })
            .await;

        let err = client_for(&server).fetch_document("10", "1", "3").await.unwrap_err();
        assert!(matches!(err, SostError::MalformedPayload(_)));
    }
}
