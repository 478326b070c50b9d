//! Upload de arquivos para o Kommo Drive (fluxo em duas fases)
//!
//! 1. `GET /account?with=drive_url` descobre o host do Drive (cacheado)
//! 2. `POST {drive_url}/v1.0/sessions` abre a sessão e devolve `upload_url`
//! 3. `POST {upload_url}` envia os bytes e devolve `uuid` + `version_uuid`

use serde_json::json;

use crate::client::KommoClient;
use crate::error::{KommoError, Result};
use crate::types::{Account, UploadReceipt, UploadSession};

impl KommoClient {
    /// URL do Kommo Drive da conta
    pub async fn drive_url(&self) -> Result<String> {
        let url = self
            .drive_url
            .get_or_try_init(|| async {
                let account: Account = self.get_json("/account?with=drive_url").await?;
                let drive_url = account
                    .drive_url
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| KommoError::NotFound("drive_url ausente na conta".to_string()))?;
                tracing::info!("📁 Drive URL da conta Kommo: {}", drive_url);
                Ok::<_, KommoError>(drive_url.trim_end_matches('/').to_string())
            })
            .await?;
        Ok(url.clone())
    }

    /// Abre uma sessão de upload e retorna a `upload_url`
    pub async fn create_upload_session(
        &self,
        file_name: &str,
        file_size: u64,
        content_type: &str,
    ) -> Result<String> {
        let drive_url = self.drive_url().await?;
        let body = json!({
            "file_name": file_name,
            "file_size": file_size,
            "content_type": content_type,
            "conflict_resolution": { "policy": "autorename" }
        });

        let session: UploadSession = self
            .post_json_absolute(&format!("{}/v1.0/sessions", drive_url), &body)
            .await?;

        session
            .upload_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| KommoError::NotFound("upload_url ausente na sessão de upload".to_string()))
    }

    /// Envia o arquivo inteiro em uma única parte
    ///
    /// A `upload_url` já carrega a autorização (JWT da sessão).
    pub async fn upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> Result<UploadReceipt> {
        let size = bytes.len();
        let content_range = format!("bytes 0-{}/{}", size.saturating_sub(1), size);

        tracing::debug!("POST {} ({} bytes)", upload_url, size);

        let response = self
            .http()
            .post(upload_url)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Range", content_range)
            .body(bytes)
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(UploadReceipt::default());
        }
        Ok(serde_json::from_str(&text)?)
    }
}
