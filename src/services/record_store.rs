//! Acesso ao lead na Kommo atrás de um trait
//!
//! O polling e a entrega só conhecem `RecordStore`; em produção a
//! implementação é o próprio `KommoClient`.

use async_trait::async_trait;
use kommo::types::{FieldUpdate, Lead, UploadReceipt};
use kommo::KommoClient;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Lê o lead com `custom_fields_values`
    async fn get_lead(&self, lead_id: u64) -> kommo::Result<Lead>;

    /// PATCH parcial dos campos; lista vazia não faz chamada
    async fn update_fields(&self, lead_id: u64, fields: &[FieldUpdate]) -> kommo::Result<()>;

    /// Abre a sessão de upload e devolve a URL de envio
    async fn create_upload_session(
        &self,
        file_name: &str,
        file_size: u64,
        content_type: &str,
    ) -> kommo::Result<String>;

    async fn upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> kommo::Result<UploadReceipt>;

    async fn create_attachment_note(
        &self,
        lead_id: u64,
        file_uuid: &str,
        version_uuid: &str,
        file_name: &str,
    ) -> kommo::Result<Option<u64>>;
}

#[async_trait]
impl RecordStore for KommoClient {
    async fn get_lead(&self, lead_id: u64) -> kommo::Result<Lead> {
        KommoClient::get_lead(self, lead_id).await
    }

    async fn update_fields(&self, lead_id: u64, fields: &[FieldUpdate]) -> kommo::Result<()> {
        self.update_lead_fields(lead_id, fields).await
    }

    async fn create_upload_session(
        &self,
        file_name: &str,
        file_size: u64,
        content_type: &str,
    ) -> kommo::Result<String> {
        KommoClient::create_upload_session(self, file_name, file_size, content_type).await
    }

    async fn upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> kommo::Result<UploadReceipt> {
        KommoClient::upload_bytes(self, upload_url, bytes).await
    }

    async fn create_attachment_note(
        &self,
        lead_id: u64,
        file_uuid: &str,
        version_uuid: &str,
        file_name: &str,
    ) -> kommo::Result<Option<u64>> {
        KommoClient::create_attachment_note(self, lead_id, file_uuid, version_uuid, file_name).await
    }
}
