//! Entrega de um boleto no lead
//!
//! Sequência: PDF na SOST → sessão de upload no Kommo Drive → envio dos bytes
//! → vínculo do arquivo no campo BOLETO_N → (opcional) nota de anexo.
//!
//! Cada falha documentada tem uma compensação própria:
//! - 404 da SOST: liga `not_found_flag`
//! - resposta que não é PDF (ou PDF acima do limite): liga `error_flag` e não abre sessão
//! - qualquer outra falha de API: nada é gravado, o próximo polling tenta de novo
//!
//! O vínculo bem-sucedido desliga as duas sentinelas.

use std::sync::Arc;

use kommo::types::{FieldUpdate, FileFieldValue};
use sost::{Installment, SostError};
use thiserror::Error;

use crate::config::FieldMap;
use crate::services::billing::BillingProvider;
use crate::services::record_store::RecordStore;
use crate::utils::logging::*;
use crate::utils::string_utils::{sanitize_file_name, truncate_with_suffix};

const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Caso de negócio: a SOST não tem o boleto
    #[error("Boleto não encontrado: {0}")]
    NotFound(String),

    /// A SOST respondeu algo que não é o PDF
    #[error("Boleto inválido: {0}")]
    MalformedPayload(String),

    /// Falha de API; a escolha fica no lead para o próximo polling
    #[error("Falha transitória: {0}")]
    TransientUpstream(String),

    /// O Drive aceitou o envio mas não devolveu uuid/version_uuid
    #[error("Upload incompleto: {0}")]
    UploadIncomplete(String),
}

/// Arquivo já enviado ao Kommo Drive
///
/// Só é construído aqui, a partir do recibo do upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    file_uuid: String,
    version_uuid: String,
    file_name: String,
    file_size: u64,
}

impl UploadedFile {
    pub fn file_uuid(&self) -> &str {
        &self.file_uuid
    }

    pub fn version_uuid(&self) -> &str {
        &self.version_uuid
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    fn field_value(&self) -> FileFieldValue {
        FileFieldValue {
            file_uuid: self.file_uuid.clone(),
            version_uuid: self.version_uuid.clone(),
            file_name: self.file_name.clone(),
            file_size: self.file_size,
        }
    }
}

/// Resultado de uma entrega bem-sucedida
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub slot_field: u64,
    pub file: UploadedFile,
    pub note_id: Option<u64>,
}

/// `BOLETO_<numnota>_P<prest>.pdf`, já sanitizado
pub fn document_file_name(item: &Installment) -> String {
    sanitize_file_name(&format!("BOLETO_{}_P{}.pdf", item.document_number, item.installment))
}

#[derive(Clone)]
pub struct DocumentDelivery {
    store: Arc<dyn RecordStore>,
    billing: Arc<dyn BillingProvider>,
    fields: FieldMap,
    attach_note: bool,
}

impl DocumentDelivery {
    pub fn new(
        store: Arc<dyn RecordStore>,
        billing: Arc<dyn BillingProvider>,
        fields: FieldMap,
        attach_note: bool,
    ) -> Self {
        Self {
            store,
            billing,
            fields,
            attach_note,
        }
    }

    pub async fn deliver(
        &self,
        lead_id: u64,
        payer_id: &str,
        item: &Installment,
        slot_field: u64,
    ) -> Result<Delivered, DeliveryError> {
        let bytes = self.fetch(lead_id, payer_id, item).await?;

        let file_name = document_file_name(item);
        let file_size = bytes.len() as u64;

        let upload_url = self
            .store
            .create_upload_session(&file_name, file_size, PDF_CONTENT_TYPE)
            .await
            .map_err(|e| {
                log_kommo_api_error("create_upload_session", lead_id, &e.to_string());
                DeliveryError::TransientUpstream(e.to_string())
            })?;

        let receipt = self.store.upload_bytes(&upload_url, bytes).await.map_err(|e| {
            log_kommo_api_error("upload_bytes", lead_id, &e.to_string());
            DeliveryError::TransientUpstream(e.to_string())
        })?;

        let (file_uuid, version_uuid) = match (
            receipt.uuid.filter(|u| !u.is_empty()),
            receipt.version_uuid.filter(|u| !u.is_empty()),
        ) {
            (Some(file_uuid), Some(version_uuid)) => (file_uuid, version_uuid),
            _ => {
                log_error(&format!(
                    "❌ Upload de {} para o lead {} sem uuid/version_uuid",
                    file_name, lead_id
                ));
                return Err(DeliveryError::UploadIncomplete(file_name));
            }
        };

        let file = UploadedFile {
            file_uuid,
            version_uuid,
            file_name,
            file_size,
        };

        self.store
            .update_fields(
                lead_id,
                &[
                    FieldUpdate::file(slot_field, &file.field_value()),
                    FieldUpdate::flag(self.fields.not_found_flag, false),
                    FieldUpdate::flag(self.fields.error_flag, false),
                ],
            )
            .await
            .map_err(|e| {
                log_kommo_api_error("link_document", lead_id, &e.to_string());
                DeliveryError::TransientUpstream(e.to_string())
            })?;

        log_document_delivered(lead_id, file.file_name(), slot_field);

        let note_id = if self.attach_note {
            match self
                .store
                .create_attachment_note(lead_id, file.file_uuid(), file.version_uuid(), file.file_name())
                .await
            {
                Ok(note_id) => note_id,
                Err(e) => {
                    log_warning(&format!("⚠️ Nota de anexo não criada no lead {}: {}", lead_id, e));
                    None
                }
            }
        } else {
            None
        };

        Ok(Delivered {
            slot_field,
            file,
            note_id,
        })
    }

    /// Baixa o PDF e aplica as sentinelas de não encontrado / inválido
    async fn fetch(&self, lead_id: u64, payer_id: &str, item: &Installment) -> Result<Vec<u8>, DeliveryError> {
        let reference = format!("nota {} parcela {}", item.document_number, item.installment);

        match self
            .billing
            .fetch_document(&item.document_number, payer_id, &item.installment)
            .await
        {
            Ok(bytes) if sost::is_error_document(&bytes) => {
                let preview = String::from_utf8_lossy(&bytes);
                log_warning(&format!(
                    "⚠️ Boleto {} inválido para o lead {}: {}",
                    reference,
                    lead_id,
                    truncate_with_suffix(&preview, 200, "...")
                ));
                self.raise_flag(lead_id, self.fields.error_flag).await?;
                Err(DeliveryError::MalformedPayload(reference))
            }
            Ok(bytes) => Ok(bytes),
            Err(SostError::NotFound(_)) => {
                log_warning(&format!("⚠️ Boleto {} não encontrado para o lead {}", reference, lead_id));
                self.raise_flag(lead_id, self.fields.not_found_flag).await?;
                Err(DeliveryError::NotFound(reference))
            }
            Err(SostError::MalformedPayload(body)) => {
                log_warning(&format!(
                    "⚠️ SOST recusou o boleto {} do lead {}: {}",
                    reference,
                    lead_id,
                    truncate_with_suffix(&body, 200, "...")
                ));
                self.raise_flag(lead_id, self.fields.error_flag).await?;
                Err(DeliveryError::MalformedPayload(reference))
            }
            // Repetir não adianta: o mesmo PDF volta com o mesmo tamanho
            Err(SostError::PayloadTooLarge { size, limit }) => {
                log_warning(&format!(
                    "⚠️ Boleto {} do lead {} acima do limite ({} de {} bytes)",
                    reference, lead_id, size, limit
                ));
                self.raise_flag(lead_id, self.fields.error_flag).await?;
                Err(DeliveryError::MalformedPayload(reference))
            }
            Err(e) => {
                log_sost_api_error("fetch_document", &e.to_string());
                Err(DeliveryError::TransientUpstream(e.to_string()))
            }
        }
    }

    async fn raise_flag(&self, lead_id: u64, field_id: u64) -> Result<(), DeliveryError> {
        self.store
            .update_fields(lead_id, &[FieldUpdate::flag(field_id, true)])
            .await
            .map_err(|e| {
                log_kommo_api_error("raise_flag", lead_id, &e.to_string());
                DeliveryError::TransientUpstream(e.to_string())
            })
    }
}
