//! Leitura e atualização de leads
//!
//! - `GET /leads/{id}?with=custom_fields_values`
//! - `PATCH /leads/{id}` com `{"custom_fields_values": [...]}` (merge parcial)

use serde_json::json;

use crate::client::KommoClient;
use crate::error::Result;
use crate::types::{FieldUpdate, Lead};

impl KommoClient {
    /// Busca o lead com os campos personalizados
    pub async fn get_lead(&self, lead_id: u64) -> Result<Lead> {
        self.get_json(&format!("/leads/{}?with=custom_fields_values", lead_id))
            .await
    }

    /// Atualiza um ou mais campos do lead em um único PATCH
    ///
    /// Uma lista vazia não gera chamada à API.
    pub async fn update_lead_fields(&self, lead_id: u64, fields: &[FieldUpdate]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let body = json!({ "custom_fields_values": fields });
        let response = self.patch(&format!("/leads/{}", lead_id), &body).await?;

        tracing::debug!(
            "Lead {} atualizado ({} campos) - status {}",
            lead_id,
            fields.len(),
            response.status()
        );
        Ok(())
    }
}
