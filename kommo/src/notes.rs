//! Notas de anexo no lead (`note_type = "attachment"`)

use serde_json::{json, Value};

use crate::client::KommoClient;
use crate::error::Result;

impl KommoClient {
    /// Cria uma nota de anexo apontando para um arquivo do Kommo Drive
    ///
    /// Retorna o ID da nota quando a resposta permite identificá-lo. A API
    /// às vezes responde 2xx sem o `_embedded`; nesse caso retorna `None`.
    pub async fn create_attachment_note(
        &self,
        lead_id: u64,
        file_uuid: &str,
        version_uuid: &str,
        file_name: &str,
    ) -> Result<Option<u64>> {
        let body = json!([{
            "note_type": "attachment",
            "params": {
                "file_uuid": file_uuid,
                "version_uuid": version_uuid,
                "file_name": file_name
            }
        }]);

        let response: Value = self
            .post_json(&format!("/leads/{}/notes", lead_id), &body)
            .await?;

        Ok(extract_note_id(&response))
    }
}

fn extract_note_id(response: &Value) -> Option<u64> {
    response
        .pointer("/_embedded/notes/0/id")
        .or_else(|| response.pointer("/0/id"))
        .and_then(Value::as_u64)
}
