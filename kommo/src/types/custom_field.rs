//! Campos personalizados (custom fields) da Kommo
//!
//! Leitura: `{"field_id": 123, "values": [{"value": ...}]}`.
//! Escrita: o mesmo formato dentro de `custom_fields_values` no PATCH do lead.
//!
//! ⚠️ IMPORTANTE: campos de texto são "limpos" gravando string vazia, não null.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Campo personalizado como devolvido em `GET /leads/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValues {
    pub field_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    #[serde(default)]
    pub values: Vec<FieldValue>,
}

/// Um valor individual de campo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub value: JsonValue,
}

/// Valor de campo do tipo arquivo (vínculo com o Kommo Drive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFieldValue {
    pub file_uuid: String,
    pub version_uuid: String,
    pub file_name: String,
    pub file_size: u64,
}

/// Entrada de `custom_fields_values` para o PATCH do lead
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldUpdate {
    pub field_id: u64,
    pub values: Vec<FieldValue>,
}

impl FieldUpdate {
    fn single(field_id: u64, value: JsonValue) -> Self {
        Self {
            field_id,
            values: vec![FieldValue { value }],
        }
    }

    /// Campo texto/textarea
    pub fn text(field_id: u64, value: impl Into<String>) -> Self {
        Self::single(field_id, JsonValue::String(value.into()))
    }

    /// Limpa um campo texto (grava string vazia)
    pub fn clear(field_id: u64) -> Self {
        Self::text(field_id, "")
    }

    /// Campo checkbox (boolean real na Kommo)
    pub fn flag(field_id: u64, value: bool) -> Self {
        Self::single(field_id, JsonValue::Bool(value))
    }

    /// Campo arquivo
    pub fn file(field_id: u64, file: &FileFieldValue) -> Self {
        Self::single(field_id, serde_json::json!(file))
    }
}
