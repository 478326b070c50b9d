use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::custom_field::CustomFieldValues;

/// Lead da Kommo (apenas os campos que a integração lê)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub status_id: Option<u64>,

    /// A Kommo devolve `null` quando o lead não tem nenhum campo preenchido
    #[serde(default)]
    pub custom_fields_values: Option<Vec<CustomFieldValues>>,
}

impl Lead {
    /// Primeiro valor do campo, se existir
    pub fn first_value(&self, field_id: u64) -> Option<&JsonValue> {
        self.custom_fields_values
            .as_deref()?
            .iter()
            .find(|f| f.field_id == field_id)?
            .values
            .first()
            .map(|v| &v.value)
    }
}
