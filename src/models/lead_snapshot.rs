use kommo::types::Lead;
use serde::Serialize;
use serde_json::Value;

use crate::config::FieldMap;

/// Leitura dos campos de controle do lead em um instante
///
/// Campos texto vazios (ou não configurados) viram `None`, assim o
/// classificador só precisa distinguir presente/ausente.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadSnapshot {
    pub lead_id: u64,
    pub payer_id: Option<String>,
    pub customer_reply: Option<String>,
    pub selection: Option<String>,
    pub pending_items: Option<String>,
    pub another_document: Option<String>,
    pub finish_flag: bool,
    pub not_found_flag: bool,
    pub error_flag: bool,
    /// Nome do arquivo vinculado em cada campo BOLETO_N, na ordem dos slots
    pub slot_files: Vec<Option<String>>,
}

impl LeadSnapshot {
    pub fn from_lead(lead: &Lead, fields: &FieldMap) -> Self {
        let text = |field_id: Option<u64>| field_id.and_then(|id| lead.first_value(id)).and_then(value_as_text);
        let flag = |field_id: Option<u64>| {
            field_id
                .and_then(|id| lead.first_value(id))
                .map(value_as_flag)
                .unwrap_or(false)
        };

        Self {
            lead_id: lead.id,
            payer_id: text(Some(fields.payer_id)),
            customer_reply: text(Some(fields.customer_reply)),
            selection: text(Some(fields.selection)),
            pending_items: text(Some(fields.pending_items)),
            another_document: text(fields.another_document),
            finish_flag: flag(fields.finish_flag),
            not_found_flag: flag(Some(fields.not_found_flag)),
            error_flag: flag(Some(fields.error_flag)),
            slot_files: fields
                .document_slots
                .iter()
                .map(|id| lead.first_value(*id).and_then(linked_file_name))
                .collect(),
        }
    }

    /// Resumo curto para o log de cada tentativa
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Resp: {} | Escolha: {} | Itens: {} | CNPJ: {}",
            self.customer_reply.as_deref().unwrap_or("-"),
            self.selection.as_deref().unwrap_or("-"),
            if self.pending_items.is_some() { "sim" } else { "não" },
            if self.payer_id.is_some() { "ok" } else { "ausente" },
        );
        if self.not_found_flag {
            summary.push_str(" | ⚠️ não encontrado");
        }
        if self.error_flag {
            summary.push_str(" | ❌ erro no boleto");
        }
        summary
    }

    /// O slot `index` já tem este arquivo vinculado
    pub fn slot_holds(&self, index: usize, file_name: &str) -> bool {
        matches!(self.slot_files.get(index), Some(Some(linked)) if linked == file_name)
    }
}

/// `file_name` de um campo arquivo (`{"file_uuid": ..., "file_name": ...}`)
fn linked_file_name(value: &Value) -> Option<String> {
    value
        .get("file_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Valor de campo como texto aparado; vazio vira `None`
fn value_as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Checkbox da Kommo: boolean real, mas aceita "1"/"true" de automações antigas
fn value_as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64() == Some(1),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "sim"),
        _ => false,
    }
}
