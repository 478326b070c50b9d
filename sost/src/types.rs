use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Tipo de consulta de parcelas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentKind {
    /// A vencer
    Upcoming,
    /// Vencidas
    Overdue,
    /// Todas
    All,
}

impl InstallmentKind {
    /// Segmento de rota usado pela SOST
    pub fn as_path(&self) -> &'static str {
        match self {
            InstallmentKind::Upcoming => "a_vencer",
            InstallmentKind::Overdue => "vencidos",
            InstallmentKind::All => "todos",
        }
    }

    /// Opção do menu do bot: "1" a vencer, "2" vencidos, "3" todos
    pub fn from_menu_option(option: &str) -> Option<Self> {
        match option.trim() {
            "1" => Some(InstallmentKind::Upcoming),
            "2" => Some(InstallmentKind::Overdue),
            "3" => Some(InstallmentKind::All),
            _ => None,
        }
    }
}

/// Uma parcela (boleto) devolvida por `/parcelas`
///
/// Os nomes serializados são os da própria SOST, então a lista cacheada no
/// lead mantém o mesmo formato da resposta original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    #[serde(rename = "numnota", deserialize_with = "string_or_number")]
    pub document_number: String,

    #[serde(rename = "prest", deserialize_with = "string_or_number")]
    pub installment: String,

    #[serde(
        rename = "datavencimento",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<String>,

    #[serde(
        rename = "valor",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<String>,
}

/// Envelope de `/parcelas` (`dados` nas versões atuais, `parcelas` nas antigas)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InstallmentsEnvelope {
    #[serde(default, alias = "parcelas")]
    pub dados: Option<Vec<Installment>>,
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_to_string(value)
        .ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value).filter(|s| !s.is_empty()))
}
