use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::{AppError, AppResult};

/// Ordem de precedência dos eventos de lead no webhook da Kommo
const LEAD_EVENTS: [&str; 3] = ["add", "update", "status"];

/// Índices acima disso no form são ignorados (só o primeiro lead importa)
const MAX_FORM_INDEX: usize = 50;

/// Webhook da Kommo: `{"leads": {"status": [{"id": 123, ...}]}}`
///
/// A Kommo manda por padrão `application/x-www-form-urlencoded`
/// (`leads[status][0][id]=123`); integrações intermediárias costumam
/// repassar o mesmo conteúdo em JSON. Os dois formatos são aceitos.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct WebhookPayload {
    #[serde(default)]
    pub leads: Option<LeadEvents>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LeadEvents {
    #[serde(default)]
    pub add: Vec<LeadRef>,
    #[serde(default)]
    pub update: Vec<LeadRef>,
    #[serde(default)]
    pub status: Vec<LeadRef>,
}

/// Referência a um lead; o id pode vir como número ou string numérica
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LeadRef {
    #[serde(default)]
    pub id: Value,
}

impl LeadRef {
    pub fn lead_id(&self) -> Option<u64> {
        match &self.id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .filter(|id| *id > 0)
    }
}

impl LeadEvents {
    fn event(&self, name: &str) -> &[LeadRef] {
        match name {
            "add" => &self.add,
            "update" => &self.update,
            _ => &self.status,
        }
    }
}

impl WebhookPayload {
    /// Decodifica o body conforme o Content-Type
    ///
    /// Sem Content-Type reconhecível tenta JSON e, se falhar, form-urlencoded.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> AppResult<Self> {
        let is_form = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form {
            return Ok(Self::from_form(body));
        }

        match serde_json::from_slice::<Self>(body) {
            Ok(payload) => Ok(payload),
            Err(_) if body.contains(&b'=') => Ok(Self::from_form(body)),
            Err(e) => Err(AppError::ValidationError(format!("Invalid webhook payload: {}", e))),
        }
    }

    /// Converte a notação com colchetes da Kommo (`leads[status][0][id]=123`)
    pub fn from_form(body: &[u8]) -> Self {
        let mut events = LeadEvents::default();
        let mut found = false;

        for (key, value) in url::form_urlencoded::parse(body) {
            let Some((event, index)) = parse_form_key(&key).filter(|(_, i)| *i < MAX_FORM_INDEX) else {
                continue;
            };

            let target = match event {
                "add" => &mut events.add,
                "update" => &mut events.update,
                "status" => &mut events.status,
                _ => continue,
            };

            if target.len() <= index {
                target.resize(index + 1, LeadRef::default());
            }
            target[index].id = Value::String(value.into_owned());
            found = true;
        }

        Self {
            leads: found.then_some(events),
        }
    }

    /// ID do lead: primeiro evento (add → update → status) com id válido
    pub fn lead_id(&self) -> Option<u64> {
        let leads = self.leads.as_ref()?;
        LEAD_EVENTS
            .iter()
            .find_map(|name| leads.event(name).first().and_then(LeadRef::lead_id))
    }
}

/// `leads[<evento>][<i>][id]` → (evento, i)
fn parse_form_key(key: &str) -> Option<(&str, usize)> {
    let rest = key.strip_prefix("leads[")?;
    let (event, rest) = rest.split_once("][")?;
    let (index, rest) = rest.split_once(']')?;
    if rest != "[id]" {
        return None;
    }
    Some((event, index.parse().ok()?))
}
