use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::services::reconciler::DELIVERY_SLOTS;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub kommo: KommoSettings,
    pub sost: SostSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    pub fields: FieldMap,
    #[serde(default)]
    pub conversation: ConversationSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Teto do body do webhook (e do PDF em memória)
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KommoSettings {
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub access_token: String,
    /// Host do Kommo Drive; quando ausente é descoberto via /account?with=drive_url
    #[serde(default)]
    pub drive_url: Option<String>,
    /// Sobrescreve `https://{subdomain}.kommo.com/api/v4` (proxy/testes)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Cria nota de anexo no lead depois de cada entrega
    #[serde(default = "default_true")]
    pub attach_note: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SostSettings {
    #[serde(default = "default_sost_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollingSettings {
    pub max_attempts: u32,
    pub interval_seconds: u64,
    /// Espera antes da primeira leitura (a Kommo dispara o webhook antes de gravar tudo)
    pub initial_delay_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval_seconds: 10,
            initial_delay_ms: 1500,
        }
    }
}

/// IDs dos campos personalizados do lead que formam o estado da conversa
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldMap {
    /// CNPJ/CPF do cliente (somente leitura)
    pub payer_id: u64,
    /// Resposta do menu ("1".."4")
    pub customer_reply: u64,
    /// Índice do boleto escolhido
    pub selection: u64,
    /// Lista de parcelas em JSON
    pub pending_items: u64,
    pub not_found_flag: u64,
    pub error_flag: u64,
    /// Campos arquivo BOLETO_1..BOLETO_5
    pub document_slots: Vec<u64>,
    /// Texto da lista numerada exibida pelo bot
    #[serde(default)]
    pub detailed_list: Option<u64>,
    /// Resposta de "deseja outro boleto?"
    #[serde(default)]
    pub another_document: Option<u64>,
    /// Checkbox de encerramento
    #[serde(default)]
    pub finish_flag: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationSettings {
    pub positive_answers: Vec<String>,
    pub negative_answers: Vec<String>,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            positive_answers: ["1", "sim", "s", "yes"].iter().map(|s| s.to_string()).collect(),
            negative_answers: ["2", "nao", "n", "no"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sost_base_url() -> String {
    "http://vpn.sost.com.br:8000/api".to_string()
}

/// Variáveis de ambiente herdadas da versão anterior → chave de configuração
const LEGACY_FIELD_VARS: &[(&str, &str)] = &[
    ("ID_CAMPO_CNPJ", "fields.payer_id"),
    ("ID_CAMPO_RESPOSTA_CLIENTE", "fields.customer_reply"),
    ("ID_CAMPO_ESCOLHA_BOLETO", "fields.selection"),
    ("ID_CAMPO_DADOS_TEMPORARIOS", "fields.pending_items"),
    ("ID_CAMPO_BOLETO_NAO_ENCONTRADO", "fields.not_found_flag"),
    ("ID_CAMPO_ERRO_BOLETO", "fields.error_flag"),
    ("ID_CAMPO_LISTA_DETALHADA", "fields.detailed_list"),
    ("ID_CAMPO_OUTRO_BOLETO", "fields.another_document"),
    ("ID_CAMPO_FINALIZAR", "fields.finish_flag"),
];

/// Variável definida e não vazia (o .env.example traz as chaves em branco)
fn non_empty_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_field_id(var: &str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ConfigError::Message(format!("{} não é um ID de campo válido: '{}'", var, raw)))
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Variáveis de ambiente da versão Node (mantidas para não quebrar o deploy)
        if let Some(subdomain) = non_empty_var("KOMMO_SUBDOMAIN") {
            builder = builder.set_override("kommo.subdomain", subdomain)?;
        }
        if let Some(token) = non_empty_var("KOMMO_ACCESS_TOKEN") {
            builder = builder.set_override("kommo.access_token", token)?;
        }
        if let Some(api_key) = non_empty_var("X_API_KEY_BOLETO") {
            builder = builder.set_override("sost.api_key", api_key)?;
        }
        for (var, key) in LEGACY_FIELD_VARS {
            if let Some(raw) = non_empty_var(var) {
                builder = builder.set_override(*key, parse_field_id(var, &raw)?)?;
            }
        }

        let mut slots = Vec::new();
        for i in 1..=DELIVERY_SLOTS {
            let var = format!("ID_CAMPO_BOLETO_{}", i);
            if let Some(raw) = non_empty_var(&var) {
                slots.push(parse_field_id(&var, &raw)?);
            }
        }
        if !slots.is_empty() {
            builder = builder.set_override("fields.document_slots", slots)?;
        }

        // Prefixo próprio: KOMMO_SOST__POLLING__MAX_ATTEMPTS=60
        builder = builder.add_source(Environment::with_prefix("KOMMO_SOST").separator("__"));

        Self::from_config(builder.build()?)
    }

    /// Desserializa e valida uma configuração já montada
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Falha cedo: sem credenciais ou IDs de campos o serviço não deve subir
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.kommo.subdomain.trim().is_empty() && self.kommo.base_url.is_none() {
            missing.push("KOMMO_SUBDOMAIN");
        }
        if self.kommo.access_token.trim().is_empty() {
            missing.push("KOMMO_ACCESS_TOKEN");
        }
        if self.sost.api_key.trim().is_empty() {
            missing.push("X_API_KEY_BOLETO");
        }
        if !missing.is_empty() {
            return Err(ConfigError::Message(format!(
                "Variáveis de ambiente obrigatórias não definidas: {}",
                missing.join(", ")
            )));
        }

        let fields = &self.fields;
        let required = [
            ("fields.payer_id", fields.payer_id),
            ("fields.customer_reply", fields.customer_reply),
            ("fields.selection", fields.selection),
            ("fields.pending_items", fields.pending_items),
            ("fields.not_found_flag", fields.not_found_flag),
            ("fields.error_flag", fields.error_flag),
        ];
        if let Some((name, _)) = required.iter().find(|(_, id)| *id == 0) {
            return Err(ConfigError::Message(format!("ID de campo inválido: {}", name)));
        }

        if fields.document_slots.is_empty() || fields.document_slots.len() > DELIVERY_SLOTS {
            return Err(ConfigError::Message(format!(
                "fields.document_slots deve ter de 1 a {} campos (recebido {})",
                DELIVERY_SLOTS,
                fields.document_slots.len()
            )));
        }
        if fields.document_slots.contains(&0) {
            return Err(ConfigError::Message("ID de campo inválido em fields.document_slots".to_string()));
        }

        if self.polling.max_attempts == 0 {
            return Err(ConfigError::Message("polling.max_attempts deve ser maior que zero".to_string()));
        }

        Ok(())
    }
}
