//! Implementações em memória de `RecordStore` e `BillingProvider` para os testes

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use kommo::types::{CustomFieldValues, FieldUpdate, FieldValue, Lead, UploadReceipt};
use kommo::KommoError;
use serde_json::Value;
use sost::{Installment, InstallmentKind, SostError};

use crate::config::FieldMap;
use crate::services::billing::BillingProvider;
use crate::services::record_store::RecordStore;

pub const PAYER: u64 = 1;
pub const REPLY: u64 = 2;
pub const SELECTION: u64 = 3;
pub const PENDING: u64 = 4;
pub const NOT_FOUND: u64 = 5;
pub const ERROR: u64 = 6;
pub const DETAILED: u64 = 7;
pub const ANOTHER: u64 = 8;
pub const FINISH: u64 = 9;
pub const SLOTS: [u64; 5] = [11, 12, 13, 14, 15];

pub fn field_map() -> FieldMap {
    FieldMap {
        payer_id: PAYER,
        customer_reply: REPLY,
        selection: SELECTION,
        pending_items: PENDING,
        not_found_flag: NOT_FOUND,
        error_flag: ERROR,
        document_slots: SLOTS.to_vec(),
        detailed_list: Some(DETAILED),
        another_document: Some(ANOTHER),
        finish_flag: Some(FINISH),
    }
}

/// Parcela de teste: nota `1000 + n`, parcela `n`
pub fn item(n: u32) -> Installment {
    Installment {
        document_number: format!("{}", 1000 + n),
        installment: format!("{}", n),
        due_date: Some("2025-03-10".to_string()),
        amount: Some("150.00".to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get { lead_id: u64 },
    Update { lead_id: u64, fields: Vec<u64> },
    Session { file_name: String, file_size: u64, content_type: String },
    Upload { size: usize },
    Note { lead_id: u64, file_uuid: String },
}

#[derive(Default)]
pub struct FakeStore {
    leads: Mutex<HashMap<u64, HashMap<u64, Value>>>,
    calls: Mutex<Vec<Call>>,
    uploads: AtomicU64,
    incomplete_uploads: AtomicBool,
    fail_notes: AtomicBool,
    fail_updates: AtomicBool,
}

impl FakeStore {
    pub fn with_lead(lead_id: u64, fields: &[(u64, Value)]) -> Self {
        let store = Self::default();
        store
            .leads
            .lock()
            .unwrap()
            .insert(lead_id, fields.iter().cloned().collect());
        store
    }

    /// Simula o bot/CRM gravando um campo entre duas leituras
    pub fn set_field(&self, lead_id: u64, field_id: u64, value: Value) {
        self.leads
            .lock()
            .unwrap()
            .entry(lead_id)
            .or_default()
            .insert(field_id, value);
    }

    pub fn field(&self, lead_id: u64, field_id: u64) -> Option<Value> {
        self.leads.lock().unwrap().get(&lead_id)?.get(&field_id).cloned()
    }

    /// Campo texto preenchido (string não vazia)
    pub fn has_text(&self, lead_id: u64, field_id: u64) -> bool {
        matches!(self.field(lead_id, field_id), Some(Value::String(s)) if !s.is_empty())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, predicate: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.calls().into_iter().filter(|c| predicate(c)).collect()
    }

    pub fn set_incomplete_uploads(&self, value: bool) {
        self.incomplete_uploads.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_notes(&self, value: bool) {
        self.fail_notes.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_updates(&self, value: bool) {
        self.fail_updates.store(value, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn api_error(message: &str) -> KommoError {
    KommoError::ApiError {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn get_lead(&self, lead_id: u64) -> kommo::Result<Lead> {
        self.record(Call::Get { lead_id });

        let leads = self.leads.lock().unwrap();
        let fields = leads
            .get(&lead_id)
            .ok_or_else(|| KommoError::NotFound(format!("lead {}", lead_id)))?;

        let custom_fields_values = fields
            .iter()
            .map(|(field_id, value)| CustomFieldValues {
                field_id: *field_id,
                field_name: None,
                field_type: None,
                values: vec![FieldValue { value: value.clone() }],
            })
            .collect();

        Ok(Lead {
            id: lead_id,
            name: None,
            status_id: None,
            custom_fields_values: Some(custom_fields_values),
        })
    }

    async fn update_fields(&self, lead_id: u64, fields: &[FieldUpdate]) -> kommo::Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        self.record(Call::Update {
            lead_id,
            fields: fields.iter().map(|f| f.field_id).collect(),
        });

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(api_error("PATCH indisponível"));
        }

        let mut leads = self.leads.lock().unwrap();
        let lead = leads.entry(lead_id).or_default();
        for update in fields {
            let value = update.values.first().map(|v| v.value.clone()).unwrap_or(Value::Null);
            lead.insert(update.field_id, value);
        }
        Ok(())
    }

    async fn create_upload_session(
        &self,
        file_name: &str,
        file_size: u64,
        content_type: &str,
    ) -> kommo::Result<String> {
        self.record(Call::Session {
            file_name: file_name.to_string(),
            file_size,
            content_type: content_type.to_string(),
        });
        Ok("https://drive.test/upload/session".to_string())
    }

    async fn upload_bytes(&self, _upload_url: &str, bytes: Vec<u8>) -> kommo::Result<UploadReceipt> {
        self.record(Call::Upload { size: bytes.len() });

        if self.incomplete_uploads.load(Ordering::SeqCst) {
            return Ok(UploadReceipt::default());
        }

        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UploadReceipt {
            uuid: Some(format!("uuid-{}", n)),
            version_uuid: Some(format!("version-{}", n)),
            name: None,
            size: Some(bytes.len() as u64),
        })
    }

    async fn create_attachment_note(
        &self,
        lead_id: u64,
        file_uuid: &str,
        _version_uuid: &str,
        _file_name: &str,
    ) -> kommo::Result<Option<u64>> {
        self.record(Call::Note {
            lead_id,
            file_uuid: file_uuid.to_string(),
        });

        if self.fail_notes.load(Ordering::SeqCst) {
            return Err(api_error("notas indisponíveis"));
        }
        Ok(Some(900))
    }
}

#[derive(Debug, Clone)]
enum ListBehavior {
    Items(Vec<Installment>),
    NotFound,
    Fail,
}

#[derive(Debug, Clone)]
enum DocumentBehavior {
    Bytes(Vec<u8>),
    NotFound,
    Malformed(String),
    TooLarge(u64, u64),
    Fail(u16, String),
}

pub struct FakeBilling {
    list: Mutex<ListBehavior>,
    documents: Mutex<HashMap<String, DocumentBehavior>>,
    list_calls: Mutex<Vec<(String, InstallmentKind)>>,
    fetch_calls: Mutex<Vec<String>>,
}

impl Default for FakeBilling {
    fn default() -> Self {
        Self {
            list: Mutex::new(ListBehavior::NotFound),
            documents: Mutex::new(HashMap::new()),
            list_calls: Mutex::new(Vec::new()),
            fetch_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBilling {
    pub fn with_items(self, items: Vec<Installment>) -> Self {
        *self.list.lock().unwrap() = ListBehavior::Items(items);
        self
    }

    pub fn with_failing_list(self) -> Self {
        *self.list.lock().unwrap() = ListBehavior::Fail;
        self
    }

    pub fn with_document(self, document_number: &str, bytes: &[u8]) -> Self {
        self.set_document(document_number, bytes);
        self
    }

    pub fn set_document(&self, document_number: &str, bytes: &[u8]) {
        self.documents
            .lock()
            .unwrap()
            .insert(document_number.to_string(), DocumentBehavior::Bytes(bytes.to_vec()));
    }

    pub fn with_error(self, document_number: &str, error: SostError) -> Self {
        let behavior = match error {
            SostError::NotFound(_) => DocumentBehavior::NotFound,
            SostError::MalformedPayload(body) => DocumentBehavior::Malformed(body),
            SostError::PayloadTooLarge { size, limit } => DocumentBehavior::TooLarge(size, limit),
            SostError::ApiError { status, message } => DocumentBehavior::Fail(status, message),
            other => DocumentBehavior::Fail(500, other.to_string()),
        };
        self.documents
            .lock()
            .unwrap()
            .insert(document_number.to_string(), behavior);
        self
    }

    pub fn list_calls(&self) -> Vec<(String, InstallmentKind)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingProvider for FakeBilling {
    async fn list_installments(&self, payer_id: &str, kind: InstallmentKind) -> sost::Result<Vec<Installment>> {
        self.list_calls.lock().unwrap().push((payer_id.to_string(), kind));

        match self.list.lock().unwrap().clone() {
            ListBehavior::Items(items) if !items.is_empty() => Ok(items),
            ListBehavior::Items(_) | ListBehavior::NotFound => Err(SostError::NotFound(payer_id.to_string())),
            ListBehavior::Fail => Err(SostError::ApiError {
                status: 503,
                message: "VPN fora do ar".to_string(),
            }),
        }
    }

    async fn fetch_document(
        &self,
        document_number: &str,
        _payer_id: &str,
        _installment: &str,
    ) -> sost::Result<Vec<u8>> {
        self.fetch_calls.lock().unwrap().push(document_number.to_string());

        let behavior = self.documents.lock().unwrap().get(document_number).cloned();
        match behavior {
            Some(DocumentBehavior::Bytes(bytes)) => Ok(bytes),
            Some(DocumentBehavior::Malformed(body)) => Err(SostError::MalformedPayload(body)),
            Some(DocumentBehavior::TooLarge(size, limit)) => Err(SostError::PayloadTooLarge { size, limit }),
            Some(DocumentBehavior::Fail(status, message)) => Err(SostError::ApiError { status, message }),
            Some(DocumentBehavior::NotFound) | None => Err(SostError::NotFound(document_number.to_string())),
        }
    }
}
