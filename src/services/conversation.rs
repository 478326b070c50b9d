//! Execução das ações do bot de boletos sobre o lead
//!
//! Um ciclo = ler o lead, classificar com `reconcile`, executar a ação e
//! gravar o resultado. Depois de gerar a lista o lead é relido; se a escolha
//! já estiver lá, a entrega acontece no mesmo ciclo.

use std::sync::Arc;

use kommo::types::FieldUpdate;
use sost::{Installment, InstallmentKind, SostError};

use crate::config::{ConversationSettings, FieldMap};
use crate::models::LeadSnapshot;
use crate::services::billing::BillingProvider;
use crate::services::delivery::{document_file_name, Delivered, DeliveryError, DocumentDelivery};
use crate::services::reconciler::{reconcile, Action};
use crate::services::record_store::RecordStore;
use crate::utils::formatters::{format_currency_brl, format_date_br};
use crate::utils::logging::*;
use crate::utils::AppResult;

/// Linhas exibidas na lista detalhada
const LIST_PREVIEW_LIMIT: usize = 10;

/// Resultado da geração da lista
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Generated(usize),
    NotFound,
}

/// Resultado da entrega de uma escolha
#[derive(Debug, Default)]
pub struct BatchReport {
    pub delivered: Vec<Delivered>,
    pub failed: Vec<DeliveryError>,
    /// Itens que já estavam no slot (entregues em uma tentativa anterior)
    pub already_linked: usize,
    /// Escolha e lista foram limpas (nenhuma falha transitória)
    pub complete: bool,
}

/// O que aconteceu em um ciclo de polling
#[derive(Debug)]
pub struct CycleReport {
    pub snapshot: LeadSnapshot,
    pub actions: Vec<&'static str>,
    pub terminal: bool,
}

#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn RecordStore>,
    billing: Arc<dyn BillingProvider>,
    delivery: DocumentDelivery,
    fields: FieldMap,
    conversation: ConversationSettings,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        billing: Arc<dyn BillingProvider>,
        fields: FieldMap,
        conversation: ConversationSettings,
        attach_note: bool,
    ) -> Self {
        let delivery = DocumentDelivery::new(store.clone(), billing.clone(), fields.clone(), attach_note);
        Self {
            store,
            billing,
            delivery,
            fields,
            conversation,
        }
    }

    pub async fn snapshot(&self, lead_id: u64) -> AppResult<LeadSnapshot> {
        let lead = self.store.get_lead(lead_id).await.map_err(|e| {
            log_kommo_api_error("get_lead", lead_id, &e.to_string());
            e
        })?;
        Ok(LeadSnapshot::from_lead(&lead, &self.fields))
    }

    /// Um ciclo completo de leitura → ação
    pub async fn run_cycle(&self, lead_id: u64) -> AppResult<CycleReport> {
        let snapshot = self.snapshot(lead_id).await?;
        let action = reconcile(&snapshot, &self.conversation);
        let mut actions = vec![action.name()];

        let terminal = matches!(action, Action::Reset);
        let list_generated = matches!(
            self.execute(&snapshot, action).await?,
            Some(ListOutcome::Generated(_))
        );

        // Cascata: só a entrega pode seguir a geração da lista no mesmo ciclo
        if list_generated {
            let fresh = self.snapshot(lead_id).await?;
            let next = reconcile(&fresh, &self.conversation);
            if matches!(next, Action::DeliverSelection { .. }) {
                actions.push(next.name());
                self.execute(&fresh, next).await?;
            }
        }

        Ok(CycleReport {
            snapshot,
            actions,
            terminal,
        })
    }

    async fn execute(&self, snapshot: &LeadSnapshot, action: Action) -> AppResult<Option<ListOutcome>> {
        match action {
            Action::GenerateList { kind } => self.generate_list(snapshot, kind).await.map(Some),
            Action::DeliverSelection { index, items } => {
                log_info(&format!(
                    "📦 Lead {}: entregando escolha {} ({} boleto(s))",
                    snapshot.lead_id,
                    index,
                    items.len()
                ));
                self.deliver_selection(snapshot, &items).await?;
                Ok(None)
            }
            Action::Reset => {
                self.reset(snapshot.lead_id).await?;
                Ok(None)
            }
            Action::ClearSelectionOnly => {
                self.clear_selection(snapshot.lead_id).await?;
                Ok(None)
            }
            Action::NoOp => Ok(None),
        }
    }

    /// Consulta as parcelas e grava a lista no lead
    ///
    /// A resposta do cliente é sempre consumida, achando ou não boletos.
    /// Falhas transitórias não gravam nada; o próximo polling tenta de novo.
    pub async fn generate_list(&self, snapshot: &LeadSnapshot, kind: InstallmentKind) -> AppResult<ListOutcome> {
        let lead_id = snapshot.lead_id;
        let payer_id = snapshot.payer_id.as_deref().unwrap_or_default();

        log_info(&format!("🔎 Lead {}: buscando boletos ({})", lead_id, kind.as_path()));

        match self.billing.list_installments(payer_id, kind).await {
            Ok(items) => {
                let pending = serde_json::to_string(&items)?;
                let mut updates = vec![
                    FieldUpdate::text(self.fields.pending_items, pending),
                    FieldUpdate::clear(self.fields.customer_reply),
                    FieldUpdate::flag(self.fields.not_found_flag, false),
                    FieldUpdate::flag(self.fields.error_flag, false),
                ];
                if let Some(detailed_list) = self.fields.detailed_list {
                    updates.push(FieldUpdate::text(detailed_list, render_detailed_list(&items)));
                }
                self.write(lead_id, "generate_list", &updates).await?;

                log_info(&format!("📋 Lead {}: lista com {} boleto(s) gravada", lead_id, items.len()));
                Ok(ListOutcome::Generated(items.len()))
            }
            Err(SostError::NotFound(_)) => {
                log_warning(&format!(
                    "⚠️ Lead {}: nenhum boleto encontrado para o CNPJ {}",
                    lead_id, payer_id
                ));
                self.write(
                    lead_id,
                    "list_not_found",
                    &[
                        FieldUpdate::flag(self.fields.not_found_flag, true),
                        FieldUpdate::clear(self.fields.customer_reply),
                    ],
                )
                .await?;
                Ok(ListOutcome::NotFound)
            }
            Err(e) => {
                log_sost_api_error("list_installments", &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Entrega os boletos escolhidos, um por campo BOLETO_N, em ordem
    ///
    /// Item cujo slot já tem o arquivo (tentativa anterior interrompida por
    /// falha transitória) não é baixado nem enviado de novo.
    pub async fn deliver_selection(&self, snapshot: &LeadSnapshot, items: &[Installment]) -> AppResult<BatchReport> {
        let lead_id = snapshot.lead_id;
        let payer_id = snapshot.payer_id.as_deref().unwrap_or_default();
        let mut report = BatchReport::default();

        for (i, item) in items.iter().enumerate() {
            let Some(&slot_field) = self.fields.document_slots.get(i) else {
                log_warning(&format!(
                    "⚠️ Lead {}: sem campo de boleto para o item {} (apenas {} configurados)",
                    lead_id,
                    i + 1,
                    self.fields.document_slots.len()
                ));
                break;
            };

            let file_name = document_file_name(item);
            if snapshot.slot_holds(i, &file_name) {
                log_info(&format!(
                    "↪️ Lead {}: {} já vinculado ao campo {}",
                    lead_id, file_name, slot_field
                ));
                report.already_linked += 1;
                continue;
            }

            match self.delivery.deliver(lead_id, payer_id, item, slot_field).await {
                Ok(delivered) => report.delivered.push(delivered),
                Err(e) => {
                    log_warning(&format!("⚠️ Lead {}: item {} não entregue: {}", lead_id, i + 1, e));
                    report.failed.push(e);
                }
            }
        }

        let transient = report
            .failed
            .iter()
            .any(|e| matches!(e, DeliveryError::TransientUpstream(_)));

        if transient {
            log_warning(&format!(
                "⚠️ Lead {}: escolha mantida para nova tentativa no próximo polling",
                lead_id
            ));
            return Ok(report);
        }

        let mut updates = vec![
            FieldUpdate::clear(self.fields.selection),
            FieldUpdate::clear(self.fields.pending_items),
        ];
        if let Some(detailed_list) = self.fields.detailed_list {
            updates.push(FieldUpdate::clear(detailed_list));
        }
        self.write(lead_id, "finish_selection", &updates).await?;
        report.complete = true;

        log_info(&format!(
            "✅ Lead {}: ciclo de entrega finalizado ({} entregue(s), {} já vinculado(s), {} falha(s))",
            lead_id,
            report.delivered.len(),
            report.already_linked,
            report.failed.len()
        ));
        Ok(report)
    }

    /// Limpa todos os campos de controle da conversa, sentinelas incluídas
    pub async fn reset(&self, lead_id: u64) -> AppResult<()> {
        let mut updates = vec![
            FieldUpdate::clear(self.fields.customer_reply),
            FieldUpdate::clear(self.fields.selection),
            FieldUpdate::clear(self.fields.pending_items),
            FieldUpdate::flag(self.fields.not_found_flag, false),
            FieldUpdate::flag(self.fields.error_flag, false),
        ];
        if let Some(detailed_list) = self.fields.detailed_list {
            updates.push(FieldUpdate::clear(detailed_list));
        }
        if let Some(another_document) = self.fields.another_document {
            updates.push(FieldUpdate::clear(another_document));
        }
        if let Some(finish_flag) = self.fields.finish_flag {
            updates.push(FieldUpdate::flag(finish_flag, false));
        }

        self.write(lead_id, "reset", &updates).await?;
        log_info(&format!("🏁 Lead {}: atendimento encerrado, campos limpos", lead_id));
        Ok(())
    }

    /// O cliente quer outro boleto: limpa a escolha e a pergunta
    pub async fn clear_selection(&self, lead_id: u64) -> AppResult<()> {
        let mut updates = vec![FieldUpdate::clear(self.fields.selection)];
        if let Some(another_document) = self.fields.another_document {
            updates.push(FieldUpdate::clear(another_document));
        }
        self.write(lead_id, "clear_selection", &updates).await
    }

    async fn write(&self, lead_id: u64, operation: &str, updates: &[FieldUpdate]) -> AppResult<()> {
        self.store.update_fields(lead_id, updates).await.map_err(|e| {
            log_kommo_api_error(operation, lead_id, &e.to_string());
            e.into()
        })
    }
}

/// Mensagem numerada que o bot mostra ao cliente
pub fn render_detailed_list(items: &[Installment]) -> String {
    let mut message = String::from("*Selecione o boleto desejado:*\n");

    for (i, item) in items.iter().take(LIST_PREVIEW_LIMIT).enumerate() {
        message.push_str(&format!(
            "[{}] Boleto {} - [Nota {}] - {} - {} - {} parcela\n",
            i + 1,
            i + 1,
            item.document_number,
            format_date_br(item.due_date.as_deref()),
            format_currency_brl(item.amount.as_deref().unwrap_or("0")),
            item.installment
        ));
    }

    message.push_str(&format!("[{}] Todos", items.len() + 1));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;
    use serde_json::{json, Value};

    const LEAD: u64 = 7;

    fn service(store: &Arc<FakeStore>, billing: &Arc<FakeBilling>) -> ConversationService {
        ConversationService::new(
            store.clone(),
            billing.clone(),
            field_map(),
            ConversationSettings::default(),
            false,
        )
    }

    fn cached(items: &[Installment]) -> Value {
        json!(serde_json::to_string(items).unwrap())
    }

    #[tokio::test]
    async fn test_reply_generates_upcoming_list() {
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("12345678000199")), (REPLY, json!("1")), (PENDING, json!(""))],
        ));
        let billing = Arc::new(FakeBilling::default().with_items(vec![item(1), item(2)]));

        let report = service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert_eq!(report.actions, vec!["GenerateList"]);
        assert!(!report.terminal);
        assert_eq!(
            billing.list_calls(),
            vec![("12345678000199".to_string(), InstallmentKind::Upcoming)]
        );
        assert!(store.has_text(LEAD, PENDING));
        assert_eq!(store.field(LEAD, REPLY), Some(json!("")));
        assert_eq!(store.field(LEAD, NOT_FOUND), Some(json!(false)));

        let detailed = store.field(LEAD, DETAILED).unwrap();
        let detailed = detailed.as_str().unwrap();
        assert!(detailed.starts_with("*Selecione o boleto desejado:*\n"));
        assert!(detailed.contains("[1] Boleto 1 - [Nota 1001] - 10/03/2025 - R$ 150,00 - 1 parcela"));
        assert!(detailed.ends_with("[3] Todos"));
    }

    #[tokio::test]
    async fn test_empty_list_raises_not_found() {
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("12345678000199")), (REPLY, json!("2"))],
        ));
        let billing = Arc::new(FakeBilling::default().with_items(vec![]));

        service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert_eq!(store.field(LEAD, NOT_FOUND), Some(json!(true)));
        assert_eq!(store.field(LEAD, REPLY), Some(json!("")));
        assert!(!store.has_text(LEAD, PENDING));
        assert!(billing.fetch_calls().is_empty());
    }

    #[tokio::test]
    async fn test_transient_list_failure_keeps_reply() {
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("12345678000199")), (REPLY, json!("3"))],
        ));
        let billing = Arc::new(FakeBilling::default().with_failing_list());

        assert!(service(&store, &billing).run_cycle(LEAD).await.is_err());
        assert_eq!(store.field(LEAD, REPLY), Some(json!("3")));
        assert!(store.calls_matching(|c| matches!(c, Call::Update { .. })).is_empty());
    }

    #[tokio::test]
    async fn test_select_all_delivers_each_item_in_order() {
        let items = vec![item(1), item(2), item(3)];
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[
                (PAYER, json!("12345678000199")),
                (PENDING, cached(&items)),
                (SELECTION, json!("4")),
                (DETAILED, json!("lista")),
            ],
        ));
        let billing = Arc::new(
            FakeBilling::default()
                .with_document("1001", b"%PDF-1")
                .with_document("1002", b"%PDF-2")
                .with_document("1003", b"%PDF-3"),
        );

        let report = service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert_eq!(report.actions, vec!["DeliverSelection"]);
        assert_eq!(billing.fetch_calls(), vec!["1001", "1002", "1003"]);
        for (i, slot) in SLOTS.iter().take(3).enumerate() {
            let linked = store.field(LEAD, *slot).unwrap();
            assert_eq!(linked["file_name"], json!(format!("BOLETO_100{}_P{}.pdf", i + 1, i + 1)));
        }
        assert_eq!(store.field(LEAD, SLOTS[3]), None);
        assert_eq!(store.field(LEAD, SELECTION), Some(json!("")));
        assert_eq!(store.field(LEAD, PENDING), Some(json!("")));
        assert_eq!(store.field(LEAD, DETAILED), Some(json!("")));
    }

    #[tokio::test]
    async fn test_select_all_is_capped_at_five_slots() {
        let items: Vec<Installment> = (1..=7).map(item).collect();
        let mut billing = FakeBilling::default();
        for n in 1..=7 {
            billing = billing.with_document(&format!("{}", 1000 + n), b"%PDF");
        }
        let billing = Arc::new(billing);
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("1")), (PENDING, cached(&items)), (SELECTION, json!("8"))],
        ));

        service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert_eq!(billing.fetch_calls(), vec!["1001", "1002", "1003", "1004", "1005"]);
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_roll_back() {
        let items = vec![item(1), item(2)];
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("1")), (PENDING, cached(&items)), (SELECTION, json!("3"))],
        ));
        // 1002 não existe na SOST
        let billing = Arc::new(FakeBilling::default().with_document("1001", b"%PDF"));

        let service = service(&store, &billing);
        let snapshot = service.snapshot(LEAD).await.unwrap();
        let report = service.deliver_selection(&snapshot, &items).await.unwrap();

        assert_eq!(report.delivered.len(), 1);
        assert!(matches!(report.failed[0], DeliveryError::NotFound(_)));
        assert!(report.complete);
        assert!(store.field(LEAD, SLOTS[0]).is_some());
        assert_eq!(store.field(LEAD, NOT_FOUND), Some(json!(true)));
        assert_eq!(store.field(LEAD, SELECTION), Some(json!("")));
    }

    #[tokio::test]
    async fn test_transient_delivery_failure_keeps_selection() {
        let items = vec![item(1)];
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("1")), (PENDING, cached(&items)), (SELECTION, json!("1"))],
        ));
        let billing = Arc::new(FakeBilling::default().with_error(
            "1001",
            SostError::ApiError {
                status: 502,
                message: "gateway".to_string(),
            },
        ));

        service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert_eq!(store.field(LEAD, SELECTION), Some(json!("1")));
        assert!(store.has_text(LEAD, PENDING));
    }

    #[tokio::test]
    async fn test_cascade_delivers_in_same_cycle() {
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("1")), (REPLY, json!("1")), (SELECTION, json!("1"))],
        ));
        let billing = Arc::new(
            FakeBilling::default()
                .with_items(vec![item(1)])
                .with_document("1001", b"%PDF"),
        );

        let report = service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert_eq!(report.actions, vec!["GenerateList", "DeliverSelection"]);
        assert!(store.field(LEAD, SLOTS[0]).is_some());
        assert_eq!(store.field(LEAD, PENDING), Some(json!("")));
        // Releu o lead antes de decidir
        assert_eq!(store.calls_matching(|c| matches!(c, Call::Get { .. })).len(), 2);
    }

    #[tokio::test]
    async fn test_finish_resets_and_is_terminal() {
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[
                (PAYER, json!("1")),
                (REPLY, json!("4")),
                (SELECTION, json!("2")),
                (PENDING, json!("[]")),
                (ANOTHER, json!("sim")),
                (FINISH, json!(true)),
                (NOT_FOUND, json!(true)),
                (ERROR, json!(true)),
            ],
        ));
        let billing = Arc::new(FakeBilling::default());

        let report = service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert!(report.terminal);
        for field in [REPLY, SELECTION, PENDING, DETAILED, ANOTHER] {
            assert_eq!(store.field(LEAD, field), Some(json!("")), "campo {}", field);
        }
        assert_eq!(store.field(LEAD, FINISH), Some(json!(false)));
        assert_eq!(store.field(LEAD, NOT_FOUND), Some(json!(false)));
        assert_eq!(store.field(LEAD, ERROR), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_error_flag_cleared_by_redelivery_and_reset() {
        let items = vec![item(1)];
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("1")), (PENDING, cached(&items)), (SELECTION, json!("1"))],
        ));
        let billing = Arc::new(FakeBilling::default().with_document("1001", br#"{"erro": "Barcode"}"#));
        let service = service(&store, &billing);

        service.run_cycle(LEAD).await.unwrap();
        assert_eq!(store.field(LEAD, ERROR), Some(json!(true)));
        assert!(!store.has_text(LEAD, SELECTION));

        // Cliente escolhe de novo e a SOST já devolve o PDF
        billing.set_document("1001", b"%PDF-1.4");
        store.set_field(LEAD, PENDING, cached(&items));
        store.set_field(LEAD, SELECTION, json!("1"));
        let report = service.run_cycle(LEAD).await.unwrap();

        assert_eq!(report.actions, vec!["DeliverSelection"]);
        assert!(store.field(LEAD, SLOTS[0]).is_some());
        assert_eq!(store.field(LEAD, ERROR), Some(json!(false)));

        store.set_field(LEAD, ERROR, json!(true));
        store.set_field(LEAD, REPLY, json!("4"));
        let report = service.run_cycle(LEAD).await.unwrap();

        assert!(report.terminal);
        assert_eq!(store.field(LEAD, ERROR), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_list_generation_clears_error_flag() {
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("1")), (REPLY, json!("3")), (ERROR, json!(true))],
        ));
        let billing = Arc::new(FakeBilling::default().with_items(vec![item(1)]));

        service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert!(store.has_text(LEAD, PENDING));
        assert_eq!(store.field(LEAD, ERROR), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_retry_skips_items_already_linked() {
        let items = vec![item(1), item(2)];
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("1")), (PENDING, cached(&items)), (SELECTION, json!("3"))],
        ));
        let billing = Arc::new(
            FakeBilling::default()
                .with_document("1001", b"%PDF-1")
                .with_error(
                    "1002",
                    SostError::ApiError {
                        status: 503,
                        message: "VPN fora do ar".to_string(),
                    },
                ),
        );
        let service = ConversationService::new(
            store.clone(),
            billing.clone(),
            field_map(),
            ConversationSettings::default(),
            true,
        );

        let first = service.run_cycle(LEAD).await.unwrap();
        assert_eq!(first.actions, vec!["DeliverSelection"]);
        assert_eq!(store.field(LEAD, SELECTION), Some(json!("3")));

        // Próximos pollings: a SOST volta e só o item 2 é refeito
        billing.set_document("1002", b"%PDF-2");
        for _ in 0..4 {
            service.run_cycle(LEAD).await.unwrap();
        }

        let sessions = store.calls_matching(|c| matches!(c, Call::Session { .. }));
        assert_eq!(
            sessions
                .iter()
                .filter(|c| matches!(c, Call::Session { file_name, .. } if file_name == "BOLETO_1001_P1.pdf"))
                .count(),
            1
        );
        assert_eq!(sessions.len(), 2);
        assert_eq!(store.calls_matching(|c| matches!(c, Call::Note { .. })).len(), 2);
        assert_eq!(store.field(LEAD, SLOTS[1]).unwrap()["file_name"], json!("BOLETO_1002_P2.pdf"));
        assert_eq!(store.field(LEAD, SELECTION), Some(json!("")));
    }

    #[tokio::test]
    async fn test_oversized_item_does_not_hold_the_batch() {
        let items = vec![item(1), item(2)];
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[(PAYER, json!("1")), (PENDING, cached(&items)), (SELECTION, json!("3"))],
        ));
        let billing = Arc::new(
            FakeBilling::default()
                .with_document("1001", b"%PDF-1")
                .with_error(
                    "1002",
                    SostError::PayloadTooLarge {
                        size: 20_000_000,
                        limit: 10_485_760,
                    },
                ),
        );
        let service = service(&store, &billing);

        for _ in 0..5 {
            service.run_cycle(LEAD).await.unwrap();
        }

        assert_eq!(billing.fetch_calls(), vec!["1001", "1002"]);
        assert_eq!(store.calls_matching(|c| matches!(c, Call::Upload { .. })).len(), 1);
        assert_eq!(store.field(LEAD, ERROR), Some(json!(true)));
        assert_eq!(store.field(LEAD, SELECTION), Some(json!("")));
    }

    #[tokio::test]
    async fn test_another_document_clears_selection_only() {
        let items = vec![item(1)];
        let store = Arc::new(FakeStore::with_lead(
            LEAD,
            &[
                (PAYER, json!("1")),
                (PENDING, cached(&items)),
                (SELECTION, json!("1")),
                (ANOTHER, json!("Sim")),
            ],
        ));
        let billing = Arc::new(FakeBilling::default());

        let report = service(&store, &billing).run_cycle(LEAD).await.unwrap();

        assert_eq!(report.actions, vec!["ClearSelectionOnly"]);
        assert!(!report.terminal);
        assert_eq!(store.field(LEAD, SELECTION), Some(json!("")));
        assert_eq!(store.field(LEAD, ANOTHER), Some(json!("")));
        assert!(store.has_text(LEAD, PENDING));
        assert!(billing.fetch_calls().is_empty());
    }

    #[tokio::test]
    async fn test_noop_never_writes() {
        let store = Arc::new(FakeStore::with_lead(LEAD, &[(PAYER, json!("1")), (REPLY, json!("9"))]));
        let billing = Arc::new(FakeBilling::default());
        let service = service(&store, &billing);

        for _ in 0..3 {
            let report = service.run_cycle(LEAD).await.unwrap();
            assert_eq!(report.actions, vec!["NoOp"]);
        }
        assert!(store.calls_matching(|c| matches!(c, Call::Update { .. })).is_empty());
    }

    #[test]
    fn test_render_detailed_list_preview_limit() {
        let items: Vec<Installment> = (1..=12).map(item).collect();
        let message = render_detailed_list(&items);

        assert!(message.contains("[10] Boleto 10"));
        assert!(!message.contains("[11] Boleto 11"));
        assert!(message.ends_with("[13] Todos"));
    }
}
