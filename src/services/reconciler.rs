//! Classificação do estado da conversa do bot
//!
//! O estado vive inteiro nos campos do lead. `reconcile` olha um snapshot e
//! devolve a próxima ação; quem executa é `ConversationService`.
//!
//! Ordem de classificação (o primeiro que casar vence):
//!
//! 1. Resposta "4" ou checkbox de finalizar → `Reset`
//! 2. "Deseja outro boleto?" negativo → `Reset`; positivo → `ClearSelectionOnly`
//! 3. CNPJ + resposta 1/2/3 + sem lista em cache → `GenerateList`
//! 4. CNPJ + lista em cache + escolha → `DeliverSelection`
//! 5. Qualquer outra coisa → `NoOp`

use sost::{Installment, InstallmentKind};

use crate::config::ConversationSettings;
use crate::models::LeadSnapshot;
use crate::utils::logging::log_validation_error;
use crate::utils::string_utils::normalize_answer;

/// Quantidade de campos arquivo BOLETO_1..BOLETO_5 no lead
pub const DELIVERY_SLOTS: usize = 5;

/// Opção do menu que encerra o atendimento
const FINISH_OPTION: &str = "4";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Consultar parcelas na SOST e gravar a lista no lead
    GenerateList { kind: InstallmentKind },
    /// Entregar os boletos escolhidos (já resolvidos a partir da lista em cache)
    DeliverSelection { index: usize, items: Vec<Installment> },
    /// Limpar os campos de controle e encerrar o polling
    Reset,
    /// Limpar só a escolha; o cliente vai pedir outro boleto
    ClearSelectionOnly,
    NoOp,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::GenerateList { .. } => "GenerateList",
            Action::DeliverSelection { .. } => "DeliverSelection",
            Action::Reset => "Reset",
            Action::ClearSelectionOnly => "ClearSelectionOnly",
            Action::NoOp => "NoOp",
        }
    }
}

pub fn reconcile(snapshot: &LeadSnapshot, conversation: &ConversationSettings) -> Action {
    let reply = snapshot.customer_reply.as_deref().map(str::trim);

    if reply == Some(FINISH_OPTION) || snapshot.finish_flag {
        return Action::Reset;
    }

    if let Some(answer) = snapshot.another_document.as_deref() {
        let answer = normalize_answer(answer);
        if matches_any(&answer, &conversation.negative_answers) {
            return Action::Reset;
        }
        if matches_any(&answer, &conversation.positive_answers) {
            return Action::ClearSelectionOnly;
        }
    }

    if snapshot.payer_id.is_none() {
        return Action::NoOp;
    }

    let Some(pending) = snapshot.pending_items.as_deref() else {
        return match reply.and_then(InstallmentKind::from_menu_option) {
            Some(kind) => Action::GenerateList { kind },
            None => Action::NoOp,
        };
    };

    let Some(selection) = snapshot.selection.as_deref() else {
        return Action::NoOp;
    };

    let Some(items) = parse_pending_items(pending) else {
        log_validation_error(
            "pending_items",
            &format!("Lead {}: lista em cache ilegível", snapshot.lead_id),
        );
        return Action::NoOp;
    };

    match resolve_selection(selection, &items) {
        Some((index, items)) => Action::DeliverSelection { index, items },
        None => {
            log_validation_error(
                "selection",
                &format!(
                    "Lead {}: escolha '{}' inválida para {} itens",
                    snapshot.lead_id,
                    selection,
                    items.len()
                ),
            );
            Action::NoOp
        }
    }
}

/// Lista de parcelas gravada em `pending_items` (JSON com os nomes da SOST)
pub fn parse_pending_items(raw: &str) -> Option<Vec<Installment>> {
    serde_json::from_str(raw.trim()).ok()
}

/// Resolve a escolha 1-based contra a lista em cache
///
/// `count + 1` significa "Todos", limitado aos primeiros `DELIVERY_SLOTS`.
pub fn resolve_selection(selection: &str, items: &[Installment]) -> Option<(usize, Vec<Installment>)> {
    let index = selection.trim().parse::<usize>().ok()?;
    let count = items.len();

    if count == 0 || index == 0 || index > count + 1 {
        return None;
    }

    let chosen = if index == count + 1 {
        items.iter().take(DELIVERY_SLOTS).cloned().collect()
    } else {
        vec![items[index - 1].clone()]
    };

    Some((index, chosen))
}

fn matches_any(answer: &str, options: &[String]) -> bool {
    options.iter().any(|o| normalize_answer(o) == answer)
}
