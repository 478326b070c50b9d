//! Polling do lead depois de cada webhook
//!
//! A resposta do cliente chega depois, como mais uma alteração de campo no
//! lead. Cada webhook aceito vira uma task que relê o lead a cada intervalo
//! até o atendimento terminar, as tentativas acabarem ou o servidor desligar.

use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

use crate::config::PollingSettings;
use crate::services::conversation::ConversationService;
use crate::utils::logging::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Atendimento encerrado (Reset) na tentativa indicada
    Terminal { attempt: u32 },
    /// Tentativas esgotadas; o lead fica como está
    TimedOut,
    /// Sinal de desligamento recebido
    Cancelled,
}

#[derive(Clone)]
pub struct PollingOrchestrator {
    conversation: ConversationService,
    polling: PollingSettings,
    shutdown: watch::Receiver<bool>,
}

impl PollingOrchestrator {
    pub fn new(conversation: ConversationService, polling: PollingSettings, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            conversation,
            polling,
            shutdown,
        }
    }

    pub async fn run(&self, lead_id: u64) -> PollOutcome {
        let run_id = Uuid::new_v4();
        let max_attempts = self.polling.max_attempts;
        let mut shutdown = self.shutdown.clone();

        log_info(&format!(
            "🛰️ Monitoramento iniciado: lead {} (execução {}, até {} tentativas)",
            lead_id, run_id, max_attempts
        ));

        // A Kommo dispara o webhook antes de terminar de gravar os campos
        if !pause(Duration::from_millis(self.polling.initial_delay_ms), &mut shutdown).await {
            return cancelled(lead_id, run_id);
        }

        for attempt in 1..=max_attempts {
            match self.conversation.run_cycle(lead_id).await {
                Ok(report) => {
                    log_poll_attempt(
                        lead_id,
                        attempt,
                        max_attempts,
                        &format!("{} | Ação: {}", report.snapshot.summary(), report.actions.join(" → ")),
                    );
                    if report.terminal {
                        log_info(&format!(
                            "🏁 Monitoramento encerrado: lead {} (execução {}) na tentativa {}",
                            lead_id, run_id, attempt
                        ));
                        return PollOutcome::Terminal { attempt };
                    }
                }
                Err(e) => {
                    log_warning(&format!(
                        "⚠️ Tentativa {}/{} do lead {} falhou: {}",
                        attempt, max_attempts, lead_id, e
                    ));
                }
            }

            if attempt < max_attempts
                && !pause(Duration::from_secs(self.polling.interval_seconds), &mut shutdown).await
            {
                return cancelled(lead_id, run_id);
            }
        }

        log_warning(&format!(
            "⌛ Tempo de espera esgotado para o lead {} (execução {})",
            lead_id, run_id
        ));
        PollOutcome::TimedOut
    }
}

fn cancelled(lead_id: u64, run_id: Uuid) -> PollOutcome {
    log_warning(&format!(
        "🛑 Monitoramento do lead {} (execução {}) interrompido pelo desligamento",
        lead_id, run_id
    ));
    PollOutcome::Cancelled
}

/// Dorme pelo tempo pedido; retorna `false` se o desligamento chegar antes
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = wait_for_shutdown(shutdown) => false,
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            // Sender descartado: não haverá sinal de desligamento
            std::future::pending::<()>().await;
        }
    }
}
