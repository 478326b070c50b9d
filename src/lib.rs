// Biblioteca do middleware Kommo-SOST
// Expõe módulos para uso em testes e no binário

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use services::{BillingProvider, ConversationService, PollingOrchestrator, RecordStore};

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub conversation: ConversationService,
    /// Vira `true` quando o servidor começa a desligar
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        store: Arc<dyn RecordStore>,
        billing: Arc<dyn BillingProvider>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let conversation = ConversationService::new(
            store,
            billing,
            settings.fields.clone(),
            settings.conversation.clone(),
            settings.kommo.attach_note,
        );
        Self {
            settings,
            conversation,
            shutdown,
        }
    }

    /// Orquestrador de polling para um webhook recém-aceito
    pub fn poller(&self) -> PollingOrchestrator {
        PollingOrchestrator::new(
            self.conversation.clone(),
            self.settings.polling.clone(),
            self.shutdown.clone(),
        )
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::status_check))
        // Webhook da Kommo (rota legada + alias)
        .route("/webhook-boletos", post(handlers::handle_kommo_webhook))
        .route("/webhooks/kommo", post(handlers::handle_kommo_webhook))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

#[cfg(test)]
pub(crate) fn test_state(
    store: Arc<dyn RecordStore>,
    billing: Arc<dyn BillingProvider>,
    fields: config::FieldMap,
) -> Arc<AppState> {
    use crate::config::settings::{KommoSettings, ServerSettings, SostSettings};
    use crate::config::{ConversationSettings, PollingSettings, Settings};

    let settings = Settings {
        server: ServerSettings::default(),
        kommo: KommoSettings {
            subdomain: "empresa".to_string(),
            access_token: "token-secreto".to_string(),
            drive_url: None,
            base_url: None,
            attach_note: true,
        },
        sost: SostSettings {
            base_url: "http://sost.test/api".to_string(),
            api_key: "chave-secreta".to_string(),
        },
        polling: PollingSettings::default(),
        fields,
        conversation: ConversationSettings::default(),
    };

    // Pollers disparados pelos testes de handler encerram na hora
    let (_tx, rx) = watch::channel(true);
    Arc::new(AppState::new(settings, store, billing, rx))
}
