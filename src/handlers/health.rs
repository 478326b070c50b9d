use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::logging::*;
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "kommo-sost-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Resumo da configuração carregada (sem tokens nem chaves)
pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_request_received("/status", "GET");

    let settings = &state.settings;
    let fields = &settings.fields;

    Json(json!({
        "service": "kommo-sost-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()),
        "shutting_down": *state.shutdown.borrow(),
        "integrations": {
            "kommo": {
                "subdomain": settings.kommo.subdomain,
                "token_configured": !settings.kommo.access_token.is_empty(),
                "drive_url_configured": settings.kommo.drive_url.is_some(),
                "attach_note": settings.kommo.attach_note
            },
            "sost": {
                "base_url": settings.sost.base_url,
                "api_key_configured": !settings.sost.api_key.is_empty()
            }
        },
        "polling": {
            "max_attempts": settings.polling.max_attempts,
            "interval_seconds": settings.polling.interval_seconds,
            "initial_delay_ms": settings.polling.initial_delay_ms
        },
        "fields": {
            "document_slots": fields.document_slots.len(),
            "detailed_list": fields.detailed_list.is_some(),
            "another_document": fields.another_document.is_some(),
            "finish_flag": fields.finish_flag.is_some()
        }
    }))
}
