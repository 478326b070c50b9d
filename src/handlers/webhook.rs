use axum::{
    body::Body,
    extract::{Request, State},
    http::header::CONTENT_TYPE,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use crate::models::WebhookPayload;
use crate::utils::logging::*;
use crate::utils::AppError;
use crate::AppState;

/// `POST /webhook-boletos` (e `/webhooks/kommo`)
///
/// Responde na hora e deixa o polling do lead rodando em background.
pub async fn handle_kommo_webhook(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<Json<Value>, AppError> {
    let start_time = Instant::now();
    let endpoint = request.uri().path().to_string();
    log_request_received(&endpoint, "POST");

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body_bytes = axum::body::to_bytes(request.into_body(), state.settings.server.max_body_bytes)
        .await
        .map_err(|e| AppError::ValidationError(format!("Failed to read request body: {}", e)))?;

    let payload = WebhookPayload::parse(content_type.as_deref(), &body_bytes).map_err(|e| {
        log_validation_error("payload", &e.to_string());
        e
    })?;

    let Some(lead_id) = payload.lead_id() else {
        log_validation_error("leads", "ID do lead ausente no webhook");
        return Err(AppError::ValidationError("ID ausente".to_string()));
    };

    log_info(&format!("🛰️ Webhook acionado para o lead {}", lead_id));

    // Processar em background (não bloqueia a resposta)
    let poller = state.poller();
    tokio::spawn(async move {
        let outcome = poller.run(lead_id).await;
        log_info(&format!("Polling do lead {} finalizado: {:?}", lead_id, outcome));
    });

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed(&endpoint, 200, processing_time);

    Ok(Json(json!({
        "message": "Monitoramento iniciado",
        "lead_id": lead_id
    })))
}
