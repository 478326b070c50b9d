use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!("Request processed: {} - Status: {} - Duration: {}ms",
          endpoint, status, duration_ms);
}

pub fn log_kommo_api_error(operation: &str, lead_id: u64, error: &str) {
    error!("Kommo API error: {} - Lead: {} - Error: {}", operation, lead_id, error);
}

pub fn log_sost_api_error(operation: &str, error: &str) {
    error!("SOST API error: {} - Error: {}", operation, error);
}

pub fn log_poll_attempt(lead_id: u64, attempt: u32, max_attempts: u32, summary: &str) {
    info!("Tentativa {}/{}: Lead: {} | {}", attempt, max_attempts, lead_id, summary);
}

pub fn log_document_delivered(lead_id: u64, file_name: &str, slot_field: u64) {
    info!("✅ Sucesso: {} anexado ao lead {} (campo {})", file_name, lead_id, slot_field);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Kommo-SOST middleware server starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
