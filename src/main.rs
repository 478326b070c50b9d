/// Middleware de boletos Kommo ↔ SOST
///
/// Fluxo:
/// - Kommo dispara o webhook quando o lead muda (etapa do bot)
/// - O handler responde 200 na hora e inicia o polling do lead
/// - Cada tentativa relê os campos, decide a ação e grava o resultado
/// - Boletos vão da SOST para o Kommo Drive e ficam vinculados ao lead
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use kommo_sost_middleware::{build_router, config::Settings, utils::logging::*, utils::AppError, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 🔧 Carregar variáveis de ambiente do arquivo .env (se existir)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Inicializar tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if dotenv_loaded {
        log_info("✅ Arquivo .env carregado com sucesso");
    } else {
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Carregar configurações (falha cedo sem credenciais/IDs de campos)
    let settings = Settings::new().map_err(|e| AppError::ConfigError(format!("Failed to load settings: {}", e)))?;

    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    let mut kommo_client = match settings.kommo.base_url.as_deref() {
        Some(base_url) => kommo::KommoClient::with_base_url(base_url, settings.kommo.access_token.clone())?,
        None => kommo::KommoClient::new(&settings.kommo.subdomain, settings.kommo.access_token.clone())?,
    };
    if let Some(drive_url) = settings.kommo.drive_url.clone() {
        kommo_client = kommo_client.with_drive_url(drive_url);
    }
    log_info(&format!("⚡ Cliente Kommo configurado: {}", kommo_client.base_url()));

    let sost_client = sost::SostClient::new(settings.sost.base_url.clone(), settings.sost.api_key.clone())?
        .with_max_document_bytes(settings.server.max_body_bytes as u64);
    log_info(&format!("⚡ Cliente SOST configurado: {}", sost_client.base_url()));

    // Sinal de desligamento compartilhado com as tasks de polling
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app_state = Arc::new(AppState::new(
        settings.clone(),
        Arc::new(kommo_client),
        Arc::new(sost_client),
        shutdown_rx,
    ));

    let app = build_router(app_state);

    // Iniciar servidor
    // No Cloud Run, usar a variável de ambiente PORT
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("{}:{}", settings.server.host, port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("Failed to install Ctrl+C handler: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("Failed to install signal handler: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }

    // Pollers em andamento param no próximo intervalo
    if shutdown_tx.send(true).is_err() {
        log_warning("Nenhum polling ativo para interromper");
    }
}
