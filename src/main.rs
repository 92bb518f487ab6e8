use gundam_codex::api::{self, app_state::AppState};
use gundam_codex::cache::create_cache;
use gundam_codex::config::loader::{ConfigLoader, config_exists};
use gundam_codex::observability::{
    AppMetrics, ObservabilityState, logging::init_tracing, spawn_health_checker,
};
use gundam_codex::storage::StorageFactory;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load()?;
    let _log_guard = init_tracing(&config.logging)?;

    if !config_exists() {
        warn!("config.yaml not found, using built-in defaults and environment overrides");
    }
    if let Err(e) = ConfigLoader::validate(&config) {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    info!(
        app = %config.app_name,
        environment = %config.environment,
        "Starting Gundam Codex..."
    );

    let repositories = StorageFactory::create(&config.database).await?;
    info!(backend = ?repositories.backend(), "Storage initialized");

    let cache = create_cache(&config.cache).await;
    info!(enabled = config.cache.enabled, "Cache initialized");

    tokio::fs::create_dir_all(&config.upload.dir).await?;

    let metrics = Arc::new(AppMetrics::new()?);
    let observability = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics.clone(),
    ));
    spawn_health_checker(
        observability.clone(),
        repositories.clone(),
        cache.clone(),
        HEALTH_CHECK_INTERVAL,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app_state = AppState::from_parts(config, repositories, cache, metrics);
    let router = api::create_router(app_state, observability);
    info!("API router created with observability endpoints");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    // Rate limiting keys clients by peer address
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
