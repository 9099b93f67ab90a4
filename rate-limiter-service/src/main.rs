use rate_limiter_service::config::LimiterConfig;
use rate_limiter_service::services::init_metrics;
use rate_limiter_service::startup::{Application, Collaborators};
use service_core::observability::init_tracing;
use tokio::signal;
use tokio_util::sync::CancellationToken;

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => return,
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = LimiterConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "rate-limiter-service",
        &config.observability.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    init_metrics().map_err(|e| {
        tracing::error!("Failed to install metrics recorder: {}", e);
        std::io::Error::other(format!("Metrics error: {}", e))
    })?;

    let collaborators = Collaborators::from_config(&config).map_err(|e| {
        tracing::error!("Failed to build upstream clients: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let application = Application::build(config, collaborators)
        .await
        .map_err(|e| {
            tracing::error!("Failed to start rate limiter: {}", e);
            std::io::Error::other(e.to_string())
        })?;

    tokio::spawn(shutdown_signal(application.shutdown_token()));

    application.run_until_stopped().await
}
