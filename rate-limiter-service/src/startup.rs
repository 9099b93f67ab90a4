//! Application startup and lifecycle management.

use crate::config::LimiterConfig;
use crate::engine::LimitCache;
use crate::handlers::{get_app_ids, health_check, metrics_endpoint, not_found};
use crate::notifier::Notifier;
use crate::scheduler::{join_task, spawn_notifier_task, spawn_refresh_task};
use crate::services::{
    ApplicationDirectory, Auth0Client, EmailProvider, HttpDirectory, HttpUsageMeter,
    IdentityProvider, MailgunProvider, MockEmailProvider, UsageMeter,
};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::http::{HttpClient, RetryConfig};
use service_core::middleware::{
    api_key_middleware, metrics_middleware, request_id_middleware, ApiKeyConfig,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<LimitCache>,
}

/// The outbound services the limiter talks to.
pub struct Collaborators {
    pub directory: Arc<dyn ApplicationDirectory>,
    pub meter: Arc<dyn UsageMeter>,
    pub identity: Arc<dyn IdentityProvider>,
    pub email: Arc<dyn EmailProvider>,
}

impl Collaborators {
    /// HTTP-backed collaborators sharing one client built from `config.http`.
    pub fn from_config(config: &LimiterConfig) -> Result<Self, AppError> {
        let http = HttpClient::new(
            config.http.timeout,
            RetryConfig::with_max_retries(config.http.retries),
        )
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        let email: Arc<dyn EmailProvider> = if config.mailgun.enabled {
            let provider = MailgunProvider::new(config.mailgun.clone(), http.clone())
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
            tracing::info!(domain = %config.mailgun.domain, "Mailgun email provider initialized");
            Arc::new(provider)
        } else {
            tracing::info!("Mailgun provider disabled, using mock email provider");
            Arc::new(MockEmailProvider::new(true))
        };

        Ok(Self {
            directory: Arc::new(HttpDirectory::new(
                http.clone(),
                &config.upstream.http_db_url,
                config.upstream.http_db_api_key.clone(),
            )),
            meter: Arc::new(HttpUsageMeter::new(
                http.clone(),
                &config.upstream.relay_meter_url,
            )),
            identity: Arc::new(Auth0Client::new(
                http,
                &config.auth0.domain,
                config.auth0.client_id.clone(),
                config.auth0.client_secret.clone(),
            )),
            email,
        })
    }
}

/// Routes with the API-key check on everything but the liveness root.
pub fn router(state: AppState, api_keys: ApiKeyConfig) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/v0/app-ids", get(get_app_ids))
        .route("/metrics", get(metrics_endpoint))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(api_keys, api_key_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    config: LimiterConfig,
    state: AppState,
    notifier: Arc<Notifier>,
    shutdown: CancellationToken,
}

impl Application {
    /// Builds the application and fills the cache once before serving.
    ///
    /// A failed first refresh is returned as an error; the service never
    /// starts without a snapshot.
    pub async fn build(config: LimiterConfig, collaborators: Collaborators) -> Result<Self, AppError> {
        let cache = Arc::new(LimitCache::new(
            collaborators.directory,
            collaborators.meter,
            config.limits.grace_period,
        ));

        cache.refresh().await.map_err(|e| {
            tracing::error!(stage = e.stage(), error = %e, "Initial cache refresh failed");
            AppError::InternalError(anyhow::Error::new(e))
        })?;

        let notifier = Arc::new(Notifier::new(
            Arc::clone(&cache),
            collaborators.identity,
            collaborators.email,
        ));

        // Port 0 picks a random port for tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, "Rate limiter listening");

        Ok(Self {
            port,
            listener,
            config,
            state: AppState { cache },
            notifier,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn cache(&self) -> Arc<LimitCache> {
        Arc::clone(&self.state.cache)
    }

    /// Cancelling this token stops the periodic tasks and the server.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serves HTTP and runs the periodic tasks until the shutdown token fires.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let scheduler = &self.config.scheduler;

        let refresh = spawn_refresh_task(
            self.cache(),
            scheduler.refresh_interval,
            self.shutdown.clone(),
        );
        let notifier = scheduler.notifier_enabled.then(|| {
            spawn_notifier_task(
                Arc::clone(&self.notifier),
                scheduler.notifier_interval,
                self.shutdown.clone(),
            )
        });
        if notifier.is_none() {
            tracing::info!("Notifier disabled");
        }

        let api_keys = ApiKeyConfig::new(self.config.api.keys.clone(), vec!["/".to_string()]);
        let app = router(self.state, api_keys);

        let shutdown = self.shutdown.clone();
        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;

        // The server can also stop on its own error; make sure the loops end too.
        self.shutdown.cancel();
        join_task("refresh", refresh).await;
        if let Some(handle) = notifier {
            join_task("notifier", handle).await;
        }

        if let Err(e) = &result {
            tracing::error!("HTTP server error: {}", e);
        }
        result
    }
}
