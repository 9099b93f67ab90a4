use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

pub const API_KEY_HEADER: &str = "Authorization";

/// Static API keys accepted by [`api_key_middleware`].
///
/// With no keys configured every request passes through.
#[derive(Clone, Debug, Default)]
pub struct ApiKeyConfig {
    keys: Arc<Vec<SecretString>>,
    excluded_paths: Arc<Vec<String>>,
}

impl ApiKeyConfig {
    pub fn new(keys: Vec<SecretString>, excluded_paths: Vec<String>) -> Self {
        Self {
            keys: Arc::new(keys),
            excluded_paths: Arc::new(excluded_paths),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|p| p == path)
    }

    fn accepts(&self, candidate: &str) -> bool {
        // Fold over every key so timing does not reveal which one matched.
        self.keys.iter().fold(false, |matched, key| {
            let equal: bool = key
                .expose_secret()
                .as_bytes()
                .ct_eq(candidate.as_bytes())
                .into();
            matched | equal
        })
    }
}

pub async fn api_key_middleware(
    State(config): State<ApiKeyConfig>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !config.is_enabled() || config.is_excluded(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() || !config.accepts(provided) {
        warn!(path = %req.uri().path(), "Rejected request with missing or invalid API key");
        return Err(AppError::Unauthorized(anyhow::anyhow!("Invalid API key")));
    }

    Ok(next.run(req).await)
}
