use axum::response::IntoResponse;
use service_core::error::AppError;

pub const LIVENESS_MESSAGE: &str = "Rate Limiter is up and running!";

pub async fn health_check() -> impl IntoResponse {
    LIVENESS_MESSAGE
}

pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Route not found"))
}
