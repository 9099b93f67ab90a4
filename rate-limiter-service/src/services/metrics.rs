//! Prometheus metrics for the refresh and notification cycles.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Calling it twice is a no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// `status` is `success` or the stage that failed.
pub fn record_refresh(status: &'static str) {
    counter!("limiter_refresh_total", "status" => status).increment(1);
}

pub fn record_passed_limit(count: usize) {
    gauge!("limiter_apps_passed_limit").set(count as f64);
}

pub fn record_first_surpassed(count: usize) {
    counter!("limiter_first_surpassed_total").increment(count as u64);
}

/// `status` is one of `sent`, `skipped` or `failed`.
pub fn record_notification(status: &'static str) {
    counter!("limiter_notifications_total", "status" => status).increment(1);
}
