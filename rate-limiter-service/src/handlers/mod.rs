//! HTTP handlers for rate-limiter-service.

pub mod app_ids;
pub mod health;
pub mod metrics;

pub use app_ids::*;
pub use health::*;
pub use metrics::*;
