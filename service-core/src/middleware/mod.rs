pub mod api_key;
pub mod metrics;
pub mod tracing;

pub use api_key::{API_KEY_HEADER, ApiKeyConfig, api_key_middleware};
pub use metrics::metrics_middleware;
pub use tracing::{REQUEST_ID_HEADER, request_id_middleware};
