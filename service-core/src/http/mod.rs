//! Outbound HTTP transport shared by the upstream clients.

pub mod client;
pub mod retry;

pub use client::HttpClient;
pub use retry::{RetryConfig, is_retryable_error, is_retryable_status};
