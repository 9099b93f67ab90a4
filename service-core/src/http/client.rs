use super::retry::{RetryConfig, is_retryable_error, is_retryable_status};
use crate::observability::inject_trace_context;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// `reqwest` client with a fixed per-request timeout and a retry policy.
///
/// Status codes are never turned into errors here; callers decide what an
/// unexpected status means for them.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    retry: RetryConfig,
}

impl HttpClient {
    pub fn new(timeout: Duration, retry: RetryConfig) -> Result<Self, reqwest::Error> {
        let inner = Client::builder().timeout(timeout).build()?;
        Ok(Self { inner, retry })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.inner.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.inner.post(url)
    }

    /// Sends `request`, retrying transient failures.
    ///
    /// Returns the last response (even a 5xx one) once retries are exhausted.
    pub async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        let request = request.headers(headers);

        let mut attempt = 0;

        loop {
            // Streaming bodies cannot be replayed, so they only get one shot.
            let Some(current) = request.try_clone() else {
                return request.send().await;
            };

            let can_retry = attempt < self.retry.max_retries;

            match current.send().await {
                Ok(response) if can_retry && is_retryable_status(response.status()) => {
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        status = %response.status(),
                        "Upstream returned server error, retrying"
                    );
                }
                Ok(response) => {
                    if attempt > 0 {
                        info!(operation, attempt = attempt + 1, "Upstream call completed after retry");
                    }
                    return Ok(response);
                }
                Err(err) if can_retry && is_retryable_error(&err) => {
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        error = %err,
                        "Upstream call failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }

            sleep(self.retry.backoff_duration(attempt)).await;
            attempt += 1;
        }
    }
}
