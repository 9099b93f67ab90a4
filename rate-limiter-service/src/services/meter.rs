//! Client for the relay metering service.

use crate::error::{ClientError, Upstream};
use crate::models::AppRelays;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use service_core::http::HttpClient;

const APP_RELAY_METER_ENDPOINT: &str = "/v0/relays/apps";

#[async_trait]
pub trait UsageMeter: Send + Sync {
    /// Per-application relay counts for `day`.
    async fn fetch_relays(&self, day: NaiveDate) -> Result<Vec<AppRelays>, ClientError>;
}

pub struct HttpUsageMeter {
    http: HttpClient,
    base_url: String,
}

impl HttpUsageMeter {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// `day` at midnight UTC, the form the meter expects for both bounds.
pub fn zero_time(day: NaiveDate) -> String {
    format!("{}T00:00:00Z", day.format("%Y-%m-%d"))
}

#[async_trait]
impl UsageMeter for HttpUsageMeter {
    async fn fetch_relays(&self, day: NaiveDate) -> Result<Vec<AppRelays>, ClientError> {
        let url = format!("{}{}", self.base_url, APP_RELAY_METER_ENDPOINT);
        let bound = zero_time(day);

        let request = self
            .http
            .get(&url)
            .query(&[("from", bound.as_str()), ("to", bound.as_str())]);
        let response = self.http.send("get_relays_count", request).await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus(
                Upstream::Relays,
                response.status(),
            ));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
