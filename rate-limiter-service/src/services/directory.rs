//! Client for the application directory (limits, notification settings and
//! first-surpassed dates).

use crate::error::{ClientError, Upstream};
use crate::models::{Application, FirstDateSurpassedUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use service_core::http::HttpClient;
use std::collections::HashMap;

const APPS_ENDPOINT: &str = "/application";
const FIRST_DATE_SURPASSED_ENDPOINT: &str = "/application/first_date_surpassed";

#[async_trait]
pub trait ApplicationDirectory: Send + Sync {
    /// Every application with a public key, indexed by that key.
    async fn fetch_applications(&self) -> Result<HashMap<String, Application>, ClientError>;

    /// Records `at` as the first-surpassed date of `app_ids`.
    /// An empty list is a no-op.
    async fn set_first_date_surpassed(
        &self,
        app_ids: &[String],
        at: DateTime<Utc>,
    ) -> Result<(), ClientError>;
}

pub struct HttpDirectory {
    http: HttpClient,
    base_url: String,
    api_key: SecretString,
}

impl HttpDirectory {
    pub fn new(http: HttpClient, base_url: &str, api_key: SecretString) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl ApplicationDirectory for HttpDirectory {
    async fn fetch_applications(&self) -> Result<HashMap<String, Application>, ClientError> {
        let url = format!("{}{}", self.base_url, APPS_ENDPOINT);

        let request = self
            .http
            .get(&url)
            .header(AUTHORIZATION, self.api_key.expose_secret().as_str());
        let response = self.http.send("get_app_limits", request).await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus(
                Upstream::Limits,
                response.status(),
            ));
        }

        let body = response.bytes().await?;
        let applications: Vec<Application> = serde_json::from_slice(&body)?;

        Ok(index_by_public_key(applications))
    }

    async fn set_first_date_surpassed(
        &self,
        app_ids: &[String],
        at: DateTime<Utc>,
    ) -> Result<(), ClientError> {
        if app_ids.is_empty() {
            return Ok(());
        }

        let url = format!("{}{}", self.base_url, FIRST_DATE_SURPASSED_ENDPOINT);
        let body = FirstDateSurpassedUpdate {
            first_date_surpassed: at,
            application_ids: app_ids.to_vec(),
        };

        let request = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.api_key.expose_secret().as_str())
            .json(&body);
        let response = self.http.send("set_first_date_surpassed", request).await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus(
                Upstream::DateSurpassed,
                response.status(),
            ));
        }

        tracing::info!(
            app_count = app_ids.len(),
            first_date_surpassed = %at,
            "Persisted first date surpassed"
        );

        Ok(())
    }
}

/// Applications without a public key cannot be matched to usage and are dropped.
fn index_by_public_key(applications: Vec<Application>) -> HashMap<String, Application> {
    let mut indexed = HashMap::with_capacity(applications.len());

    for app in applications {
        if app.public_key().is_empty() {
            tracing::debug!(app_id = %app.id, "Skipping application without public key");
            continue;
        }
        indexed.insert(app.public_key().to_string(), app);
    }

    indexed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GatewayAat;

    fn app(id: &str, key: &str) -> Application {
        Application {
            id: id.to_string(),
            gateway_aat: GatewayAat {
                application_public_key: key.to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_index_drops_empty_keys() {
        let indexed = index_by_public_key(vec![app("a", "pk-a"), app("b", ""), app("c", "pk-c")]);

        assert_eq!(indexed.len(), 2);
        assert_eq!(indexed["pk-a"].id, "a");
        assert_eq!(indexed["pk-c"].id, "c");
    }
}
