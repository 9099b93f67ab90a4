use super::{EmailMessage, EmailProvider, ProviderError, ProviderResponse};
use crate::config::MailgunConfig;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::http::HttpClient;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Sends stored templates through the Mailgun messages API.
pub struct MailgunProvider {
    config: MailgunConfig,
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl MailgunProvider {
    pub fn new(config: MailgunConfig, http: HttpClient) -> Result<Self, ProviderError> {
        if config.enabled && config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::Configuration(
                "MAILGUN_API_KEY is empty".to_string(),
            ));
        }

        Ok(Self { config, http })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            self.config.domain
        )
    }
}

#[async_trait]
impl EmailProvider for MailgunProvider {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "Mailgun email provider is not enabled".to_string(),
            ));
        }

        let mut form = vec![
            ("from", self.config.from.clone()),
            ("to", email.to.clone()),
            ("subject", email.template.subject().to_string()),
            ("template", email.template.template_name().to_string()),
        ];

        if let Some(variables) = &email.variables {
            let encoded = serde_json::to_string(variables).map_err(|e| {
                ProviderError::SendFailed(format!("Failed to encode template variables: {}", e))
            })?;
            form.push(("h:X-Mailgun-Variables", encoded));
        }

        let request = self
            .http
            .post(&self.messages_url())
            .basic_auth("api", Some(self.config.api_key.expose_secret()))
            .form(&form);

        let response = self
            .http
            .send("mailgun_send", request)
            .await
            .map_err(|e| ProviderError::Connection(format!("Failed to reach Mailgun: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Connection(format!("Failed to read Mailgun response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::SendFailed(format!(
                "Mailgun returned {}: {}",
                status, body
            )));
        }

        let parsed: MailgunResponse = serde_json::from_str(&body).unwrap_or(MailgunResponse {
            id: None,
            message: None,
        });

        tracing::info!(
            to = %email.to,
            template = email.template.template_name(),
            provider_id = parsed.id.as_deref().unwrap_or(""),
            "Email sent successfully"
        );

        Ok(ProviderResponse::success(parsed.id, parsed.message))
    }
}

/// Mock email provider for tests and for running without Mailgun credentials.
pub struct MockEmailProvider {
    enabled: bool,
    fail_sends: bool,
    send_count: AtomicU64,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            fail_sends: false,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every send fails.
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::new(true)
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock email provider is not enabled".to_string(),
            ));
        }

        if self.fail_sends {
            return Err(ProviderError::SendFailed(
                "Mock email provider configured to fail".to_string(),
            ));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }

        tracing::info!(
            to = %email.to,
            template = email.template.template_name(),
            "[MOCK] Email would be sent"
        );

        Ok(ProviderResponse::success(
            Some(format!("mock-email-{}", count)),
            None,
        ))
    }
}
