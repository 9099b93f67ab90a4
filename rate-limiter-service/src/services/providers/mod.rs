pub mod email;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

pub use email::{MailgunProvider, MockEmailProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider_id: Option<String>,
    pub message: Option<String>,
}

impl ProviderResponse {
    pub fn success(provider_id: Option<String>, message: Option<String>) -> Self {
        Self {
            provider_id,
            message,
        }
    }
}

/// The templates this service is allowed to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    NotificationChange,
    NotificationSignup,
    NotificationThresholdHit,
    PasswordReset,
    SignUp,
    Unstake,
    FeedBack,
}

impl EmailTemplate {
    /// Name of the stored template at the email provider.
    pub fn template_name(&self) -> &'static str {
        match self {
            EmailTemplate::NotificationChange => "usage-notifications-changed",
            EmailTemplate::NotificationSignup => "usage-notifications-signup",
            EmailTemplate::NotificationThresholdHit => "usage-notifications-threshold-hit",
            EmailTemplate::PasswordReset => "account-password-reset",
            EmailTemplate::SignUp => "account-signup",
            EmailTemplate::Unstake => "application-unstake-notification",
            EmailTemplate::FeedBack => "feedback-box",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::NotificationChange => "Usage Alerts: Notification settings",
            EmailTemplate::NotificationSignup => "Usage Alerts: You've signed up for notifications",
            EmailTemplate::NotificationThresholdHit => "Usage Alerts: Endpoint Notification",
            EmailTemplate::PasswordReset => "Usage Alerts: Reset your password",
            EmailTemplate::SignUp => "Usage Alerts: Sign up",
            EmailTemplate::Unstake => "Usage Alerts: Unstake Notification",
            EmailTemplate::FeedBack => "Usage Alerts: Feedback Box",
        }
    }
}

impl FromStr for EmailTemplate {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotificationChange" => Ok(EmailTemplate::NotificationChange),
            "NotificationSignup" => Ok(EmailTemplate::NotificationSignup),
            "NotificationThresholdHit" => Ok(EmailTemplate::NotificationThresholdHit),
            "PasswordReset" => Ok(EmailTemplate::PasswordReset),
            "SignUp" => Ok(EmailTemplate::SignUp),
            "Unstake" => Ok(EmailTemplate::Unstake),
            "FeedBack" => Ok(EmailTemplate::FeedBack),
            other => Err(ProviderError::Configuration(format!(
                "Template {} is not whitelisted",
                other
            ))),
        }
    }
}

/// Variables substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateData {
    pub app_id: String,
    pub app_name: String,
    pub usage: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub template: EmailTemplate,
    pub variables: Option<TemplateData>,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<ProviderResponse, ProviderError>;
}
