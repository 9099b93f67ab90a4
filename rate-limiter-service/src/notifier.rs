//! Threshold notifications for applications approaching or past their limit.

use crate::engine::{LimitCache, NotificationThreshold, Snapshot, UsageEntry};
use crate::error::NotifyError;
use crate::services::metrics;
use crate::services::{EmailMessage, EmailProvider, EmailTemplate, IdentityProvider, TemplateData};
use std::fmt;
use std::sync::Arc;

/// An application that reached an enabled tier and whose owner was found.
#[derive(Debug, Clone, PartialEq)]
pub struct AppUsage {
    pub app_id: String,
    pub email: String,
    pub name: String,
    pub limit: i64,
    pub usage: i64,
    pub threshold: NotificationThreshold,
}

impl AppUsage {
    /// Usage as a fraction of the limit with two decimals, e.g. `0.84`.
    pub fn usage_ratio(&self) -> String {
        format!("{:.2}", self.usage as f64 / self.limit as f64)
    }

    fn email_message(&self) -> EmailMessage {
        EmailMessage {
            to: self.email.clone(),
            template: EmailTemplate::NotificationThresholdHit,
            variables: Some(TemplateData {
                app_id: self.app_id.clone(),
                app_name: self.name.clone(),
                usage: self.usage_ratio(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    LookupFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LookupFailed(e) => write!(f, "owner lookup failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UsageReport {
    Notifiable(AppUsage),
    Skipped { app_id: String, reason: SkipReason },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub sent: usize,
    pub skipped: usize,
}

pub struct Notifier {
    cache: Arc<LimitCache>,
    identity: Arc<dyn IdentityProvider>,
    email: Arc<dyn EmailProvider>,
}

impl Notifier {
    pub fn new(
        cache: Arc<LimitCache>,
        identity: Arc<dyn IdentityProvider>,
        email: Arc<dyn EmailProvider>,
    ) -> Self {
        Self {
            cache,
            identity,
            email,
        }
    }

    /// Entries with usage that reached a tier their settings enable.
    pub fn candidates(snapshot: &Snapshot) -> Vec<(&UsageEntry, NotificationThreshold)> {
        snapshot
            .usage
            .iter()
            .filter(|entry| entry.total() > 0)
            .filter_map(|entry| {
                let settings = entry.notification_settings.effective();
                match NotificationThreshold::for_usage(entry.total(), entry.daily_limit, &settings) {
                    NotificationThreshold::None => None,
                    threshold => Some((entry, threshold)),
                }
            })
            .collect()
    }

    /// Resolves the owner of every candidate in the current snapshot.
    ///
    /// A failed lookup skips that application only. Failing to obtain the
    /// management token fails the whole call.
    pub async fn classify(&self) -> Result<Vec<UsageReport>, NotifyError> {
        let snapshot = self.cache.snapshot();
        let candidates = Self::candidates(&snapshot);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let token = self
            .identity
            .management_token()
            .await
            .map_err(NotifyError::Identity)?;

        let mut reports = Vec::with_capacity(candidates.len());
        for (entry, threshold) in candidates {
            match self.identity.user_email(&entry.user_id, &token).await {
                Ok(email) => reports.push(UsageReport::Notifiable(AppUsage {
                    app_id: entry.app_id.clone(),
                    email,
                    name: entry.name.clone(),
                    limit: entry.daily_limit,
                    usage: entry.total(),
                    threshold,
                })),
                Err(e) => {
                    tracing::warn!(
                        app_id = %entry.app_id,
                        user_id = %entry.user_id,
                        error = %e,
                        "Skipping notification"
                    );
                    reports.push(UsageReport::Skipped {
                        app_id: entry.app_id.clone(),
                        reason: SkipReason::LookupFailed(e.to_string()),
                    });
                }
            }
        }

        Ok(reports)
    }

    /// Sends one email per notifiable report, stopping at the first failure.
    pub async fn send_emails(&self, reports: &[UsageReport]) -> Result<usize, NotifyError> {
        let mut sent = 0;

        for report in reports {
            let UsageReport::Notifiable(app) = report else {
                continue;
            };

            if let Err(source) = self.email.send(&app.email_message()).await {
                metrics::record_notification("failed");
                return Err(NotifyError::Dispatch {
                    app_id: app.app_id.clone(),
                    source,
                });
            }

            metrics::record_notification("sent");
            tracing::info!(
                app_id = %app.app_id,
                tier = %app.threshold,
                usage = %app.usage_ratio(),
                "Notification sent"
            );
            sent += 1;
        }

        Ok(sent)
    }

    /// Runs one notification cycle against the latest snapshot.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<NotificationSummary, NotifyError> {
        let reports = self.classify().await?;

        let skipped = reports
            .iter()
            .filter(|r| matches!(r, UsageReport::Skipped { .. }))
            .count();
        for _ in 0..skipped {
            metrics::record_notification("skipped");
        }

        let sent = self.send_emails(&reports).await?;

        let summary = NotificationSummary { sent, skipped };
        tracing::info!(sent = summary.sent, skipped = summary.skipped, "Notification cycle finished");
        Ok(summary)
    }
}
