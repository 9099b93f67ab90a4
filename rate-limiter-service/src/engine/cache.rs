use super::limits::classify;
use super::snapshot::{Snapshot, SnapshotStore, UsageEntry};
use crate::error::RefreshError;
use crate::models::{AppRelays, Application};
use crate::services::metrics;
use crate::services::{ApplicationDirectory, UsageMeter};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Owns the refresh cycle and the snapshot it publishes.
pub struct LimitCache {
    directory: Arc<dyn ApplicationDirectory>,
    meter: Arc<dyn UsageMeter>,
    store: SnapshotStore,
    grace_period: Duration,
}

impl LimitCache {
    pub fn new(
        directory: Arc<dyn ApplicationDirectory>,
        meter: Arc<dyn UsageMeter>,
        grace_period: Duration,
    ) -> Self {
        Self {
            directory,
            meter,
            store: SnapshotStore::new(),
            grace_period,
        }
    }

    /// The latest complete snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.load()
    }

    pub fn app_ids_passed_limit(&self) -> Vec<String> {
        self.store.load().app_ids_passed_limit.clone()
    }

    /// Runs one refresh cycle for the current server-local day.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, RefreshError> {
        self.refresh_at(Utc::now(), Local::now().date_naive()).await
    }

    /// Runs one refresh cycle as of `now`, reading usage for `today`.
    ///
    /// Nothing is published unless every upstream call succeeds, so a failed
    /// cycle leaves readers on the previous snapshot.
    #[tracing::instrument(skip(self), fields(grace_period_secs = self.grace_period.as_secs()))]
    pub async fn refresh_at(
        &self,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Arc<Snapshot>, RefreshError> {
        let result = self.build_snapshot(now, today).await;

        match result {
            Ok(snapshot) => {
                metrics::record_refresh("success");
                metrics::record_passed_limit(snapshot.app_ids_passed_limit.len());

                let snapshot = self.store.publish(snapshot);
                tracing::info!(
                    apps_passed_limit = snapshot.app_ids_passed_limit.len(),
                    apps_with_usage = snapshot.usage.len(),
                    "Cache refreshed"
                );
                Ok(snapshot)
            }
            Err(e) => {
                metrics::record_refresh(e.stage());
                Err(e)
            }
        }
    }

    async fn build_snapshot(
        &self,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Snapshot, RefreshError> {
        let applications = self
            .directory
            .fetch_applications()
            .await
            .map_err(RefreshError::Limits)?;

        let relays = self
            .meter
            .fetch_relays(today)
            .await
            .map_err(RefreshError::Relays)?;

        let classification = classify(&relays, &applications, now, self.grace_period);

        self.directory
            .set_first_date_surpassed(&classification.first_surpassed, now)
            .await
            .map_err(RefreshError::Persist)?;
        metrics::record_first_surpassed(classification.first_surpassed.len());

        Ok(Snapshot {
            app_ids_passed_limit: classification.passed_limit,
            usage: join_usage(&relays, &applications),
            refreshed_at: Some(now),
        })
    }
}

/// Pairs each usage record with its application. Records whose public key
/// matches no application are dropped.
fn join_usage(relays: &[AppRelays], applications: &HashMap<String, Application>) -> Vec<UsageEntry> {
    relays
        .iter()
        .filter_map(|relay| {
            let Some(app) = applications.get(&relay.application) else {
                tracing::debug!(
                    public_key = %relay.application,
                    "Usage record has no matching application"
                );
                return None;
            };

            Some(UsageEntry {
                app_id: app.id.clone(),
                user_id: app.user_id.clone(),
                name: app.name.clone(),
                daily_limit: app.daily_limit(),
                notification_settings: app.notification_settings,
                success: relay.count.success,
                failure: relay.count.failure,
            })
        })
        .collect()
}
