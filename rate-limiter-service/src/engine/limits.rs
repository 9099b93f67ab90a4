use crate::models::{AppRelays, Application};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of one pass over the day's usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitClassification {
    /// Apps at or over their limit whose first breach is older than the grace period.
    pub passed_limit: Vec<String>,
    /// Apps at or over their limit with no first-surpassed date yet.
    pub first_surpassed: Vec<String>,
}

/// Count at or above a configured limit. Unlimited apps never breach.
fn over_limit(count: i64, daily_limit: i64) -> bool {
    daily_limit > 0 && count >= daily_limit
}

/// The breach has been anchored for at least `grace_period` before `now`.
/// An anchor in the future has not elapsed at all.
fn grace_elapsed(anchor: DateTime<Utc>, now: DateTime<Utc>, grace_period: Duration) -> bool {
    now.signed_duration_since(anchor)
        .to_std()
        .map(|elapsed| elapsed >= grace_period)
        .unwrap_or(false)
}

/// Classifies each usage record against its application's daily limit.
///
/// Only successful relays count. Records with no matching application are
/// treated as unlimited.
pub fn classify(
    relays: &[AppRelays],
    applications: &HashMap<String, Application>,
    now: DateTime<Utc>,
    grace_period: Duration,
) -> LimitClassification {
    let mut result = LimitClassification::default();

    for relay in relays {
        let Some(app) = applications.get(&relay.application) else {
            continue;
        };

        let daily_limit = app.daily_limit();
        let count = relay.count.success;

        if !over_limit(count, daily_limit) {
            continue;
        }

        match app.first_date_surpassed {
            None => {
                tracing::info!(
                    app_id = %app.id,
                    daily_app_limit = daily_limit,
                    count,
                    first_date_surpassed = %now,
                    "app: {} passed first daily limit at: {}",
                    app.id,
                    now.format("%Y-%m-%dT%H:%M:%S")
                );
                result.first_surpassed.push(app.id.clone());
            }
            Some(anchor) if grace_elapsed(anchor, now, grace_period) => {
                tracing::info!(
                    app_id = %app.id,
                    daily_app_limit = daily_limit,
                    count,
                    first_date_surpassed = %anchor,
                    "app: {} passed daily limit with {} of {}",
                    app.id,
                    count,
                    daily_limit
                );
                result.passed_limit.push(app.id.clone());
            }
            Some(anchor) => {
                tracing::debug!(
                    app_id = %app.id,
                    daily_app_limit = daily_limit,
                    count,
                    first_date_surpassed = %anchor,
                    "App over limit but still within grace period"
                );
            }
        }
    }

    result
}
