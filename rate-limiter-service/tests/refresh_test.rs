mod common;

use chrono::{TimeDelta, Utc};
use common::{application, relays, Upstreams};
use rate_limiter_service::engine::LimitCache;
use rate_limiter_service::engine::NotificationThreshold;
use rate_limiter_service::error::{ClientError, RefreshError, Upstream};
use rate_limiter_service::models::NotificationSettings;
use rate_limiter_service::notifier::Notifier;
use rate_limiter_service::startup::Collaborators;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn cache_for(upstreams: &Upstreams) -> LimitCache {
    let config = upstreams.config();
    let collaborators = Collaborators::from_config(&config).unwrap();
    LimitCache::new(
        collaborators.directory,
        collaborators.meter,
        config.limits.grace_period,
    )
}

#[tokio::test]
async fn test_refresh_reports_apps_past_grace_period() {
    let upstreams = Upstreams::start().await;
    let now = Utc::now();
    upstreams
        .mount_applications(vec![
            application("breached", 100, Some(now - TimeDelta::days(3))),
            application("recent", 100, Some(now - TimeDelta::hours(2))),
            application("unlimited", 0, None),
            application("under", 100, Some(now - TimeDelta::days(3))),
        ])
        .await;
    upstreams
        .mount_relays(vec![
            relays("breached", 150, 3),
            relays("recent", 100, 0),
            relays("unlimited", 1_000_000, 0),
            relays("under", 99, 50),
        ])
        .await;
    upstreams.mount_first_date_surpassed(200, 0).await;

    let cache = cache_for(&upstreams);
    let snapshot = cache.refresh().await.unwrap();

    assert_eq!(snapshot.app_ids_passed_limit, vec!["breached".to_string()]);
    assert_eq!(snapshot.usage.len(), 4);
    assert_eq!(cache.app_ids_passed_limit(), vec!["breached".to_string()]);
}

#[tokio::test]
async fn test_first_crossing_is_persisted_but_not_reported() {
    let upstreams = Upstreams::start().await;
    upstreams
        .mount_applications(vec![application("fresh", 100, None)])
        .await;
    upstreams.mount_relays(vec![relays("fresh", 100, 0)]).await;

    Mock::given(method("POST"))
        .and(path("/application/first_date_surpassed"))
        .and(body_partial_json(json!({ "applicationIDs": ["fresh"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstreams.db)
        .await;

    let cache = cache_for(&upstreams);
    let snapshot = cache.refresh().await.unwrap();

    assert!(snapshot.app_ids_passed_limit.is_empty());
}

#[tokio::test]
async fn test_limits_failure_leaves_snapshot_empty() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/application"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstreams.db)
        .await;

    let cache = cache_for(&upstreams);
    let err = cache.refresh().await.unwrap_err();

    assert_eq!(err.stage(), "limits");
    assert!(matches!(
        err.client_error(),
        ClientError::UnexpectedStatus(Upstream::Limits, StatusCode::INTERNAL_SERVER_ERROR)
    ));
    assert!(cache.snapshot().refreshed_at.is_none());
}

#[tokio::test]
async fn test_relays_failure_keeps_previous_snapshot() {
    let upstreams = Upstreams::start().await;
    let now = Utc::now();
    upstreams
        .mount_applications(vec![application("breached", 10, Some(now - TimeDelta::days(5)))])
        .await;

    // Serve usage once, then fail.
    Mock::given(method("GET"))
        .and(path("/v0/relays/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([relays("breached", 20, 0)])))
        .up_to_n_times(1)
        .mount(&upstreams.meter)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/relays/apps"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstreams.meter)
        .await;

    let cache = cache_for(&upstreams);
    let first = cache.refresh().await.unwrap();
    let err = cache.refresh().await.unwrap_err();

    assert!(matches!(err, RefreshError::Relays(_)));
    assert_eq!(cache.snapshot(), first);
    assert_eq!(cache.app_ids_passed_limit(), vec!["breached".to_string()]);
}

#[tokio::test]
async fn test_persist_failure_publishes_nothing() {
    let upstreams = Upstreams::start().await;
    upstreams
        .mount_applications(vec![application("fresh", 100, None)])
        .await;
    upstreams.mount_relays(vec![relays("fresh", 500, 0)]).await;
    upstreams.mount_first_date_surpassed(500, 1).await;

    let cache = cache_for(&upstreams);
    let err = cache.refresh().await.unwrap_err();

    assert_eq!(err.stage(), "persist");
    assert!(matches!(
        err.client_error(),
        ClientError::UnexpectedStatus(Upstream::DateSurpassed, _)
    ));
    assert!(cache.snapshot().refreshed_at.is_none());
}

#[tokio::test]
async fn test_malformed_usage_is_a_decode_error() {
    let upstreams = Upstreams::start().await;
    upstreams
        .mount_applications(vec![application("a", 100, None)])
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/relays/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&upstreams.meter)
        .await;

    let cache = cache_for(&upstreams);
    let err = cache.refresh().await.unwrap_err();

    assert!(matches!(err, RefreshError::Relays(ClientError::Decode(_))));
}

#[tokio::test]
async fn test_null_fields_in_one_record_do_not_abort_refresh() {
    let upstreams = Upstreams::start().await;
    let now = Utc::now();
    let mut sparse = application("sparse", 100, Some(now - TimeDelta::days(3)));
    sparse["name"] = serde_json::Value::Null;
    sparse["notificationSettings"] = serde_json::Value::Null;
    upstreams
        .mount_applications(vec![sparse, application("other", 100, None)])
        .await;
    upstreams
        .mount_relays(vec![relays("sparse", 150, 0), relays("other", 80, 0)])
        .await;
    upstreams.mount_first_date_surpassed(200, 0).await;

    let cache = cache_for(&upstreams);
    let snapshot = cache.refresh().await.unwrap();

    assert_eq!(snapshot.app_ids_passed_limit, vec!["sparse".to_string()]);
    let entry = &snapshot.usage[0];
    assert_eq!(entry.app_id, "sparse");
    assert_eq!(entry.notification_settings, NotificationSettings::default());

    let candidates = Notifier::candidates(&snapshot);
    let sparse_tier = candidates
        .iter()
        .find(|(e, _)| e.app_id == "sparse")
        .map(|(_, tier)| *tier);
    assert_eq!(sparse_tier, Some(NotificationThreshold::Full));
}
