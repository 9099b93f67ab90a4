mod common;

use chrono::{TimeDelta, Utc};
use common::{application, relays, TestApp, Upstreams};
use rate_limiter_service::handlers::AppIdsResponse;
use rate_limiter_service::startup::{Application, Collaborators};
use secrecy::SecretString;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn breached_fleet(upstreams: &Upstreams) {
    let now = Utc::now();
    upstreams
        .mount_applications(vec![
            application("breached", 100, Some(now - TimeDelta::days(3))),
            application("fine", 100, None),
        ])
        .await;
    upstreams
        .mount_relays(vec![relays("breached", 200, 0), relays("fine", 10, 0)])
        .await;
}

#[tokio::test]
async fn test_liveness_text() {
    let upstreams = Upstreams::start().await;
    breached_fleet(&upstreams).await;
    let app = TestApp::spawn(upstreams.config()).await;

    let response = reqwest::get(format!("{}/", app.address)).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "Rate Limiter is up and running!");
}

#[tokio::test]
async fn test_app_ids_served_from_initial_refresh() {
    let upstreams = Upstreams::start().await;
    breached_fleet(&upstreams).await;
    let app = TestApp::spawn(upstreams.config()).await;

    let response = reqwest::get(format!("{}/v0/app-ids", app.address))
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: AppIdsResponse = response.json().await.unwrap();
    assert_eq!(body.application_ids, vec!["breached".to_string()]);
}

#[tokio::test]
async fn test_api_key_enforced_except_root() {
    let upstreams = Upstreams::start().await;
    breached_fleet(&upstreams).await;
    let mut config = upstreams.config();
    config.api.keys = vec![SecretString::new("secret-key".to_string())];
    let app = TestApp::spawn(config).await;
    let client = reqwest::Client::new();

    let root = client.get(format!("{}/", app.address)).send().await.unwrap();
    let missing = client
        .get(format!("{}/v0/app-ids", app.address))
        .send()
        .await
        .unwrap();
    let wrong = client
        .get(format!("{}/v0/app-ids", app.address))
        .header("Authorization", "nope")
        .send()
        .await
        .unwrap();
    let valid = client
        .get(format!("{}/v0/app-ids", app.address))
        .header("Authorization", "secret-key")
        .send()
        .await
        .unwrap();

    assert_eq!(root.status().as_u16(), 200);
    assert_eq!(missing.status().as_u16(), 401);
    assert_eq!(wrong.status().as_u16(), 401);
    assert_eq!(valid.status().as_u16(), 200);
}

#[tokio::test]
async fn test_build_fails_when_first_refresh_fails() {
    let upstreams = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/application"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstreams.db)
        .await;

    let config = upstreams.config();
    let collaborators = Collaborators::from_config(&config).unwrap();
    let result = Application::build(config, collaborators).await;

    assert!(result.is_err());
}
