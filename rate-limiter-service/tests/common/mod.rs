#![allow(dead_code)]

use chrono::{DateTime, Local, Utc};
use rate_limiter_service::config::{
    ApiConfig, Auth0Config, HttpConfig, LimiterConfig, LimitsConfig, MailgunConfig,
    ObservabilityConfig, SchedulerConfig, UpstreamConfig,
};
use rate_limiter_service::services::meter::zero_time;
use rate_limiter_service::startup::{Application, Collaborators};
use secrecy::SecretString;
use serde_json::{json, Value};
use service_core::config::Config;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DB_API_KEY: &str = "db-key";
pub const MAILGUN_DOMAIN: &str = "mg.example.com";
pub const MAILGUN_KEY: &str = "key-test";

/// One fake server per upstream the service calls.
pub struct Upstreams {
    pub db: MockServer,
    pub meter: MockServer,
    pub auth0: MockServer,
    pub mailgun: MockServer,
}

impl Upstreams {
    pub async fn start() -> Self {
        Self {
            db: MockServer::start().await,
            meter: MockServer::start().await,
            auth0: MockServer::start().await,
            mailgun: MockServer::start().await,
        }
    }

    pub fn config(&self) -> LimiterConfig {
        LimiterConfig {
            common: Config { port: 0 },
            scheduler: SchedulerConfig {
                refresh_interval: Duration::from_secs(600),
                notifier_interval: Duration::from_secs(3600),
                notifier_enabled: false,
            },
            http: HttpConfig {
                retries: 0,
                timeout: Duration::from_secs(5),
            },
            limits: LimitsConfig {
                grace_period: Duration::from_secs(48 * 60 * 60),
            },
            upstream: UpstreamConfig {
                http_db_url: self.db.uri(),
                http_db_api_key: SecretString::new(DB_API_KEY.to_string()),
                relay_meter_url: self.meter.uri(),
            },
            auth0: Auth0Config {
                domain: self.auth0.uri(),
                client_id: "client-id".to_string(),
                client_secret: SecretString::new("client-secret".to_string()),
            },
            mailgun: MailgunConfig {
                enabled: true,
                api_key: SecretString::new(MAILGUN_KEY.to_string()),
                domain: MAILGUN_DOMAIN.to_string(),
                api_base: self.mailgun.uri(),
                from: "Usage Alerts <alerts@mg.example.com>".to_string(),
            },
            api: ApiConfig::default(),
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                otlp_endpoint: None,
            },
        }
    }

    pub async fn mount_applications(&self, apps: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/application"))
            .and(header("Authorization", DB_API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(apps)))
            .mount(&self.db)
            .await;
    }

    /// Serves `relays` for today's meter window only.
    pub async fn mount_relays(&self, relays: Vec<Value>) {
        let today = zero_time(Local::now().date_naive());
        Mock::given(method("GET"))
            .and(path("/v0/relays/apps"))
            .and(query_param("from", today.as_str()))
            .and(query_param("to", today.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(relays)))
            .mount(&self.meter)
            .await;
    }

    pub async fn mount_first_date_surpassed(&self, status: u16, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/application/first_date_surpassed"))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_calls)
            .mount(&self.db)
            .await;
    }

    pub async fn mount_auth0_token(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "access_token": "management-token",
                "token_type": "Bearer"
            })))
            .mount(&self.auth0)
            .await;
    }

    pub async fn mount_auth0_user(&self, user_id: &str, email: Option<&str>) {
        let users = match email {
            Some(email) => json!([{ "email": email }]),
            None => json!([]),
        };
        Mock::given(method("GET"))
            .and(path("/api/v2/users"))
            .and(query_param("q", format!("user_id:*{}", user_id).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(users))
            .mount(&self.auth0)
            .await;
    }

    pub async fn mount_mailgun(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/{}/messages", MAILGUN_DOMAIN)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "<queued@mg.example.com>",
                "message": "Queued. Thank you."
            })))
            .expect(expected_calls)
            .mount(&self.mailgun)
            .await;
    }
}

pub fn application(id: &str, limit: i64, first_date_surpassed: Option<DateTime<Utc>>) -> Value {
    json!({
        "id": id,
        "user": format!("user-{}", id),
        "name": format!("App {}", id),
        "firstDateSurpassed": first_date_surpassed
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "0001-01-01T00:00:00Z".to_string()),
        "gatewayAAT": { "applicationPublicKey": public_key(id) },
        "limits": { "planType": "PAY_AS_YOU_GO", "dailyLimit": limit },
        "notificationSettings": {
            "signedUp": true, "quarter": false, "half": false, "threeQuarters": true, "full": true
        }
    })
}

pub fn relays(id: &str, success: i64, failure: i64) -> Value {
    let today = zero_time(Local::now().date_naive());
    json!({
        "Count": { "Success": success, "Failure": failure },
        "From": today,
        "To": today,
        "Application": public_key(id)
    })
}

pub fn public_key(id: &str) -> String {
    format!("pk-{}", id)
}

/// A running server on a random port.
pub struct TestApp {
    pub address: String,
    pub shutdown: CancellationToken,
}

impl TestApp {
    pub async fn spawn(config: LimiterConfig) -> Self {
        let collaborators = Collaborators::from_config(&config).expect("collaborators");
        let app = Application::build(config, collaborators)
            .await
            .expect("Failed to build application");

        let address = format!("http://127.0.0.1:{}", app.port());
        let shutdown = app.shutdown_token();
        tokio::spawn(app.run_until_stopped());

        Self { address, shutdown }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
