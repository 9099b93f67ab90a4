use secrecy::SecretString;
use service_core::config::{self as core_config, get_env, get_env_parsed};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LimiterConfig {
    pub common: core_config::Config,
    pub scheduler: SchedulerConfig,
    pub http: HttpConfig,
    pub limits: LimitsConfig,
    pub upstream: UpstreamConfig,
    pub auth0: Auth0Config,
    pub mailgun: MailgunConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub refresh_interval: Duration,
    pub notifier_interval: Duration,
    pub notifier_enabled: bool,
}

/// Transport settings for every outbound call.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub retries: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// How long a breach must persist, from its first-surpassed date, before it is reported.
    pub grace_period: Duration,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub http_db_url: String,
    pub http_db_api_key: SecretString,
    pub relay_meter_url: String,
}

#[derive(Debug, Clone)]
pub struct Auth0Config {
    pub domain: String,
    pub client_id: String,
    pub client_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub enabled: bool,
    pub api_key: SecretString,
    pub domain: String,
    pub api_base: String,
    pub from: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    /// Empty means the API-key check is off.
    pub keys: Vec<SecretString>,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl LimiterConfig {
    pub fn load() -> Result<Self, AppError> {
        let mut common = core_config::Config::load()?;
        let is_prod = core_config::is_prod();

        // PORT wins over APP__PORT so the service runs unchanged on platforms that inject it.
        common.port = get_env_parsed("PORT", &common.port.to_string(), false)?;

        let refresh_minutes: u64 = get_env_parsed("CACHE_REFRESH", "10", is_prod)?;
        let notifier_minutes: u64 = get_env_parsed("NOTIFIER_INTERVAL", "60", is_prod)?;
        let timeout_secs: u64 = get_env_parsed("HTTP_TIMEOUT", "5", is_prod)?;
        let grace_hours: u64 = get_env_parsed("GRACE_PERIOD", "48", is_prod)?;

        let config = LimiterConfig {
            common,
            scheduler: SchedulerConfig {
                refresh_interval: scaled("CACHE_REFRESH", refresh_minutes, SECS_PER_MINUTE)?,
                notifier_interval: scaled("NOTIFIER_INTERVAL", notifier_minutes, SECS_PER_MINUTE)?,
                notifier_enabled: env_flag("NOTIFIER_ENABLED", false)?,
            },
            http: HttpConfig {
                retries: get_env_parsed("HTTP_RETRIES", "0", is_prod)?,
                timeout: Duration::from_secs(timeout_secs),
            },
            limits: LimitsConfig {
                grace_period: scaled("GRACE_PERIOD", grace_hours, SECS_PER_HOUR)?,
            },
            upstream: UpstreamConfig {
                http_db_url: get_env("HTTP_DB_URL", Some("https://test-db.com"), is_prod)?,
                http_db_api_key: secret(get_env("HTTP_DB_API_KEY", Some(""), is_prod)?),
                relay_meter_url: get_env("RELAY_METER_URL", Some("https://test-meter.com"), is_prod)?,
            },
            auth0: Auth0Config {
                domain: get_env("AUTH0_DOMAIN", Some("https://test-auth0.com"), is_prod)?,
                client_id: get_env("AUTH0_CLIENT_ID", Some(""), is_prod)?,
                client_secret: secret(get_env("AUTH0_CLIENT_SECRET", Some(""), is_prod)?),
            },
            mailgun: MailgunConfig {
                enabled: env_flag("MAILGUN_ENABLED", false)?,
                api_key: secret(get_env("MAILGUN_API_KEY", Some(""), is_prod)?),
                domain: get_env("MAILGUN_DOMAIN", Some("mg.example.com"), is_prod)?,
                api_base: get_env("MAILGUN_API_BASE", Some("https://api.mailgun.net/v3"), false)?,
                from: get_env(
                    "MAILGUN_FROM",
                    Some("Usage Alerts <alerts@mg.example.com>"),
                    is_prod,
                )?,
            },
            api: ApiConfig {
                keys: parse_api_keys(&env::var("API_KEYS").unwrap_or_default()),
            },
            observability: ObservabilityConfig {
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.scheduler.refresh_interval.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CACHE_REFRESH must be at least one minute"
            )));
        }
        if self.scheduler.notifier_enabled && self.scheduler.notifier_interval.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "NOTIFIER_INTERVAL must be at least one minute"
            )));
        }
        if self.http.timeout.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "HTTP_TIMEOUT must be at least one second"
            )));
        }
        Ok(())
    }
}

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * 60;

/// `value` units of `unit_secs` each. Values too large to represent are rejected.
fn scaled(key: &str, value: u64, unit_secs: u64) -> Result<Duration, AppError> {
    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| AppError::ConfigError(anyhow::anyhow!("{} is too large: {}", key, value)))
}

fn secret(value: String) -> SecretString {
    SecretString::new(value)
}

fn env_flag(key: &str, default: bool) -> Result<bool, AppError> {
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} must be true or false, got {:?}", key, val))
        }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_api_keys(raw: &str) -> Vec<SecretString> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| SecretString::new(k.to_string()))
        .collect()
}
