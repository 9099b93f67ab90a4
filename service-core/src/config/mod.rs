//! Environment-driven settings shared by every service binary.

use crate::error::AppError;
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 8080;

/// Settings common to all services. Loaded from an optional `configuration`
/// file and `APP__`-prefixed environment variables, after `.env`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "Config::default_port")]
    pub port: u16,
}

impl Config {
    fn default_port() -> u16 {
        DEFAULT_PORT
    }

    pub fn load() -> Result<Self, AppError> {
        // A missing .env file is normal outside local development.
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize().map_err(AppError::from)
    }
}

/// Reads `key`, falling back to `default` outside production. In production
/// every key must be set explicitly.
pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    if let Ok(value) = env::var(key) {
        return Ok(value);
    }

    match (is_prod, default) {
        (false, Some(default)) => Ok(default.to_string()),
        (true, _) => Err(missing(key, " in production")),
        (false, None) => Err(missing(key, "")),
    }
}

/// Like [`get_env`] but parses the value, reporting the key on failure.
pub fn get_env_parsed<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = get_env(key, Some(default), is_prod)?;
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value {:?}: {}", key, raw, e))
    })
}

/// `ENVIRONMENT=prod` turns on strict lookups.
pub fn is_prod() -> bool {
    env::var("ENVIRONMENT").is_ok_and(|e| e == "prod")
}

fn missing(key: &str, context: &str) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("{} is required{} but not set", key, context))
}
