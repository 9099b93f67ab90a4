//! Per-application configuration as served by the directory service.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, rename = "user", deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// `None` until the application first reaches its daily limit.
    #[serde(default, deserialize_with = "deserialize_first_date")]
    pub first_date_surpassed: Option<DateTime<Utc>>,
    #[serde(default, rename = "gatewayAAT", deserialize_with = "null_as_default")]
    pub gateway_aat: GatewayAat,
    #[serde(default, deserialize_with = "null_as_default")]
    pub limits: AppLimits,
    /// `null` when the owner never saved preferences.
    #[serde(default, deserialize_with = "null_as_default")]
    pub notification_settings: NotificationSettings,
}

impl Application {
    /// Zero means no limit is configured.
    pub fn daily_limit(&self) -> i64 {
        self.limits.daily_limit
    }

    pub fn public_key(&self) -> &str {
        &self.gateway_aat.application_public_key
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub application_public_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppLimits {
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub daily_limit: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub signed_up: bool,
    pub quarter: bool,
    pub half: bool,
    pub three_quarters: bool,
    pub full: bool,
}

impl NotificationSettings {
    /// Settings applied to applications that never saved any preferences.
    pub const DEFAULT_ENABLED: NotificationSettings = NotificationSettings {
        signed_up: true,
        quarter: false,
        half: false,
        three_quarters: true,
        full: true,
    };

    /// All flags off is indistinguishable from "never configured", so it
    /// falls back to [`Self::DEFAULT_ENABLED`].
    pub fn effective(self) -> NotificationSettings {
        if self == NotificationSettings::default() {
            NotificationSettings::DEFAULT_ENABLED
        } else {
            self
        }
    }
}

/// Body of the first-date-surpassed write-back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstDateSurpassedUpdate {
    #[serde(rename = "firstDateSurpassed")]
    pub first_date_surpassed: DateTime<Utc>,
    #[serde(rename = "applicationIDs")]
    pub application_ids: Vec<String>,
}

/// Reads an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// The directory encodes "never" as null, an absent field, or the zero
// timestamp 0001-01-01T00:00:00Z.
fn deserialize_first_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let date = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(date.filter(|d| d.year() > 1))
}
