//! Daily relay counts as served by the metering service.

use super::application::null_as_default;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RelayCounts {
    pub success: i64,
    pub failure: i64,
}

/// One application's counts over `[from, to)`. `application` is the
/// application's public key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppRelays {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: RelayCounts,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub application: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_meter_record() {
        let record: AppRelays = serde_json::from_value(json!({
            "Count": { "Success": 1200, "Failure": 30 },
            "From": "2022-07-01T00:00:00Z",
            "To": "2022-07-02T00:00:00Z",
            "Application": "pk-1"
        }))
        .unwrap();

        assert_eq!(record.application, "pk-1");
        assert_eq!(record.count.success, 1200);
        assert_eq!(record.count.failure, 30);
    }

    #[test]
    fn test_null_count_reads_as_zero() {
        let record: AppRelays = serde_json::from_value(json!({
            "Count": null,
            "From": "2022-07-01T00:00:00Z",
            "To": "2022-07-02T00:00:00Z",
            "Application": "pk-1"
        }))
        .unwrap();

        assert_eq!(record.count, RelayCounts::default());
    }
}
