use crate::models::NotificationSettings;
use serde::Serialize;
use std::fmt;

/// Highest enabled notification tier reached by an app's usage.
///
/// Ordered, so `Full > ThreeQuarters > Half > Quarter > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationThreshold {
    None = 0,
    Quarter = 1,
    Half = 2,
    ThreeQuarters = 3,
    Full = 4,
}

impl NotificationThreshold {
    /// Walks the tiers from `Full` down and returns the first one that is
    /// both enabled and reached. A limit of zero never notifies.
    pub fn for_usage(usage: i64, limit: i64, settings: &NotificationSettings) -> Self {
        if limit <= 0 {
            return NotificationThreshold::None;
        }

        let (usage, limit) = (usage as f64, limit as f64);

        if settings.full && usage >= limit {
            NotificationThreshold::Full
        } else if settings.three_quarters && usage >= limit * 0.75 {
            NotificationThreshold::ThreeQuarters
        } else if settings.half && usage >= limit * 0.5 {
            NotificationThreshold::Half
        } else if settings.quarter && usage >= limit * 0.25 {
            NotificationThreshold::Quarter
        } else {
            NotificationThreshold::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationThreshold::None => "none",
            NotificationThreshold::Quarter => "quarter",
            NotificationThreshold::Half => "half",
            NotificationThreshold::ThreeQuarters => "three_quarters",
            NotificationThreshold::Full => "full",
        }
    }
}

impl fmt::Display for NotificationThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
