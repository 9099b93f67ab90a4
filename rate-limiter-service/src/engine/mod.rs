//! The usage-threshold engine: joins limits with usage, classifies hard-limit
//! breaches and notification tiers, and publishes the result.

pub mod cache;
pub mod limits;
pub mod snapshot;
pub mod tiers;

pub use cache::LimitCache;
pub use limits::{LimitClassification, classify};
pub use snapshot::{Snapshot, SnapshotStore, UsageEntry};
pub use tiers::NotificationThreshold;
