pub mod application;
pub mod usage;

pub use application::{
    AppLimits, Application, FirstDateSurpassedUpdate, GatewayAat, NotificationSettings,
};
pub use usage::{AppRelays, RelayCounts};
