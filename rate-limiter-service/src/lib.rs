//! Rate Limiter Service - daily relay limits and usage notifications for metered applications.

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod scheduler;
pub mod services;
pub mod startup;
