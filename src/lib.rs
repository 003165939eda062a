//! GridWatch - log-derived metrics pipeline for a grid trading bot
//!
//! Ingests the bot's raw log stream and serves the time-indexed metrics and
//! categorical counts its dashboard panels poll for: uptime since the last
//! restart, error counts per time bucket, account value series, order status
//! distribution, and raw-line replay for the log-viewer panels.

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod metrics;
pub mod pipeline;
pub mod query;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{ParseError, PipelineError};
pub use events::{LogEvent, LogLevel, OrderStatus, Signal, SignalKind};
pub use pipeline::MetricsPipeline;
pub use query::QueryEngine;

#[cfg(test)]
mod query_tests;
