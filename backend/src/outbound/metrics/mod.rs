//! Outbound adapters for metrics exporting.
//!
//! Prometheus-backed implementation of the bot metrics port, compiled only
//! with the `metrics` feature.

mod prometheus_bot;

pub use prometheus_bot::PrometheusBotMetrics;
