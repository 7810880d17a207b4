//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories and the durable queue
//!   using Diesel
//! - **memory**: in-process repositories and queue for tests and local runs
//! - **telegram**: Bot API chat transport over reqwest
//! - **locales**: catalog loading from the locales directory
//! - **metrics**: Prometheus-backed bot metrics (feature-gated)
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod locales;
pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
pub mod telegram;
