//! LibreCash bot library.
//!
//! Hexagonal layout: [`domain`] holds the dialogue state machine, fanout and
//! delivery services behind port traits; [`outbound`] implements those ports
//! (PostgreSQL, in-memory, Telegram, Prometheus); [`inbound`] drives the
//! domain from Telegram updates and exposes the ops endpoints. [`reporting`]
//! forwards errors to a Sentry-compatible collector.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod reporting;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
