//! Inbound adapters that translate external input into domain calls.
//!
//! [`telegram`] long-polls the Bot API and feeds the session engine; [`ops`]
//! serves health probes and metrics for orchestration.

pub mod ops;
pub mod telegram;
