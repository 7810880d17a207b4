//! Prometheus adapter for bot activity metrics.
//!
//! Counters are registered with a caller-provided registry, normally the one
//! the ops server exposes on `/metrics`.

use async_trait::async_trait;
use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::ports::{
    BotMetrics, BotMetricsError, DeliveryStatus, DispatchStatus, ListingEvent,
};
use crate::domain::{ContactRequestOutcome, Direction, FanoutKind, MenuState};

/// Prometheus-backed bot metrics recorder.
///
/// # Metric Specification
///
/// | name | labels |
/// |---|---|
/// | `librecash_new_users_total` | `language` |
/// | `librecash_commands_total` | `command` |
/// | `librecash_menu_transitions_total` | `from`, `to` |
/// | `librecash_listings_total` | `event`, `direction` |
/// | `librecash_contact_requests_total` | `outcome` |
/// | `librecash_fanout_messages_total` | `kind`, `status` |
/// | `librecash_transport_messages_total` | `message_type`, `status`, `error_code` |
pub struct PrometheusBotMetrics {
    new_users: IntCounterVec,
    commands: IntCounterVec,
    menu_transitions: IntCounterVec,
    listings: IntCounterVec,
    contact_requests: IntCounterVec,
    fanout_messages: IntCounterVec,
    transport_messages: IntCounterVec,
}

fn counter(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec, prometheus::Error> {
    let vec = IntCounterVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

impl PrometheusBotMetrics {
    /// Create and register every counter with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if a counter with the same name is already
    /// registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            new_users: counter(
                registry,
                "librecash_new_users_total",
                "Users seen for the first time",
                &["language"],
            )?,
            commands: counter(
                registry,
                "librecash_commands_total",
                "Global commands received",
                &["command"],
            )?,
            menu_transitions: counter(
                registry,
                "librecash_menu_transitions_total",
                "Dialogue state changes",
                &["from", "to"],
            )?,
            listings: counter(
                registry,
                "librecash_listings_total",
                "Listing lifecycle events",
                &["event", "direction"],
            )?,
            contact_requests: counter(
                registry,
                "librecash_contact_requests_total",
                "Contact requests by outcome",
                &["outcome"],
            )?,
            fanout_messages: counter(
                registry,
                "librecash_fanout_messages_total",
                "Fanout notifications handed to the outbound queue",
                &["kind", "status"],
            )?,
            transport_messages: counter(
                registry,
                "librecash_transport_messages_total",
                "Transport calls made by the delivery worker",
                &["message_type", "status", "error_code"],
            )?,
        })
    }
}

#[async_trait]
impl BotMetrics for PrometheusBotMetrics {
    async fn record_new_user(&self, language: &str) -> Result<(), BotMetricsError> {
        self.new_users.with_label_values(&[language]).inc();
        Ok(())
    }

    async fn record_command(&self, command: &str) -> Result<(), BotMetricsError> {
        self.commands.with_label_values(&[command]).inc();
        Ok(())
    }

    async fn record_menu_transition(
        &self,
        from: MenuState,
        to: MenuState,
    ) -> Result<(), BotMetricsError> {
        self.menu_transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
        Ok(())
    }

    async fn record_listing(
        &self,
        event: ListingEvent,
        direction: Direction,
    ) -> Result<(), BotMetricsError> {
        self.listings
            .with_label_values(&[event.as_str(), direction.as_str()])
            .inc();
        Ok(())
    }

    async fn record_contact_request(
        &self,
        outcome: ContactRequestOutcome,
    ) -> Result<(), BotMetricsError> {
        self.contact_requests
            .with_label_values(&[outcome.as_str()])
            .inc();
        Ok(())
    }

    async fn record_fanout_message(
        &self,
        kind: FanoutKind,
        status: DispatchStatus,
    ) -> Result<(), BotMetricsError> {
        self.fanout_messages
            .with_label_values(&[kind.as_str(), status.as_str()])
            .inc();
        Ok(())
    }

    async fn record_transport_message(
        &self,
        message_type: &str,
        status: DeliveryStatus,
        error_code: u16,
    ) -> Result<(), BotMetricsError> {
        let code = error_code.to_string();
        self.transport_messages
            .with_label_values(&[message_type, status.as_str(), code.as_str()])
            .inc();
        Ok(())
    }
}
