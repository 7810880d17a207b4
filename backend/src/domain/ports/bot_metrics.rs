//! Domain port surface for recording bot activity metrics.
//!
//! Implementations may export to Prometheus or discard everything. Metric
//! failures never change control flow; callers log and carry on.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{ContactRequestOutcome, Direction, FanoutKind, MenuState};

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording bot metrics.
    pub enum BotMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "bot metrics exporter failed: {message}",
    }
}

/// Listing lifecycle events worth counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingEvent {
    /// Direction chosen.
    Initiated,
    /// Amount chosen and broadcast.
    Posted,
    /// Abandoned before posting.
    Canceled,
    /// Retracted by its owner.
    Deleted,
}

impl ListingEvent {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Posted => "posted",
            Self::Canceled => "canceled",
            Self::Deleted => "deleted",
        }
    }
}

/// Whether a fanout notification reached the outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Enqueued for delivery.
    Queued,
    /// Enqueue failed.
    Failed,
}

impl DispatchStatus {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of a transport call made by the delivery worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The platform accepted the call.
    Sent,
    /// The platform or network rejected the call.
    Failed,
}

impl DeliveryStatus {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// Metrics recording port for bot activity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotMetrics: Send + Sync {
    /// A user was seen for the first time.
    async fn record_new_user(&self, language: &str) -> Result<(), BotMetricsError>;

    /// A global command was received.
    async fn record_command(&self, command: &str) -> Result<(), BotMetricsError>;

    /// A user moved between dialogue states.
    async fn record_menu_transition(
        &self,
        from: MenuState,
        to: MenuState,
    ) -> Result<(), BotMetricsError>;

    /// A listing changed lifecycle stage.
    async fn record_listing(
        &self,
        event: ListingEvent,
        direction: Direction,
    ) -> Result<(), BotMetricsError>;

    /// A contact request was processed.
    async fn record_contact_request(
        &self,
        outcome: ContactRequestOutcome,
    ) -> Result<(), BotMetricsError>;

    /// A fanout notification was handed to the outbound queue.
    async fn record_fanout_message(
        &self,
        kind: FanoutKind,
        status: DispatchStatus,
    ) -> Result<(), BotMetricsError>;

    /// The delivery worker performed a transport call.
    async fn record_transport_message(
        &self,
        message_type: &str,
        status: DeliveryStatus,
        error_code: u16,
    ) -> Result<(), BotMetricsError>;
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpBotMetrics;

#[async_trait]
impl BotMetrics for NoOpBotMetrics {
    async fn record_new_user(&self, _language: &str) -> Result<(), BotMetricsError> {
        Ok(())
    }

    async fn record_command(&self, _command: &str) -> Result<(), BotMetricsError> {
        Ok(())
    }

    async fn record_menu_transition(
        &self,
        _from: MenuState,
        _to: MenuState,
    ) -> Result<(), BotMetricsError> {
        Ok(())
    }

    async fn record_listing(
        &self,
        _event: ListingEvent,
        _direction: Direction,
    ) -> Result<(), BotMetricsError> {
        Ok(())
    }

    async fn record_contact_request(
        &self,
        _outcome: ContactRequestOutcome,
    ) -> Result<(), BotMetricsError> {
        Ok(())
    }

    async fn record_fanout_message(
        &self,
        _kind: FanoutKind,
        _status: DispatchStatus,
    ) -> Result<(), BotMetricsError> {
        Ok(())
    }

    async fn record_transport_message(
        &self,
        _message_type: &str,
        _status: DeliveryStatus,
        _error_code: u16,
    ) -> Result<(), BotMetricsError> {
        Ok(())
    }
}

/// Log a failed metrics write without interrupting the caller.
pub fn log_metrics_failure(result: Result<(), BotMetricsError>) {
    if let Err(error) = result {
        warn!(error = %error, "failed to record bot metric");
    }
}

#[cfg(test)]
mod tests {
    //! Ensures NoOpBotMetrics accepts every event.
    use super::*;

    #[tokio::test]
    async fn noop_accepts_every_event() {
        let metrics = NoOpBotMetrics;
        assert!(metrics.record_new_user("en").await.is_ok());
        assert!(metrics.record_command("start").await.is_ok());
        assert!(
            metrics
                .record_menu_transition(MenuState::Init, MenuState::SelectRadius)
                .await
                .is_ok()
        );
        assert!(
            metrics
                .record_listing(ListingEvent::Posted, Direction::CashToCrypto)
                .await
                .is_ok()
        );
        assert!(
            metrics
                .record_contact_request(ContactRequestOutcome::Created)
                .await
                .is_ok()
        );
        assert!(
            metrics
                .record_fanout_message(FanoutKind::Live, DispatchStatus::Queued)
                .await
                .is_ok()
        );
        assert!(
            metrics
                .record_transport_message("message", DeliveryStatus::Failed, 403)
                .await
                .is_ok()
        );
    }

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(ListingEvent::Deleted.as_str(), "deleted");
        assert_eq!(DispatchStatus::Queued.as_str(), "queued");
        assert_eq!(DeliveryStatus::Sent.as_str(), "sent");
    }
}
