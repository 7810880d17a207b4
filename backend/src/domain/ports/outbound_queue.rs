//! Port describing the durable, priority-ordered outbound queue.
//!
//! Envelopes drain highest priority first and in enqueue order within one
//! priority. Consumption is at-least-once: a claimed envelope that is never
//! acknowledged becomes claimable again.

use async_trait::async_trait;

use crate::domain::Envelope;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by outbound queue adapters.
    pub enum OutboundQueueError {
        /// Queue infrastructure is unavailable.
        Connection { message: String } =>
            "outbound queue connection failed: {message}",
        /// A queue operation failed during execution.
        Query { message: String } =>
            "outbound queue query failed: {message}",
        /// A stored envelope could not be decoded.
        Poisoned { id: i64, message: String } =>
            "outbound message {id} could not be decoded: {message}",
    }
}

impl OutboundQueueError {
    /// Whether the error means the backing store is unreachable.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// An envelope handed to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedEnvelope {
    /// Queue-assigned id used to acknowledge or release.
    pub id: i64,
    /// The claimed work.
    pub envelope: Envelope,
    /// Number of times the envelope has been claimed, this claim included.
    pub attempts: u32,
}

/// Port for producing to and consuming from the outbound queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutboundQueue: Send + Sync {
    /// Durably store an envelope.
    async fn enqueue(&self, envelope: &Envelope) -> Result<(), OutboundQueueError>;

    /// Claim the next envelope, if any is ready.
    async fn claim_next(&self) -> Result<Option<ClaimedEnvelope>, OutboundQueueError>;

    /// Remove a processed envelope.
    async fn acknowledge(&self, id: i64) -> Result<(), OutboundQueueError>;

    /// Return a claimed envelope to the queue for another attempt.
    async fn release(&self, id: i64) -> Result<(), OutboundQueueError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn connection_errors_are_detected() {
        assert!(OutboundQueueError::connection("reset").is_connection());
        assert!(!OutboundQueueError::poisoned(4_i64, "bad json").is_connection());
    }

    #[rstest]
    fn poisoned_error_names_the_row() {
        let err = OutboundQueueError::poisoned(17_i64, "missing field `type`");
        assert_eq!(
            err.to_string(),
            "outbound message 17 could not be decoded: missing field `type`"
        );
    }
}
