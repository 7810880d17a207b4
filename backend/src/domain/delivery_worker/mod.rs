//! Rate-limited drain of the outbound queue into the chat transport.
//!
//! The worker is the only caller of [`ChatTransport`]. It claims one envelope
//! per tick, performs the operation, records transport metrics and, for
//! listing notifications, the delivery timeline. Every claimed envelope is
//! acknowledged whether or not the platform accepted it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    BotMetrics, ChatTransport, ChatTransportError, ClaimedEnvelope, DeliveryStatus,
    OutboundQueue, OutboundQueueError, TimelineRepository, log_metrics_failure,
};
use crate::domain::{ListingNotification, MessageId, NewTimelineEntry, Payload};

mod error_code;
mod runtime;

pub use error_code::extract_status_code;
pub use runtime::{DeliveryPorts, DeliveryRuntime, RandomJitter, TokioSleeper};

/// Pacing and reconnect settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryWorkerConfig {
    /// Transport calls allowed per second.
    pub rate_per_second: u32,
    /// Pause after finding the queue empty.
    pub idle_poll: Duration,
    /// First reconnect delay after a queue failure.
    pub initial_backoff: Duration,
    /// Reconnect delay cap.
    pub max_backoff: Duration,
}

impl Default for DeliveryWorkerConfig {
    fn default() -> Self {
        Self {
            rate_per_second: 30,
            idle_poll: Duration::from_millis(250),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Result of one [`DeliveryWorker::deliver_next`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Nothing was ready.
    Idle,
    /// The platform accepted the operation.
    Delivered {
        /// Queue id of the envelope.
        id: i64,
        /// Payload label.
        message_type: &'static str,
    },
    /// The platform or network rejected the operation.
    Failed {
        /// Queue id of the envelope.
        id: i64,
        /// Payload label.
        message_type: &'static str,
        /// Extracted status code, `0` when unknown.
        error_code: u16,
    },
    /// The stored envelope could not be decoded and was discarded.
    Dropped {
        /// Queue id of the discarded row.
        id: i64,
    },
}

/// Async sleeping abstraction for pacing and backoff.
#[async_trait]
pub trait DeliverySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Reconnect backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use librecash::domain::BackoffJitter;
    /// use chrono::{TimeZone, Utc};
    /// use std::time::Duration;
    /// struct DeterministicJitter;
    /// impl BackoffJitter for DeterministicJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: chrono::DateTime<chrono::Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt) * 5)
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid time");
    /// let delay = DeterministicJitter.jittered_delay(Duration::from_millis(100), 2, now);
    /// assert_eq!(delay, Duration::from_millis(110));
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Single consumer of the outbound queue.
pub struct DeliveryWorker {
    queue: Arc<dyn OutboundQueue>,
    transport: Arc<dyn ChatTransport>,
    timeline: Arc<dyn TimelineRepository>,
    metrics: Arc<dyn BotMetrics>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn DeliverySleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: DeliveryWorkerConfig,
}

impl DeliveryWorker {
    /// Build a worker using Tokio sleeping and random jitter.
    #[must_use]
    pub fn new(ports: DeliveryPorts, clock: Arc<dyn Clock>, config: DeliveryWorkerConfig) -> Self {
        Self::with_runtime(ports, clock, DeliveryRuntime::default(), config)
    }

    /// Build a worker with injected runtime abstractions.
    #[must_use]
    pub fn with_runtime(
        ports: DeliveryPorts,
        clock: Arc<dyn Clock>,
        runtime: DeliveryRuntime,
        config: DeliveryWorkerConfig,
    ) -> Self {
        Self {
            queue: ports.queue,
            transport: ports.transport,
            timeline: ports.timeline,
            metrics: ports.metrics,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config,
        }
    }

    /// Drain the queue until `shutdown` resolves.
    ///
    /// Claims are paced to `rate_per_second`. An empty queue pauses for
    /// `idle_poll`; queue failures pause with jittered exponential backoff
    /// that resets after the next successful claim.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let mut ticker = tokio::time::interval(self.send_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let mut failures: u32 = 0;

        info!(rate_per_second = self.config.rate_per_second, "delivery worker started");
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            match self.deliver_next().await {
                Ok(outcome) => {
                    failures = 0;
                    if outcome == DeliveryOutcome::Idle {
                        self.sleeper.sleep(self.config.idle_poll).await;
                    }
                }
                Err(error) => {
                    failures = failures.saturating_add(1);
                    let delay = self
                        .jitter
                        .jittered_delay(self.reconnect_base_delay(failures), failures, self.clock.utc())
                        .min(self.config.max_backoff);
                    warn!(
                        attempt = failures,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        connection = error.is_connection(),
                        error = %error,
                        "outbound queue unavailable; backing off"
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
        info!("delivery worker stopped");
    }

    /// Claim and perform at most one envelope.
    ///
    /// # Errors
    /// Queue failures while claiming or acknowledging. Transport failures
    /// are reported through [`DeliveryOutcome::Failed`] instead.
    pub async fn deliver_next(&self) -> Result<DeliveryOutcome, OutboundQueueError> {
        let claimed = match self.queue.claim_next().await {
            Ok(Some(claimed)) => claimed,
            Ok(None) => return Ok(DeliveryOutcome::Idle),
            Err(OutboundQueueError::Poisoned { id, message }) => {
                warn!(outbound_id = id, error = %message, "dropping undecodable outbound message");
                self.queue.acknowledge(id).await?;
                return Ok(DeliveryOutcome::Dropped { id });
            }
            Err(error) => return Err(error),
        };

        let ClaimedEnvelope {
            id,
            envelope,
            attempts,
        } = claimed;
        let message_type = envelope.payload.kind_label();
        let outcome = match self.perform(envelope.payload).await {
            Ok(()) => {
                debug!(outbound_id = id, message_type, "outbound message delivered");
                log_metrics_failure(
                    self.metrics
                        .record_transport_message(message_type, DeliveryStatus::Sent, 0)
                        .await,
                );
                DeliveryOutcome::Delivered { id, message_type }
            }
            Err(error) => {
                let code = error_code::error_code(&error);
                warn!(
                    outbound_id = id,
                    message_type,
                    attempts,
                    error_code = code,
                    error = %error,
                    "outbound delivery failed"
                );
                log_metrics_failure(
                    self.metrics
                        .record_transport_message(message_type, DeliveryStatus::Failed, code)
                        .await,
                );
                DeliveryOutcome::Failed {
                    id,
                    message_type,
                    error_code: code,
                }
            }
        };

        self.queue.acknowledge(id).await?;
        Ok(outcome)
    }

    async fn perform(&self, payload: Payload) -> Result<(), ChatTransportError> {
        match payload {
            Payload::Message(message) => self.transport.send_message(&message).await.map(|_| ()),
            Payload::Edit(edit) => self.transport.edit_message(&edit).await,
            Payload::CallbackAnswer(answer) => self.transport.answer_callback(&answer).await,
            Payload::ListingNotification(notification) => {
                let sent = self.transport.send_message(&notification.message).await;
                self.record_timeline(&notification, sent.as_ref().ok().copied())
                    .await;
                sent.map(|_| ())
            }
        }
    }

    async fn record_timeline(&self, notification: &ListingNotification, sent: Option<MessageId>) {
        let now = self.clock.utc();
        let entry = sent.map_or_else(
            || NewTimelineEntry::failed(notification.listing_id, notification.recipient_id, now),
            |message_id| {
                NewTimelineEntry::sent(notification.listing_id, notification.recipient_id, message_id, now)
            },
        );
        if let Err(error) = self.timeline.record(&entry).await {
            warn!(
                listing_id = %notification.listing_id,
                recipient_id = %notification.recipient_id,
                error = %error,
                "failed to record listing timeline entry"
            );
        }
    }

    fn send_interval(&self) -> Duration {
        Duration::from_secs(1) / self.config.rate_per_second.max(1)
    }

    fn reconnect_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}
