//! Port and runtime dependency bundles for the delivery worker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::domain::ports::{BotMetrics, ChatTransport, OutboundQueue, TimelineRepository};

use super::{BackoffJitter, DeliverySleeper};

/// Port bundle required by the delivery worker.
pub struct DeliveryPorts {
    /// Queue the worker drains.
    pub queue: Arc<dyn OutboundQueue>,
    /// Chat platform adapter.
    pub transport: Arc<dyn ChatTransport>,
    /// Timeline of delivered listing notifications.
    pub timeline: Arc<dyn TimelineRepository>,
    /// Transport counters.
    pub metrics: Arc<dyn BotMetrics>,
}

/// Runtime helpers used by pacing and reconnect backoff.
pub struct DeliveryRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn DeliverySleeper>,
    /// Jitter strategy for reconnect delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for DeliveryRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl DeliverySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, drawn from a fresh RNG seeded by
/// the attempt time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let quarter = (base / 4).max(Duration::from_millis(1));
        let max_extra = u64::try_from(quarter.as_millis()).unwrap_or(u64::MAX);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        let extra = SmallRng::seed_from_u64(seed).gen_range(0..=max_extra);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}
