//! Long-poll loop feeding updates into the session engine.
//!
//! Updates are processed one at a time in arrival order. The offset is
//! advanced past every received update, including ones the bot ignores, so a
//! malformed update can never wedge the feed. Errors raised while handling an
//! update are reported against its sender.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::dto::UpdateDto;
use super::feed::UpdateFeed;
use crate::domain::{SessionEngine, TraceId};
use crate::reporting::with_reported_user;

/// Listener tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Long-poll wait passed to `getUpdates`.
    pub poll_timeout: Duration,
    /// First pause after a failed poll.
    pub initial_backoff: Duration,
    /// Longest pause between failed polls.
    pub max_backoff: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(30),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Drives an [`UpdateFeed`] into a [`SessionEngine`].
pub struct UpdateListener {
    feed: Arc<dyn UpdateFeed>,
    engine: Arc<SessionEngine>,
    config: ListenerConfig,
}

impl UpdateListener {
    /// Wire a feed to an engine.
    #[must_use]
    pub const fn new(feed: Arc<dyn UpdateFeed>, engine: Arc<SessionEngine>, config: ListenerConfig) -> Self {
        Self {
            feed,
            engine,
            config,
        }
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Feed failures pause with exponential backoff capped at
    /// `max_backoff`; the update being processed when shutdown fires is
    /// finished first.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let mut offset = 0_i64;
        let mut failures: u32 = 0;

        info!(poll_timeout_secs = self.config.poll_timeout.as_secs(), "update listener started");
        loop {
            let polled = tokio::select! {
                biased;
                () = &mut shutdown => break,
                polled = self.feed.get_updates(offset, self.config.poll_timeout) => polled,
            };

            match polled {
                Ok(updates) => {
                    failures = 0;
                    offset = self.process_batch(offset, updates).await;
                }
                Err(error) => {
                    failures = failures.saturating_add(1);
                    let delay = self.backoff(failures);
                    warn!(
                        attempt = failures,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "update poll failed; backing off"
                    );
                    tokio::select! {
                        biased;
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
        info!(offset, "update listener stopped");
    }

    /// Handle `updates` in order and return the next offset.
    pub async fn process_batch(&self, mut offset: i64, updates: Vec<UpdateDto>) -> i64 {
        for update in updates {
            let update_id = update.update_id;
            offset = offset.max(update_id.saturating_add(1));
            let Some((user_id, event)) = update.into_event() else {
                continue;
            };
            let engine = Arc::clone(&self.engine);
            let username = event.profile().username.clone();
            let handled = TraceId::trace_update(update_id, async move {
                debug!(user_id = %user_id, kind = event.kind_label(), "dispatching update");
                engine.handle(user_id, event).await;
            });
            with_reported_user(user_id, username, handled).await;
        }
        offset
    }

    fn backoff(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.config
            .initial_backoff
            .saturating_mul(1_u32 << exponent)
            .min(self.config.max_backoff)
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
