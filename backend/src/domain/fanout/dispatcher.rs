//! Bounded hand-off of live fanout work to a supervised background task.
//!
//! Posting a listing must not wait for its broadcast, yet a crashed
//! broadcast must still show up in the logs. Jobs travel over a bounded
//! channel, so a burst of postings applies backpressure to the poster instead
//! of piling up unbounded detached tasks.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::{Error, Listing, TraceId};

use super::FanoutEngine;

/// One unit of background fanout work.
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutJob {
    listing: Listing,
    trace_id: Option<TraceId>,
}

impl FanoutJob {
    /// Broadcast `listing`, carrying the caller's trace id.
    #[must_use]
    pub fn listing(listing: Listing) -> Self {
        Self {
            listing,
            trace_id: TraceId::current(),
        }
    }

    /// Listing to broadcast.
    #[must_use]
    pub const fn target(&self) -> &Listing {
        &self.listing
    }
}

/// Port through which the session engine requests a broadcast.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FanoutScheduler: Send + Sync {
    /// Queue a broadcast without waiting for it to run.
    async fn schedule(&self, job: FanoutJob) -> Result<(), Error>;
}

/// Channel-backed [`FanoutScheduler`] draining into a [`FanoutEngine`].
#[derive(Clone)]
pub struct FanoutDispatcher {
    sender: mpsc::Sender<FanoutJob>,
}

impl FanoutDispatcher {
    /// Start the consumer task.
    ///
    /// Jobs run one at a time, each inside its own task so a panic is caught
    /// and logged at `ERROR`, which the error reporter forwards, instead of
    /// killing the consumer. The consumer ends once every dispatcher clone is
    /// dropped.
    #[must_use]
    pub fn spawn(engine: Arc<FanoutEngine>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<FanoutJob>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                run_supervised(Arc::clone(&engine), job).await;
            }
            info!("fanout dispatcher stopped");
        });
        (Self { sender }, handle)
    }
}

#[async_trait]
impl FanoutScheduler for FanoutDispatcher {
    async fn schedule(&self, job: FanoutJob) -> Result<(), Error> {
        self.sender
            .send(job)
            .await
            .map_err(|_| Error::service_unavailable("fanout dispatcher is not running"))
    }
}

async fn run_supervised(engine: Arc<FanoutEngine>, job: FanoutJob) {
    let listing_id = job.listing.id();
    let task = tokio::spawn(async move {
        let run = async { engine.broadcast_listing(&job.listing).await };
        match job.trace_id {
            Some(trace_id) => TraceId::scope(trace_id, run).await,
            None => run.await,
        }
    });

    match task.await {
        Ok(Ok(report)) => info!(
            listing_id = %listing_id,
            queued = report.queued,
            failed = report.failed,
            "fanout job completed"
        ),
        Ok(Err(err)) => warn!(listing_id = %listing_id, error = %err, "fanout job failed"),
        Err(join_error) => match join_error.try_into_panic() {
            Ok(payload) => error!(
                listing_id = %listing_id,
                panic = panic_message(payload.as_ref()),
                "fanout job panicked"
            ),
            Err(cancelled) => {
                error!(listing_id = %listing_id, error = %cancelled, "fanout job aborted");
            }
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
