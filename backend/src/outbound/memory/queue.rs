//! Priority heap standing in for the durable outbound queue.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{ClaimedEnvelope, OutboundQueue, OutboundQueueError};
use crate::domain::{Envelope, Priority};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Queued {
    priority: Priority,
    seq: Reverse<u64>,
    attempts: u32,
    envelope: Envelope,
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, self.seq).cmp(&(other.priority, other.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
struct QueueState {
    ready: BinaryHeap<Queued>,
    claimed: BTreeMap<u64, Queued>,
    next_seq: u64,
}

/// In-process [`OutboundQueue`]: highest priority first, FIFO within one
/// priority.
///
/// The enqueue sequence doubles as the claim id, so a released envelope
/// keeps its place among its peers. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryOutboundQueue {
    state: Mutex<QueueState>,
}

impl MemoryOutboundQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Envelopes waiting to be claimed.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    /// Envelopes claimed and not yet acknowledged or released.
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.claimed.len()
    }

    /// Remove and return every ready envelope in claim order.
    pub async fn drain(&self) -> Vec<Envelope> {
        let mut state = self.state.lock().await;
        let mut drained = Vec::with_capacity(state.ready.len());
        while let Some(queued) = state.ready.pop() {
            drained.push(queued.envelope);
        }
        drained
    }
}

fn claim_id(seq: u64) -> Result<i64, OutboundQueueError> {
    i64::try_from(seq).map_err(|_| OutboundQueueError::query("queue sequence overflow"))
}

#[async_trait]
impl OutboundQueue for MemoryOutboundQueue {
    async fn enqueue(&self, envelope: &Envelope) -> Result<(), OutboundQueueError> {
        let mut state = self.state.lock().await;
        state.next_seq += 1;
        let seq = state.next_seq;
        state.ready.push(Queued {
            priority: envelope.priority,
            seq: Reverse(seq),
            attempts: 0,
            envelope: envelope.clone(),
        });
        Ok(())
    }

    async fn claim_next(&self) -> Result<Option<ClaimedEnvelope>, OutboundQueueError> {
        let mut state = self.state.lock().await;
        let Some(mut queued) = state.ready.pop() else {
            return Ok(None);
        };
        queued.attempts += 1;
        let Reverse(seq) = queued.seq;
        let claimed = ClaimedEnvelope {
            id: claim_id(seq)?,
            envelope: queued.envelope.clone(),
            attempts: queued.attempts,
        };
        state.claimed.insert(seq, queued);
        Ok(Some(claimed))
    }

    async fn acknowledge(&self, id: i64) -> Result<(), OutboundQueueError> {
        if let Ok(seq) = u64::try_from(id) {
            self.state.lock().await.claimed.remove(&seq);
        }
        Ok(())
    }

    async fn release(&self, id: i64) -> Result<(), OutboundQueueError> {
        let Ok(seq) = u64::try_from(id) else {
            return Ok(());
        };
        let mut state = self.state.lock().await;
        if let Some(queued) = state.claimed.remove(&seq) {
            state.ready.push(queued);
        }
        Ok(())
    }
}
