//! PostgreSQL-backed durable outbound queue.
//!
//! Rows are claimed with `FOR UPDATE SKIP LOCKED`, highest priority first
//! and by insertion id within a priority, so several workers can drain the
//! table without double delivery. A claim that is neither acknowledged nor
//! released becomes claimable again once its lease expires.

use std::time::Duration;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Double;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{ClaimedEnvelope, OutboundQueue, OutboundQueueError};
use crate::domain::{Envelope, Payload, Priority};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{ClaimedMessageRow, NewOutboundMessageRow};
use super::pool::{DbPool, PoolError};
use super::schema::outbound_messages;

/// Claims older than this are handed out again.
pub const DEFAULT_CLAIM_LEASE: Duration = Duration::from_secs(60);

const CLAIM_SQL: &str = r"
UPDATE outbound_messages
SET status = 'claimed', claimed_at = now(), attempts = attempts + 1
WHERE id = (
    SELECT id
    FROM outbound_messages
    WHERE status = 'pending'
       OR (status = 'claimed' AND claimed_at < now() - make_interval(secs => $1))
    ORDER BY priority DESC, id ASC
    LIMIT 1
    FOR UPDATE SKIP LOCKED
)
RETURNING id, priority, payload, attempts
";

/// Diesel-backed implementation of the `OutboundQueue` port.
#[derive(Clone)]
pub struct DieselOutboundQueue {
    pool: DbPool,
    lease: Duration,
}

impl DieselOutboundQueue {
    /// Create a queue with the default claim lease.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self {
            pool,
            lease: DEFAULT_CLAIM_LEASE,
        }
    }

    /// Override the claim lease.
    #[must_use]
    pub const fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }
}

fn map_pool_error(error: PoolError) -> OutboundQueueError {
    map_basic_pool_error(error, OutboundQueueError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OutboundQueueError {
    map_basic_diesel_error(error, OutboundQueueError::query, OutboundQueueError::connection)
}

fn encode(envelope: &Envelope) -> Result<NewOutboundMessageRow<'static>, OutboundQueueError> {
    let payload = serde_json::to_value(&envelope.payload)
        .map_err(|err| OutboundQueueError::query(format!("encode envelope: {err}")))?;
    Ok(NewOutboundMessageRow {
        priority: i16::from(envelope.priority.get()),
        kind: envelope.payload.kind_label(),
        payload,
    })
}

/// Rebuild a claimed envelope; undecodable rows surface as `Poisoned`.
fn decode(row: ClaimedMessageRow) -> Result<ClaimedEnvelope, OutboundQueueError> {
    let ClaimedMessageRow {
        id,
        priority: raw_priority,
        payload: raw_payload,
        attempts: raw_attempts,
    } = row;
    let priority = u8::try_from(raw_priority)
        .map(Priority::new)
        .map_err(|_| OutboundQueueError::poisoned(id, format!("priority {raw_priority} out of range")))?;
    let payload = serde_json::from_value::<Payload>(raw_payload)
        .map_err(|err| OutboundQueueError::poisoned(id, err.to_string()))?;
    let attempts = u32::try_from(raw_attempts).unwrap_or_default();
    Ok(ClaimedEnvelope {
        id,
        envelope: Envelope::new(priority, payload),
        attempts,
    })
}

#[async_trait]
impl OutboundQueue for DieselOutboundQueue {
    async fn enqueue(&self, envelope: &Envelope) -> Result<(), OutboundQueueError> {
        let row = encode(envelope)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(outbound_messages::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn claim_next(&self) -> Result<Option<ClaimedEnvelope>, OutboundQueueError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let claimed: Option<ClaimedMessageRow> = sql_query(CLAIM_SQL)
            .bind::<Double, _>(self.lease.as_secs_f64())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        claimed
            .map(|row| {
                debug!(outbound_id = row.id, attempts = row.attempts, "outbound message claimed");
                decode(row)
            })
            .transpose()
    }

    async fn acknowledge(&self, id: i64) -> Result<(), OutboundQueueError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(outbound_messages::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn release(&self, id: i64) -> Result<(), OutboundQueueError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(outbound_messages::table.find(id))
            .set((
                outbound_messages::status.eq("pending"),
                outbound_messages::claimed_at.eq(None::<chrono::DateTime<chrono::Utc>>),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
