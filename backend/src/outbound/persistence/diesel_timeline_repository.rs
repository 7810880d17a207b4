//! PostgreSQL-backed `TimelineRepository` implementation using Diesel ORM.
//!
//! Redeliveries upsert against the partial unique index on
//! `(listing_id, recipient_id) WHERE NOT is_deleted`. Diesel's builder
//! cannot express a conflict target with a predicate, so the upsert is raw
//! SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text, Timestamptz};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TimelineRepository, TimelineRepositoryError};
use crate::domain::{
    ListingId, MessageId, NewTimelineEntry, TimelineEntry, TimelineStatus, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::TimelineEntryRow;
use super::pool::{DbPool, PoolError};
use super::schema::timeline_entries;

const RECORD_SQL: &str = r"
INSERT INTO timeline_entries
    (listing_id, recipient_id, message_id, status, is_deleted, created_at, updated_at)
VALUES ($1, $2, $3, $4, FALSE, $5, $5)
ON CONFLICT (listing_id, recipient_id) WHERE NOT is_deleted
DO UPDATE SET
    message_id = EXCLUDED.message_id,
    status = EXCLUDED.status,
    updated_at = EXCLUDED.updated_at
";

/// Diesel-backed implementation of the `TimelineRepository` port.
#[derive(Clone)]
pub struct DieselTimelineRepository {
    pool: DbPool,
}

impl DieselTimelineRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TimelineRepositoryError {
    map_basic_pool_error(error, TimelineRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> TimelineRepositoryError {
    map_basic_diesel_error(
        error,
        TimelineRepositoryError::query,
        TimelineRepositoryError::connection,
    )
}

fn row_to_entry(row: TimelineEntryRow) -> Result<TimelineEntry, TimelineRepositoryError> {
    let status = row
        .status
        .parse::<TimelineStatus>()
        .map_err(|err| TimelineRepositoryError::query(err.to_string()))?;
    Ok(TimelineEntry {
        id: row.id,
        listing_id: ListingId::new(row.listing_id),
        recipient_id: UserId::new(row.recipient_id),
        message_id: row.message_id.map(MessageId::new),
        status,
        is_deleted: row.is_deleted,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl TimelineRepository for DieselTimelineRepository {
    async fn record(&self, entry: &NewTimelineEntry) -> Result<(), TimelineRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        sql_query(RECORD_SQL)
            .bind::<BigInt, _>(entry.listing_id.get())
            .bind::<BigInt, _>(entry.recipient_id.get())
            .bind::<Nullable<BigInt>, _>(entry.message_id.map(MessageId::get))
            .bind::<Text, _>(entry.status.as_str())
            .bind::<Timestamptz, _>(entry.recorded_at)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn list_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<TimelineEntry>, TimelineRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows = timeline_entries::table
            .filter(timeline_entries::listing_id.eq(listing_id.get()))
            .order(timeline_entries::id.asc())
            .select(TimelineEntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn mark_deleted_for_listing(
        &self,
        listing_id: ListingId,
        deleted_at: DateTime<Utc>,
    ) -> Result<usize, TimelineRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(
            timeline_entries::table
                .filter(timeline_entries::listing_id.eq(listing_id.get()))
                .filter(timeline_entries::is_deleted.eq(false)),
        )
        .set((
            timeline_entries::is_deleted.eq(true),
            timeline_entries::status.eq(TimelineStatus::Deleted.as_str()),
            timeline_entries::updated_at.eq(deleted_at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}
