//! PostgreSQL-backed `ListingRepository` implementation using Diesel ORM.
//!
//! Soft-deleted rows stay in the table for the timeline and contact ledger
//! but are filtered out of every read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Double, Integer, Timestamptz};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{HistoricalListingQuery, ListingRepository, ListingRepositoryError};
use crate::domain::{
    Direction, GeoPoint, Listing, ListingDraft, ListingId, ListingStatus, NewListing, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{ListingRow, ListingUpdate, NewListingRow};
use super::pool::{DbPool, PoolError};
use super::schema::listings;

/// Newest posted listing per owner inside the window, returned oldest first.
const POSTED_NEAR_SQL: &str = r"
SELECT id, owner_id, direction, status, amount_usd, lat, lon,
       deleted_at, created_at, updated_at, posted_at
FROM (
    SELECT DISTINCT ON (owner_id)
           id, owner_id, direction, status, amount_usd, lat, lon,
           deleted_at, created_at, updated_at, posted_at
    FROM listings
    WHERE status = 'posted'
      AND deleted_at IS NULL
      AND owner_id <> $4
      AND COALESCE(posted_at, created_at) >= $5
      AND great_circle_km($1, $2, lat, lon) <= $3
    ORDER BY owner_id, COALESCE(posted_at, created_at) DESC, id DESC
) AS newest_per_owner
ORDER BY COALESCE(posted_at, created_at) ASC, id ASC
LIMIT $6
";

/// Diesel-backed implementation of the `ListingRepository` port.
#[derive(Clone)]
pub struct DieselListingRepository {
    pool: DbPool,
}

impl DieselListingRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ListingRepositoryError {
    map_basic_pool_error(error, ListingRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ListingRepositoryError {
    map_basic_diesel_error(
        error,
        ListingRepositoryError::query,
        ListingRepositoryError::connection,
    )
}

fn row_to_listing(row: ListingRow) -> Result<Listing, ListingRepositoryError> {
    let direction = row
        .direction
        .parse::<Direction>()
        .map_err(|err| ListingRepositoryError::query(err.to_string()))?;
    let status = row
        .status
        .parse::<ListingStatus>()
        .map_err(|err| ListingRepositoryError::query(err.to_string()))?;
    let origin = GeoPoint::new(row.lat, row.lon)
        .map_err(|err| ListingRepositoryError::query(err.to_string()))?;
    let amount_usd = row
        .amount_usd
        .map(u32::try_from)
        .transpose()
        .map_err(|_| ListingRepositoryError::query("negative listing amount"))?;

    Ok(Listing::from_draft(ListingDraft {
        id: ListingId::new(row.id),
        owner_id: UserId::new(row.owner_id),
        direction,
        status,
        amount_usd,
        origin,
        deleted_at: row.deleted_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        posted_at: row.posted_at,
    }))
}

fn listing_to_update(listing: &Listing) -> Result<ListingUpdate<'static>, ListingRepositoryError> {
    let amount_usd = listing
        .amount_usd()
        .map(i32::try_from)
        .transpose()
        .map_err(|_| ListingRepositoryError::query("listing amount overflow"))?;
    let posted_at = (listing.status() == ListingStatus::Posted).then(|| listing.posted_at());
    Ok(ListingUpdate {
        status: listing.status().as_str(),
        amount_usd,
        updated_at: listing.updated_at(),
        posted_at,
    })
}

#[async_trait]
impl ListingRepository for DieselListingRepository {
    async fn create(&self, listing: &NewListing) -> Result<Listing, ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diesel::insert_into(listings::table)
            .values(&NewListingRow {
                owner_id: listing.owner_id.get(),
                direction: listing.direction.as_str(),
                status: ListingStatus::Initiated.as_str(),
                lat: listing.origin.lat(),
                lon: listing.origin.lon(),
                created_at: listing.created_at,
                updated_at: listing.created_at,
            })
            .returning(ListingRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_listing(row)
    }

    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = listings::table
            .filter(listings::id.eq(id.get()))
            .filter(listings::deleted_at.is_null())
            .select(ListingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_listing).transpose()
    }

    async fn find_latest_for_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Option<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = listings::table
            .filter(listings::owner_id.eq(owner_id.get()))
            .filter(listings::deleted_at.is_null())
            .order((listings::created_at.desc(), listings::id.desc()))
            .select(ListingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_listing).transpose()
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingRepositoryError> {
        let changes = listing_to_update(listing)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(listings::table.filter(listings::id.eq(listing.id().get())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(ListingRepositoryError::query(format!(
                "listing {} does not exist",
                listing.id()
            )));
        }
        Ok(())
    }

    async fn soft_delete(
        &self,
        id: ListingId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            listings::table
                .filter(listings::id.eq(id.get()))
                .filter(listings::deleted_at.is_null()),
        )
        .set((
            listings::deleted_at.eq(deleted_at),
            listings::updated_at.eq(deleted_at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn find_posted_near(
        &self,
        query: &HistoricalListingQuery,
    ) -> Result<Vec<Listing>, ListingRepositoryError> {
        let limit = i64::try_from(query.limit)
            .map_err(|_| ListingRepositoryError::query("historical limit overflow"))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ListingRow> = sql_query(POSTED_NEAR_SQL)
            .bind::<Double, _>(query.center.lat())
            .bind::<Double, _>(query.center.lon())
            .bind::<Integer, _>(i32::try_from(query.radius_km).unwrap_or(i32::MAX))
            .bind::<BigInt, _>(query.exclude_owner.get())
            .bind::<Timestamptz, _>(query.posted_since)
            .bind::<BigInt, _>(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_listing).collect()
    }
}
