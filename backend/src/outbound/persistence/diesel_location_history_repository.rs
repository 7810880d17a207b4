//! PostgreSQL-backed `LocationHistoryRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LocationHistoryRepository, LocationHistoryRepositoryError};
use crate::domain::{GeoPoint, LocationHistoryEntry, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::LocationHistoryRow;
use super::pool::{DbPool, PoolError};
use super::schema::location_history;

/// Diesel-backed implementation of the `LocationHistoryRepository` port.
///
/// Entries are ordered by their serial id, so "newest" means "last
/// appended" even when two entries share a timestamp.
#[derive(Clone)]
pub struct DieselLocationHistoryRepository {
    pool: DbPool,
}

impl DieselLocationHistoryRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LocationHistoryRepositoryError {
    map_basic_pool_error(error, LocationHistoryRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LocationHistoryRepositoryError {
    map_basic_diesel_error(
        error,
        LocationHistoryRepositoryError::query,
        LocationHistoryRepositoryError::connection,
    )
}

fn row_to_entry(row: LocationHistoryRow) -> Result<LocationHistoryEntry, LocationHistoryRepositoryError> {
    let radius_km = u32::try_from(row.radius_km)
        .map_err(|_| LocationHistoryRepositoryError::query("negative history radius"))?;
    Ok(LocationHistoryEntry {
        user_id: UserId::new(row.user_id),
        radius_km,
        lat: row.lat,
        lon: row.lon,
        recorded_at: row.recorded_at,
    })
}

#[async_trait]
impl LocationHistoryRepository for DieselLocationHistoryRepository {
    async fn append(&self, entry: &LocationHistoryEntry) -> Result<(), LocationHistoryRepositoryError> {
        let radius_km = i32::try_from(entry.radius_km)
            .map_err(|_| LocationHistoryRepositoryError::query("history radius overflow"))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(location_history::table)
            .values(&LocationHistoryRow {
                user_id: entry.user_id.get(),
                radius_km,
                lat: entry.lat,
                lon: entry.lon,
                recorded_at: entry.recorded_at,
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update_latest_coordinates(
        &self,
        user_id: UserId,
        location: GeoPoint,
    ) -> Result<bool, LocationHistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let latest: Option<i64> = location_history::table
            .filter(location_history::user_id.eq(user_id.get()))
            .order(location_history::id.desc())
            .select(location_history::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(id) = latest else {
            return Ok(false);
        };

        let updated = diesel::update(location_history::table.find(id))
            .set((
                location_history::lat.eq(location.lat()),
                location_history::lon.eq(location.lon()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn latest(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<LocationHistoryEntry>, LocationHistoryRepositoryError> {
        let row_limit = i64::try_from(limit)
            .map_err(|_| LocationHistoryRepositoryError::query("history limit overflow"))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows = location_history::table
            .filter(location_history::user_id.eq(user_id.get()))
            .order(location_history::id.desc())
            .limit(row_limit)
            .select(LocationHistoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_entry).collect()
    }
}
