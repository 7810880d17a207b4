//! PostgreSQL-backed `CalloutRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::UserId;
use crate::domain::ports::{CalloutRepository, CalloutRepositoryError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewDismissedCalloutRow;
use super::pool::{DbPool, PoolError};
use super::schema::dismissed_callouts;

/// Diesel-backed implementation of the `CalloutRepository` port.
#[derive(Clone)]
pub struct DieselCalloutRepository {
    pool: DbPool,
}

impl DieselCalloutRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CalloutRepositoryError {
    map_basic_pool_error(error, CalloutRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CalloutRepositoryError {
    map_basic_diesel_error(
        error,
        CalloutRepositoryError::query,
        CalloutRepositoryError::connection,
    )
}

#[async_trait]
impl CalloutRepository for DieselCalloutRepository {
    async fn is_dismissed(&self, user_id: UserId, feature: &str) -> Result<bool, CalloutRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            dismissed_callouts::table
                .filter(dismissed_callouts::user_id.eq(user_id.get()))
                .filter(dismissed_callouts::feature.eq(feature)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn dismiss(&self, user_id: UserId, feature: &str) -> Result<(), CalloutRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(dismissed_callouts::table)
            .values(&NewDismissedCalloutRow {
                user_id: user_id.get(),
                feature,
            })
            .on_conflict((dismissed_callouts::user_id, dismissed_callouts::feature))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
