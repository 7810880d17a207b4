//! PostgreSQL-backed `ContactRequestRepository` implementation.
//!
//! Creation runs in one transaction: the pair is locked with
//! `SELECT ... FOR UPDATE`, inserted when absent, and the insert carries
//! `ON CONFLICT DO NOTHING` for callers racing past an empty lock.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{ContactRequestRepository, ContactRequestRepositoryError};
use crate::domain::{ContactRequestOutcome, ListingId, NewContactRequest, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewContactRequestRow;
use super::pool::{DbPool, PoolError};
use super::schema::contact_requests;

/// Diesel-backed implementation of the `ContactRequestRepository` port.
#[derive(Clone)]
pub struct DieselContactRequestRepository {
    pool: DbPool,
}

impl DieselContactRequestRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ContactRequestRepositoryError {
    map_basic_pool_error(error, ContactRequestRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ContactRequestRepositoryError {
    map_basic_diesel_error(
        error,
        ContactRequestRepositoryError::query,
        ContactRequestRepositoryError::connection,
    )
}

#[async_trait]
impl ContactRequestRepository for DieselContactRequestRepository {
    async fn exists(
        &self,
        listing_id: ListingId,
        requester_id: UserId,
    ) -> Result<bool, ContactRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            contact_requests::table
                .filter(contact_requests::listing_id.eq(listing_id.get()))
                .filter(contact_requests::requester_id.eq(requester_id.get())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn create_if_absent(
        &self,
        request: &NewContactRequest,
    ) -> Result<ContactRequestOutcome, ContactRequestRepositoryError> {
        let row = NewContactRequestRow {
            listing_id: request.listing_id.get(),
            requester_id: request.requester_id.get(),
            owner_id: request.owner_id.get(),
            requested_at: request.requested_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, diesel::result::Error, _>(|tx| {
            async move {
                let existing: Option<i64> = contact_requests::table
                    .filter(contact_requests::listing_id.eq(row.listing_id))
                    .filter(contact_requests::requester_id.eq(row.requester_id))
                    .select(contact_requests::id)
                    .for_update()
                    .first(tx)
                    .await
                    .optional()?;
                if existing.is_some() {
                    return Ok(ContactRequestOutcome::AlreadyRequested);
                }

                let inserted = diesel::insert_into(contact_requests::table)
                    .values(&row)
                    .on_conflict((contact_requests::listing_id, contact_requests::requester_id))
                    .do_nothing()
                    .execute(tx)
                    .await?;

                Ok(if inserted == 0 {
                    ContactRequestOutcome::AlreadyRequested
                } else {
                    ContactRequestOutcome::Created
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
