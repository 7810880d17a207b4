//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Users are keyed by their platform id. The radius query is raw SQL over
//! the `great_circle_km` function the migrations install.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Double, Integer};
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{GeoPoint, MenuState, User, UserDraft, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{UserRow, UserUpsert};
use super::pool::{DbPool, PoolError};
use super::schema::users;

const WITHIN_RADIUS_SQL: &str = r"
SELECT id, username, first_name, last_name, language_code, lat, lon,
       search_radius_km, phone, menu_state
FROM users
WHERE lat IS NOT NULL
  AND lon IS NOT NULL
  AND great_circle_km($1, $2, lat, lon) <= $3
ORDER BY great_circle_km($1, $2, lat, lon) ASC, id ASC
";

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

/// Convert a database row into a domain user.
///
/// Unknown menu codes and out-of-range coordinates are rejected.
fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    let menu_state = MenuState::from_code(row.menu_state)
        .map_err(|err| UserRepositoryError::query(err.to_string()))?;
    let location = match (row.lat, row.lon) {
        (Some(lat), Some(lon)) => Some(
            GeoPoint::new(lat, lon).map_err(|err| UserRepositoryError::query(err.to_string()))?,
        ),
        (None, None) => None,
        _ => {
            warn!(user_id = row.id, "user row has a partial location; ignoring it");
            None
        }
    };
    let search_radius_km = row
        .search_radius_km
        .map(u32::try_from)
        .transpose()
        .map_err(|_| UserRepositoryError::query("negative search radius"))?;

    Ok(User::from_draft(UserDraft {
        id: UserId::new(row.id),
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        language_code: row.language_code,
        location,
        search_radius_km,
        phone: row.phone,
        menu_state,
    }))
}

fn user_to_upsert(user: &User) -> Result<UserUpsert<'_>, UserRepositoryError> {
    let search_radius_km = user
        .search_radius_km()
        .map(i32::try_from)
        .transpose()
        .map_err(|_| UserRepositoryError::query("search radius overflow"))?;
    Ok(UserUpsert {
        id: user.id().get(),
        username: user.username(),
        first_name: user.first_name(),
        last_name: user.last_name(),
        language_code: user.language_code(),
        lat: user.location().map(GeoPoint::lat),
        lon: user.location().map(GeoPoint::lon),
        search_radius_km,
        phone: user.phone(),
        menu_state: user.menu_state().code(),
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .filter(users::id.eq(id.get()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn save(&self, user: &User) -> Result<(), UserRepositoryError> {
        let upsert = user_to_upsert(user)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(users::table)
            .values(&upsert)
            .on_conflict(users::id)
            .do_update()
            .set((&upsert, users::updated_at.eq(diesel::dsl::now)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_within_radius(
        &self,
        center: GeoPoint,
        radius_km: u32,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = sql_query(WITHIN_RADIUS_SQL)
            .bind::<Double, _>(center.lat())
            .bind::<Double, _>(center.lon())
            .bind::<Integer, _>(i32::try_from(radius_km).unwrap_or(i32::MAX))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }
}
