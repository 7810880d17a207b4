//! Shared Diesel error mapping for repositories with basic query semantics.
//!
//! Every LibreCash port error exposes `connection` and `query`
//! constructors; the helpers below take those constructors so each
//! repository keeps a one-line `map_*_error` wrapper.

use tracing::debug;

use super::pool::PoolError;

/// Any pool failure means the database is unreachable for this call.
#[must_use]
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    connection(error.message().to_owned())
}

/// Map common Diesel error variants into query/connection constructors.
///
/// A closed connection maps to a connection error; everything else,
/// including lost row-lock races, is a query error.
#[must_use]
pub fn map_basic_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            query("unique constraint violated")
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            query("concurrent update conflict")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}
