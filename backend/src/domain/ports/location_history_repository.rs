//! Port for the append-only location history.

use async_trait::async_trait;

use crate::domain::{Error, GeoPoint, LocationHistoryEntry, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by location history repository adapters.
    pub enum LocationHistoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "location history repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "location history repository query failed: {message}",
    }
}

/// Port for appending to and reading a user's radius/location history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationHistoryRepository: Send + Sync {
    /// Append an entry.
    async fn append(&self, entry: &LocationHistoryEntry) -> Result<(), LocationHistoryRepositoryError>;

    /// Overwrite the coordinates of the user's newest entry.
    ///
    /// Returns whether an entry existed.
    async fn update_latest_coordinates(
        &self,
        user_id: UserId,
        location: GeoPoint,
    ) -> Result<bool, LocationHistoryRepositoryError>;

    /// Up to `limit` newest entries, newest first.
    async fn latest(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<LocationHistoryEntry>, LocationHistoryRepositoryError>;
}

impl From<LocationHistoryRepositoryError> for Error {
    fn from(err: LocationHistoryRepositoryError) -> Self {
        match err {
            LocationHistoryRepositoryError::Connection { message } => Error::service_unavailable(message),
            LocationHistoryRepositoryError::Query { message } => Error::internal(message),
        }
    }
}
