//! Port for the per-user session store.

use async_trait::async_trait;

use crate::domain::{Error, GeoPoint, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
    }
}

/// Port for loading, saving and locating users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by platform id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Insert or overwrite a user record.
    async fn save(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Users with a stored location within `radius_km` of `center`, nearest
    /// first.
    async fn find_within_radius(
        &self,
        center: GeoPoint,
        radius_km: u32,
    ) -> Result<Vec<User>, UserRepositoryError>;
}

impl From<UserRepositoryError> for Error {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::Connection { message } => Error::service_unavailable(message),
            UserRepositoryError::Query { message } => Error::internal(message),
        }
    }
}
