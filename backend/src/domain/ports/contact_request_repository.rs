//! Port for idempotent contact request storage.

use async_trait::async_trait;

use crate::domain::{ContactRequestOutcome, Error, ListingId, NewContactRequest, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by contact request repository adapters.
    pub enum ContactRequestRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "contact request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "contact request repository query failed: {message}",
    }
}

/// Port for recording who asked for whose contact.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactRequestRepository: Send + Sync {
    /// Whether `requester_id` already asked about `listing_id`.
    async fn exists(
        &self,
        listing_id: ListingId,
        requester_id: UserId,
    ) -> Result<bool, ContactRequestRepositoryError>;

    /// Store the request unless one exists for the same pair.
    ///
    /// Concurrent callers for one pair all succeed and exactly one row is
    /// stored.
    async fn create_if_absent(
        &self,
        request: &NewContactRequest,
    ) -> Result<ContactRequestOutcome, ContactRequestRepositoryError>;
}

impl From<ContactRequestRepositoryError> for Error {
    fn from(err: ContactRequestRepositoryError) -> Self {
        match err {
            ContactRequestRepositoryError::Connection { message } => Error::service_unavailable(message),
            ContactRequestRepositoryError::Query { message } => Error::internal(message),
        }
    }
}
