//! Port for listing notification timeline entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, ListingId, NewTimelineEntry, TimelineEntry};

use super::define_port_error;

define_port_error! {
    /// Errors raised by timeline repository adapters.
    pub enum TimelineRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "timeline repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "timeline repository query failed: {message}",
    }
}

/// Port for recording and enumerating dispatched notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimelineRepository: Send + Sync {
    /// Record a delivery outcome.
    ///
    /// At most one non-deleted entry exists per (listing, recipient); a
    /// redelivery overwrites the existing entry.
    async fn record(&self, entry: &NewTimelineEntry) -> Result<(), TimelineRepositoryError>;

    /// Every entry of a listing, deleted or not, oldest first.
    async fn list_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<TimelineEntry>, TimelineRepositoryError>;

    /// Soft-delete every live entry of a listing. Returns the affected count.
    async fn mark_deleted_for_listing(
        &self,
        listing_id: ListingId,
        deleted_at: DateTime<Utc>,
    ) -> Result<usize, TimelineRepositoryError>;
}

impl From<TimelineRepositoryError> for Error {
    fn from(err: TimelineRepositoryError) -> Self {
        match err {
            TimelineRepositoryError::Connection { message } => Error::service_unavailable(message),
            TimelineRepositoryError::Query { message } => Error::internal(message),
        }
    }
}
