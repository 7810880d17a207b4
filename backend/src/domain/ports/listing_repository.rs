//! Port for listing persistence and discovery queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, GeoPoint, Listing, ListingId, NewListing, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by listing repository adapters.
    pub enum ListingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "listing repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "listing repository query failed: {message}",
    }
}

/// Parameters of a historical discovery query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalListingQuery {
    /// Centre of the search.
    pub center: GeoPoint,
    /// Search radius in kilometres.
    pub radius_km: u32,
    /// Owner whose listings are skipped.
    pub exclude_owner: UserId,
    /// Oldest acceptable posting instant.
    pub posted_since: DateTime<Utc>,
    /// Maximum number of listings returned.
    pub limit: usize,
}

/// Port for creating, updating and discovering listings.
///
/// Soft-deleted listings are invisible to every read method.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Insert an `initiated` listing and return it with its id.
    async fn create(&self, listing: &NewListing) -> Result<Listing, ListingRepositoryError>;

    /// Find a non-deleted listing by id.
    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, ListingRepositoryError>;

    /// Most recently created non-deleted listing of an owner.
    async fn find_latest_for_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Option<Listing>, ListingRepositoryError>;

    /// Persist status, amount and timestamps of an existing listing.
    async fn update(&self, listing: &Listing) -> Result<(), ListingRepositoryError>;

    /// Mark a listing deleted. Returns whether a live listing was found.
    async fn soft_delete(
        &self,
        id: ListingId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, ListingRepositoryError>;

    /// Posted listings inside the query radius and window.
    ///
    /// Keeps only the newest listing per owner and returns at most
    /// `query.limit` listings, oldest first.
    async fn find_posted_near(
        &self,
        query: &HistoricalListingQuery,
    ) -> Result<Vec<Listing>, ListingRepositoryError>;
}

impl From<ListingRepositoryError> for Error {
    fn from(err: ListingRepositoryError) -> Self {
        match err {
            ListingRepositoryError::Connection { message } => Error::service_unavailable(message),
            ListingRepositoryError::Query { message } => Error::internal(message),
        }
    }
}
