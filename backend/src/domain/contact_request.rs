//! Requests to see a listing owner's contact details.

use chrono::{DateTime, Utc};

use super::{ListingId, UserId};

/// Values needed to record a contact request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewContactRequest {
    /// Listing whose owner is being contacted.
    pub listing_id: ListingId,
    /// User asking for the contact.
    pub requester_id: UserId,
    /// Listing owner.
    pub owner_id: UserId,
    /// Request instant.
    pub requested_at: DateTime<Utc>,
}

/// Result of an idempotent contact request creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRequestOutcome {
    /// First request for this (listing, requester) pair.
    Created,
    /// A request already existed; nothing was stored.
    AlreadyRequested,
}

impl ContactRequestOutcome {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "new_contact",
            Self::AlreadyRequested => "existing_contact",
        }
    }
}
