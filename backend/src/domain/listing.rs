//! Exchange listings and their lifecycle.
//!
//! A listing is created `initiated` when the user picks a direction, becomes
//! `posted` once an amount is chosen, and may later be `canceled` or
//! `superseded`. The amount is only ever present on posted listings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GeoPoint, UserId};

/// Storage identifier of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(i64);

impl ListingId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the exchange the owner holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Owner has cash and wants crypto.
    CashToCrypto,
    /// Owner has crypto and wants cash.
    CryptoToCash,
}

impl Direction {
    /// Wire and storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashToCrypto => "cash_to_crypto",
            Self::CryptoToCash => "crypto_to_cash",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored label names no known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} label: {value}")]
pub struct UnknownLabel {
    kind: &'static str,
    value: String,
}

impl UnknownLabel {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl FromStr for Direction {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cash_to_crypto" => Ok(Self::CashToCrypto),
            "crypto_to_cash" => Ok(Self::CryptoToCash),
            other => Err(UnknownLabel::new("direction", other)),
        }
    }
}

/// Lifecycle status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Direction chosen, amount pending.
    Initiated,
    /// Amount chosen and broadcast to nearby users.
    Posted,
    /// Abandoned by the owner before posting.
    Canceled,
    /// Replaced by a newer listing.
    Superseded,
}

impl ListingStatus {
    /// Storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Posted => "posted",
            Self::Canceled => "canceled",
            Self::Superseded => "superseded",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "initiated" => Ok(Self::Initiated),
            "posted" => Ok(Self::Posted),
            "canceled" => Ok(Self::Canceled),
            "superseded" => Ok(Self::Superseded),
            other => Err(UnknownLabel::new("listing status", other)),
        }
    }
}

/// Illegal lifecycle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ListingTransitionError {
    /// Only initiated listings can be posted.
    #[error("listing cannot be posted from status {0:?}")]
    NotInitiated(ListingStatus),
    /// Posting requires a positive amount.
    #[error("listing amount must be positive")]
    ZeroAmount,
    /// Terminal listings cannot change status.
    #[error("listing is already {0:?}")]
    Closed(ListingStatus),
}

/// Values needed to insert a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    /// Owning user.
    pub owner_id: UserId,
    /// Exchange direction.
    pub direction: Direction,
    /// Owner location when the listing was created.
    pub origin: GeoPoint,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// Stored listing fields, used by adapters to rebuild a [`Listing`].
#[derive(Debug, Clone)]
pub struct ListingDraft {
    /// Storage id.
    pub id: ListingId,
    /// Owning user.
    pub owner_id: UserId,
    /// Exchange direction.
    pub direction: Direction,
    /// Lifecycle status.
    pub status: ListingStatus,
    /// USD amount, present once posted.
    pub amount_usd: Option<u32>,
    /// Owner location at creation.
    pub origin: GeoPoint,
    /// Soft-delete instant.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
    /// Instant the listing became posted.
    pub posted_at: Option<DateTime<Utc>>,
}

/// A cash/crypto exchange intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    id: ListingId,
    owner_id: UserId,
    direction: Direction,
    status: ListingStatus,
    amount_usd: Option<u32>,
    origin: GeoPoint,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    posted_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Rebuild a listing from stored fields.
    ///
    /// An amount on a non-posted listing is dropped so the type never
    /// exposes a half-posted listing.
    #[must_use]
    pub const fn from_draft(draft: ListingDraft) -> Self {
        let amount_usd = match draft.status {
            ListingStatus::Posted => draft.amount_usd,
            _ => None,
        };
        Self {
            id: draft.id,
            owner_id: draft.owner_id,
            direction: draft.direction,
            status: draft.status,
            amount_usd,
            origin: draft.origin,
            deleted_at: draft.deleted_at,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
            posted_at: draft.posted_at,
        }
    }

    /// Storage id.
    #[must_use]
    pub const fn id(&self) -> ListingId {
        self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Exchange direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ListingStatus {
        self.status
    }

    /// USD amount, present once posted.
    #[must_use]
    pub const fn amount_usd(&self) -> Option<u32> {
        self.amount_usd
    }

    /// Owner location at creation.
    #[must_use]
    pub const fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Soft-delete instant.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Whether the listing was soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Creation instant.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last mutation instant.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Instant the listing became posted, falling back to creation.
    #[must_use]
    pub fn posted_at(&self) -> DateTime<Utc> {
        self.posted_at.unwrap_or(self.created_at)
    }

    /// Set the amount and mark the listing posted.
    ///
    /// # Errors
    /// Fails unless the listing is `initiated` and the amount is positive.
    pub fn post(&mut self, amount_usd: u32, now: DateTime<Utc>) -> Result<(), ListingTransitionError> {
        if self.status != ListingStatus::Initiated {
            return Err(ListingTransitionError::NotInitiated(self.status));
        }
        if amount_usd == 0 {
            return Err(ListingTransitionError::ZeroAmount);
        }
        self.status = ListingStatus::Posted;
        self.amount_usd = Some(amount_usd);
        self.posted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Mark the listing canceled.
    ///
    /// # Errors
    /// Fails when the listing is already canceled or superseded.
    pub const fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), ListingTransitionError> {
        self.close(ListingStatus::Canceled, now)
    }

    /// Mark the listing superseded by a newer one.
    ///
    /// # Errors
    /// Fails when the listing is already canceled or superseded.
    pub const fn supersede(&mut self, now: DateTime<Utc>) -> Result<(), ListingTransitionError> {
        self.close(ListingStatus::Superseded, now)
    }

    const fn close(&mut self, target: ListingStatus, now: DateTime<Utc>) -> Result<(), ListingTransitionError> {
        match self.status {
            ListingStatus::Initiated | ListingStatus::Posted => {
                self.status = target;
                self.updated_at = now;
                Ok(())
            }
            closed => Err(ListingTransitionError::Closed(closed)),
        }
    }
}
