//! Records of dispatched listing notifications.
//!
//! Each entry ties one (listing, recipient) pair to the chat message that
//! carried the notification, so the author can later edit or retract it.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListingId, MessageId, UnknownLabel, UserId};

/// Delivery status of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineStatus {
    /// Dispatch intent recorded, not yet confirmed.
    Pending,
    /// Delivered; the message handle is known.
    Sent,
    /// The transport rejected the message.
    Failed,
    /// The listing was retracted by its author.
    Deleted,
}

impl TimelineStatus {
    /// Storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Deleted => "deleted",
        }
    }
}

impl FromStr for TimelineStatus {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            "deleted" => Ok(Self::Deleted),
            other => Err(UnknownLabel::new("timeline status", other)),
        }
    }
}

/// Outcome of one delivery attempt, as recorded by the delivery worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewTimelineEntry {
    /// Listing that was announced.
    pub listing_id: ListingId,
    /// User that received the notification.
    pub recipient_id: UserId,
    /// Chat message handle, present when delivery succeeded.
    pub message_id: Option<MessageId>,
    /// `Sent` or `Failed`.
    pub status: TimelineStatus,
    /// When the attempt finished.
    pub recorded_at: DateTime<Utc>,
}

impl NewTimelineEntry {
    /// Successful delivery carrying the transport message handle.
    #[must_use]
    pub const fn sent(
        listing_id: ListingId,
        recipient_id: UserId,
        message_id: MessageId,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            listing_id,
            recipient_id,
            message_id: Some(message_id),
            status: TimelineStatus::Sent,
            recorded_at,
        }
    }

    /// Rejected delivery; no handle exists.
    #[must_use]
    pub const fn failed(listing_id: ListingId, recipient_id: UserId, recorded_at: DateTime<Utc>) -> Self {
        Self {
            listing_id,
            recipient_id,
            message_id: None,
            status: TimelineStatus::Failed,
            recorded_at,
        }
    }
}

/// Stored timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Storage id.
    pub id: i64,
    /// Listing that was announced.
    pub listing_id: ListingId,
    /// User that received the notification.
    pub recipient_id: UserId,
    /// Chat message handle, absent until delivery is confirmed.
    pub message_id: Option<MessageId>,
    /// Delivery status.
    pub status: TimelineStatus,
    /// Whether the entry was retracted.
    pub is_deleted: bool,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

impl TimelineEntry {
    /// Whether the entry points at a message that can still be edited.
    #[must_use]
    pub const fn editable_message(&self) -> Option<MessageId> {
        match self.status {
            TimelineStatus::Sent | TimelineStatus::Deleted => self.message_id,
            TimelineStatus::Pending | TimelineStatus::Failed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    fn entry(status: TimelineStatus, message_id: Option<MessageId>) -> TimelineEntry {
        TimelineEntry {
            id: 1,
            listing_id: ListingId::new(3),
            recipient_id: UserId::new(4),
            message_id,
            status,
            is_deleted: false,
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(TimelineStatus::Sent, Some(MessageId::new(9)), Some(MessageId::new(9)))]
    #[case(TimelineStatus::Deleted, Some(MessageId::new(9)), Some(MessageId::new(9)))]
    #[case(TimelineStatus::Failed, None, None)]
    #[case(TimelineStatus::Pending, Some(MessageId::new(9)), None)]
    fn only_delivered_entries_are_editable(
        #[case] status: TimelineStatus,
        #[case] message_id: Option<MessageId>,
        #[case] expected: Option<MessageId>,
    ) {
        assert_eq!(entry(status, message_id).editable_message(), expected);
    }

    #[rstest]
    fn failed_entries_carry_no_handle() {
        let failed = NewTimelineEntry::failed(ListingId::new(1), UserId::new(2), Utc::now());
        assert!(failed.message_id.is_none());
        assert_eq!(failed.status, TimelineStatus::Failed);
    }
}
