//! Proximity fanout of listings to nearby users.
//!
//! The engine discovers recipients through the user and listing ports,
//! renders one localised notification per recipient and enqueues it on the
//! outbound queue. Timeline entries are written later by the delivery worker
//! once the transport confirms or rejects each notification.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    BotMetrics, DispatchStatus, HistoricalListingQuery, ListingRepository, OutboundQueue,
    UserRepository, log_metrics_failure,
};
use crate::domain::{
    Catalog, Envelope, Error, FanoutKind, GeoPoint, Listing, ListingNotification, MenuState,
    OutgoingMessage, Priority, User, UserId, rounded_km, time_ago,
};

mod dispatcher;
mod message;

pub use dispatcher::{FanoutDispatcher, FanoutJob, FanoutScheduler};
#[cfg(test)]
pub use dispatcher::MockFanoutScheduler;

/// Widening posting windows searched by historical fanout, in days.
pub const HISTORICAL_WINDOWS_DAYS: [i64; 4] = [3, 7, 14, 30];

/// Most listings replayed by one historical fanout.
pub const HISTORICAL_LIMIT: usize = 10;

/// Port bundle required by the fanout engine.
pub struct FanoutPorts {
    /// User lookups and radius queries.
    pub users: Arc<dyn UserRepository>,
    /// Historical listing discovery.
    pub listings: Arc<dyn ListingRepository>,
    /// Outbound queue receiving notifications.
    pub queue: Arc<dyn OutboundQueue>,
    /// Dispatch counters.
    pub metrics: Arc<dyn BotMetrics>,
}

/// Per-broadcast counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Candidates returned by the proximity query.
    pub considered: usize,
    /// Notifications enqueued.
    pub queued: usize,
    /// Notifications the queue refused.
    pub failed: usize,
    /// Candidates filtered out.
    pub skipped: usize,
}

/// Discovers recipients and enqueues listing notifications.
pub struct FanoutEngine {
    users: Arc<dyn UserRepository>,
    listings: Arc<dyn ListingRepository>,
    queue: Arc<dyn OutboundQueue>,
    metrics: Arc<dyn BotMetrics>,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
}

impl FanoutEngine {
    /// Build an engine.
    #[must_use]
    pub fn new(ports: FanoutPorts, catalog: Arc<Catalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: ports.users,
            listings: ports.listings,
            queue: ports.queue,
            metrics: ports.metrics,
            catalog,
            clock,
        }
    }

    /// Announce a freshly posted listing.
    ///
    /// Recipients are the users within the owner's radius of the listing
    /// origin who sit in the main menu, plus the owner. One recipient's
    /// enqueue failure never stops the others.
    ///
    /// # Errors
    /// `NotFound` when the owner is gone, `InvalidRequest` when the owner has
    /// no radius, and mapped repository errors when the proximity query
    /// fails.
    pub async fn broadcast_listing(&self, listing: &Listing) -> Result<FanoutReport, Error> {
        let owner_id = listing.owner_id();
        let owner = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("listing owner {owner_id} not found")))?;
        let radius_km = owner.search_radius_km().ok_or_else(|| {
            Error::invalid_request(format!("listing owner {owner_id} has no search radius"))
        })?;

        let candidates = self
            .users
            .find_within_radius(listing.origin(), radius_km)
            .await?;

        let mut report = FanoutReport::default();
        for recipient in candidates {
            report.considered += 1;
            let eligible =
                recipient.menu_state() == MenuState::Main || recipient.id() == owner_id;
            let Some(location) = recipient.location().filter(|_| eligible) else {
                debug!(
                    listing_id = %listing.id(),
                    recipient_id = %recipient.id(),
                    menu_state = %recipient.menu_state(),
                    "skipping fanout recipient"
                );
                report.skipped += 1;
                continue;
            };

            let distance_km = rounded_km(listing.origin().distance_km(location));
            let message =
                message::live_notification(&self.catalog, listing, &recipient, distance_km);
            self.enqueue(listing, &recipient, FanoutKind::Live, message, &mut report)
                .await;
        }

        info!(
            listing_id = %listing.id(),
            considered = report.considered,
            queued = report.queued,
            failed = report.failed,
            skipped = report.skipped,
            "live fanout finished"
        );
        Ok(report)
    }

    /// Replay recent listings near `origin` to a user whose location or
    /// radius just changed.
    ///
    /// Posting windows widen from 3 to 30 days until one yields a match.
    /// Users without a radius get an empty report.
    ///
    /// # Errors
    /// `NotFound` when the user is gone, and mapped repository errors.
    pub async fn broadcast_historical(
        &self,
        user_id: UserId,
        origin: GeoPoint,
    ) -> Result<FanoutReport, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))?;
        let Some(radius_km) = user.search_radius_km() else {
            return Ok(FanoutReport::default());
        };

        let now = self.clock.utc();
        let matches = self
            .find_historical(origin, radius_km, user_id, now)
            .await?;

        let mut report = FanoutReport::default();
        for listing in matches {
            report.considered += 1;
            let distance_km = rounded_km(listing.origin().distance_km(origin));
            let age = time_ago(now.signed_duration_since(listing.posted_at()));
            let message =
                message::historical_notification(&self.catalog, &listing, &user, distance_km, age);
            self.enqueue(&listing, &user, FanoutKind::Historical, message, &mut report)
                .await;
        }

        info!(
            user_id = %user_id,
            considered = report.considered,
            queued = report.queued,
            failed = report.failed,
            "historical fanout finished"
        );
        Ok(report)
    }

    async fn find_historical(
        &self,
        center: GeoPoint,
        radius_km: u32,
        exclude_owner: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Listing>, Error> {
        for days in HISTORICAL_WINDOWS_DAYS {
            let query = HistoricalListingQuery {
                center,
                radius_km,
                exclude_owner,
                posted_since: now - Duration::days(days),
                limit: HISTORICAL_LIMIT,
            };
            let found = self.listings.find_posted_near(&query).await?;
            if !found.is_empty() {
                debug!(
                    user_id = %exclude_owner,
                    window_days = days,
                    count = found.len(),
                    "historical window matched"
                );
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }

    async fn enqueue(
        &self,
        listing: &Listing,
        recipient: &User,
        kind: FanoutKind,
        message: OutgoingMessage,
        report: &mut FanoutReport,
    ) {
        let priority = match kind {
            FanoutKind::Live => Priority::LIVE_FANOUT,
            FanoutKind::Historical => Priority::HISTORICAL_FANOUT,
        };
        let envelope = Envelope::listing_notification(
            priority,
            ListingNotification {
                listing_id: listing.id(),
                recipient_id: recipient.id(),
                kind,
                message,
            },
        );

        let enqueued = self.queue.enqueue(&envelope).await;
        if let Err(error) = &enqueued {
            warn!(
                listing_id = %listing.id(),
                recipient_id = %recipient.id(),
                priority = priority.get(),
                error = %error,
                "failed to enqueue listing notification"
            );
        }
        let status = if enqueued.is_ok() {
            report.queued += 1;
            DispatchStatus::Queued
        } else {
            report.failed += 1;
            DispatchStatus::Failed
        };
        log_metrics_failure(self.metrics.record_fanout_message(kind, status).await);
    }
}
