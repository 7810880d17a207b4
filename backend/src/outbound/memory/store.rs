//! Repositories backed by one in-process state map.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::ports::{
    CalloutRepository, CalloutRepositoryError, ContactRequestRepository,
    ContactRequestRepositoryError, HistoricalListingQuery, ListingRepository,
    ListingRepositoryError, LocationHistoryRepository, LocationHistoryRepositoryError,
    TimelineRepository, TimelineRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    ContactRequestOutcome, GeoPoint, Listing, ListingDraft, ListingId, ListingStatus,
    LocationHistoryEntry, NewContactRequest, NewListing, NewTimelineEntry, TimelineEntry,
    TimelineStatus, User, UserId, haversine_km,
};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    listings: BTreeMap<ListingId, Listing>,
    deleted_listings: BTreeMap<ListingId, DateTime<Utc>>,
    next_listing_id: i64,
    timeline: Vec<TimelineEntry>,
    next_timeline_id: i64,
    contacts: BTreeSet<(ListingId, UserId)>,
    history: BTreeMap<UserId, Vec<LocationHistoryEntry>>,
    callouts: BTreeSet<(UserId, String)>,
}

impl State {
    fn live_listing(&self, id: ListingId) -> Option<&Listing> {
        if self.deleted_listings.contains_key(&id) {
            return None;
        }
        self.listings.get(&id)
    }

    fn live_listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings
            .values()
            .filter(|listing| !self.deleted_listings.contains_key(&listing.id()))
    }
}

/// Every repository port over shared in-memory state.
///
/// Used by the integration tests and for running the bot without a
/// database. Distances use the same haversine formula as the
/// `great_circle_km` SQL function.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored listing, deleted ones included, in id order.
    pub async fn listings(&self) -> Vec<Listing> {
        self.state.lock().await.listings.values().cloned().collect()
    }

    /// Every timeline entry in insertion order.
    pub async fn timeline_entries(&self) -> Vec<TimelineEntry> {
        self.state.lock().await.timeline.clone()
    }
}

fn within(center: GeoPoint, point: GeoPoint, radius_km: u32) -> bool {
    haversine_km(center, point) <= f64::from(radius_km)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn save(&self, user: &User) -> Result<(), UserRepositoryError> {
        self.state.lock().await.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_within_radius(
        &self,
        center: GeoPoint,
        radius_km: u32,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.state.lock().await;
        let mut found: Vec<(f64, User)> = state
            .users
            .values()
            .filter_map(|user| {
                let location = user.location()?;
                within(center, location, radius_km)
                    .then(|| (haversine_km(center, location), user.clone()))
            })
            .collect();
        found.sort_by(|(a_km, a), (b_km, b)| a_km.total_cmp(b_km).then(a.id().cmp(&b.id())));
        Ok(found.into_iter().map(|(_, user)| user).collect())
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn create(&self, listing: &NewListing) -> Result<Listing, ListingRepositoryError> {
        let mut state = self.state.lock().await;
        state.next_listing_id += 1;
        let stored = Listing::from_draft(ListingDraft {
            id: ListingId::new(state.next_listing_id),
            owner_id: listing.owner_id,
            direction: listing.direction,
            status: ListingStatus::Initiated,
            amount_usd: None,
            origin: listing.origin,
            deleted_at: None,
            created_at: listing.created_at,
            updated_at: listing.created_at,
            posted_at: None,
        });
        state.listings.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, ListingRepositoryError> {
        Ok(self.state.lock().await.live_listing(id).cloned())
    }

    async fn find_latest_for_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Option<Listing>, ListingRepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .live_listings()
            .filter(|listing| listing.owner_id() == owner_id)
            .max_by_key(|listing| (listing.created_at(), listing.id()))
            .cloned())
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingRepositoryError> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.listings.get_mut(&listing.id()) else {
            return Err(ListingRepositoryError::query(format!(
                "listing {} does not exist",
                listing.id()
            )));
        };
        *stored = listing.clone();
        Ok(())
    }

    async fn soft_delete(
        &self,
        id: ListingId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, ListingRepositoryError> {
        let mut state = self.state.lock().await;
        if state.live_listing(id).is_none() {
            return Ok(false);
        }
        state.deleted_listings.insert(id, deleted_at);
        Ok(true)
    }

    async fn find_posted_near(
        &self,
        query: &HistoricalListingQuery,
    ) -> Result<Vec<Listing>, ListingRepositoryError> {
        let state = self.state.lock().await;
        let mut newest_per_owner: BTreeMap<UserId, &Listing> = BTreeMap::new();
        for listing in state.live_listings().filter(|listing| {
            listing.status() == ListingStatus::Posted
                && listing.owner_id() != query.exclude_owner
                && listing.posted_at() >= query.posted_since
                && within(query.center, listing.origin(), query.radius_km)
        }) {
            let key = (listing.posted_at(), listing.id());
            newest_per_owner
                .entry(listing.owner_id())
                .and_modify(|current| {
                    if key > (current.posted_at(), current.id()) {
                        *current = listing;
                    }
                })
                .or_insert(listing);
        }

        let mut found: Vec<Listing> = newest_per_owner.into_values().cloned().collect();
        found.sort_by_key(|listing| (listing.posted_at(), listing.id()));
        found.truncate(query.limit);
        Ok(found)
    }
}

#[async_trait]
impl TimelineRepository for MemoryStore {
    async fn record(&self, entry: &NewTimelineEntry) -> Result<(), TimelineRepositoryError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.timeline.iter_mut().find(|existing| {
            existing.listing_id == entry.listing_id
                && existing.recipient_id == entry.recipient_id
                && !existing.is_deleted
        }) {
            existing.message_id = entry.message_id;
            existing.status = entry.status;
            existing.updated_at = entry.recorded_at;
            return Ok(());
        }

        state.next_timeline_id += 1;
        let id = state.next_timeline_id;
        state.timeline.push(TimelineEntry {
            id,
            listing_id: entry.listing_id,
            recipient_id: entry.recipient_id,
            message_id: entry.message_id,
            status: entry.status,
            is_deleted: false,
            updated_at: entry.recorded_at,
        });
        Ok(())
    }

    async fn list_for_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<Vec<TimelineEntry>, TimelineRepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .timeline
            .iter()
            .filter(|entry| entry.listing_id == listing_id)
            .copied()
            .collect())
    }

    async fn mark_deleted_for_listing(
        &self,
        listing_id: ListingId,
        deleted_at: DateTime<Utc>,
    ) -> Result<usize, TimelineRepositoryError> {
        let mut state = self.state.lock().await;
        let mut affected = 0;
        for entry in state
            .timeline
            .iter_mut()
            .filter(|entry| entry.listing_id == listing_id && !entry.is_deleted)
        {
            entry.is_deleted = true;
            entry.status = TimelineStatus::Deleted;
            entry.updated_at = deleted_at;
            affected += 1;
        }
        Ok(affected)
    }
}

#[async_trait]
impl ContactRequestRepository for MemoryStore {
    async fn exists(
        &self,
        listing_id: ListingId,
        requester_id: UserId,
    ) -> Result<bool, ContactRequestRepositoryError> {
        let state = self.state.lock().await;
        Ok(state.contacts.contains(&(listing_id, requester_id)))
    }

    async fn create_if_absent(
        &self,
        request: &NewContactRequest,
    ) -> Result<ContactRequestOutcome, ContactRequestRepositoryError> {
        let mut state = self.state.lock().await;
        Ok(
            if state
                .contacts
                .insert((request.listing_id, request.requester_id))
            {
                ContactRequestOutcome::Created
            } else {
                ContactRequestOutcome::AlreadyRequested
            },
        )
    }
}

#[async_trait]
impl LocationHistoryRepository for MemoryStore {
    async fn append(&self, entry: &LocationHistoryEntry) -> Result<(), LocationHistoryRepositoryError> {
        let mut state = self.state.lock().await;
        state.history.entry(entry.user_id).or_default().push(*entry);
        Ok(())
    }

    async fn update_latest_coordinates(
        &self,
        user_id: UserId,
        location: GeoPoint,
    ) -> Result<bool, LocationHistoryRepositoryError> {
        let mut state = self.state.lock().await;
        let Some(latest) = state
            .history
            .get_mut(&user_id)
            .and_then(|entries| entries.last_mut())
        else {
            return Ok(false);
        };
        latest.lat = location.lat();
        latest.lon = location.lon();
        Ok(true)
    }

    async fn latest(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<LocationHistoryEntry>, LocationHistoryRepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .history
            .get(&user_id)
            .map(|entries| entries.iter().rev().take(limit).copied().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CalloutRepository for MemoryStore {
    async fn is_dismissed(&self, user_id: UserId, feature: &str) -> Result<bool, CalloutRepositoryError> {
        let state = self.state.lock().await;
        Ok(state.callouts.contains(&(user_id, feature.to_owned())))
    }

    async fn dismiss(&self, user_id: UserId, feature: &str) -> Result<(), CalloutRepositoryError> {
        let mut state = self.state.lock().await;
        state.callouts.insert((user_id, feature.to_owned()));
        Ok(())
    }
}
