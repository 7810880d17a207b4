//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversion into domain records happens in
//! the repository that owns the table.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{
    contact_requests, dismissed_callouts, listings, location_history, outbound_messages,
    timeline_entries, users,
};

/// Row struct for reading from the users table.
///
/// Also loadable by name so the raw geospatial query can reuse it.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub language_code: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub search_radius_km: Option<i32>,
    pub phone: Option<String>,
    pub menu_state: i32,
}

/// Insert-or-overwrite payload for the users table.
///
/// `None` clears the column on update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserUpsert<'a> {
    pub id: i64,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub language_code: &'a str,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub search_radius_km: Option<i32>,
    pub phone: Option<&'a str>,
    pub menu_state: i32,
}

// ---------------------------------------------------------------------------
// Listing models
// ---------------------------------------------------------------------------

/// Row struct for reading from the listings table.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ListingRow {
    pub id: i64,
    pub owner_id: i64,
    pub direction: String,
    pub status: String,
    pub amount_usd: Option<i32>,
    pub lat: f64,
    pub lon: f64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Insertable struct for creating `initiated` listings.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = listings)]
pub(crate) struct NewListingRow<'a> {
    pub owner_id: i64,
    pub direction: &'a str,
    pub status: &'a str,
    pub lat: f64,
    pub lon: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset applied when a listing moves through its lifecycle.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = listings)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ListingUpdate<'a> {
    pub status: &'a str,
    pub amount_usd: Option<i32>,
    pub updated_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Timeline models
// ---------------------------------------------------------------------------

/// Row struct for reading from the timeline_entries table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = timeline_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TimelineEntryRow {
    pub id: i64,
    pub listing_id: i64,
    pub recipient_id: i64,
    pub message_id: Option<i64>,
    pub status: String,
    pub is_deleted: bool,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Contact request models
// ---------------------------------------------------------------------------

/// Insertable struct for contact requests.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = contact_requests)]
pub(crate) struct NewContactRequestRow {
    pub listing_id: i64,
    pub requester_id: i64,
    pub owner_id: i64,
    pub requested_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Location history models
// ---------------------------------------------------------------------------

/// Read and insert shape of a location history entry.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = location_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LocationHistoryRow {
    pub user_id: i64,
    pub radius_km: i32,
    pub lat: f64,
    pub lon: f64,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Callout models
// ---------------------------------------------------------------------------

/// Insertable struct recording a dismissed callout.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = dismissed_callouts)]
pub(crate) struct NewDismissedCalloutRow<'a> {
    pub user_id: i64,
    pub feature: &'a str,
}

// ---------------------------------------------------------------------------
// Outbound queue models
// ---------------------------------------------------------------------------

/// Insertable struct for queued envelopes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = outbound_messages)]
pub(crate) struct NewOutboundMessageRow<'a> {
    pub priority: i16,
    pub kind: &'a str,
    pub payload: serde_json::Value,
}

/// Columns returned by the claim statement.
#[derive(Debug, Clone, QueryableByName)]
#[diesel(table_name = outbound_messages)]
pub(crate) struct ClaimedMessageRow {
    pub id: i64,
    pub priority: i16,
    pub payload: serde_json::Value,
    pub attempts: i32,
}
