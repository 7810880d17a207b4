//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated with
//! `diesel print-schema`.

diesel::table! {
    /// Bot users keyed by their chat platform id.
    users (id) {
        /// Platform user id; doubles as the private chat id.
        id -> Int8,
        username -> Text,
        first_name -> Text,
        last_name -> Text,
        /// Resolved catalog language.
        language_code -> Text,
        lat -> Nullable<Float8>,
        lon -> Nullable<Float8>,
        search_radius_km -> Nullable<Int4>,
        phone -> Nullable<Text>,
        /// Stable numeric code of the dialogue node.
        menu_state -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Exchange intents.
    listings (id) {
        id -> Int8,
        owner_id -> Int8,
        direction -> Text,
        status -> Text,
        amount_usd -> Nullable<Int4>,
        lat -> Float8,
        lon -> Float8,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        posted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Delivered listing notifications.
    ///
    /// At most one non-deleted row exists per `(listing_id, recipient_id)`.
    timeline_entries (id) {
        id -> Int8,
        listing_id -> Int8,
        recipient_id -> Int8,
        message_id -> Nullable<Int8>,
        status -> Text,
        is_deleted -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Contact reveals, unique per `(listing_id, requester_id)`.
    contact_requests (id) {
        id -> Int8,
        listing_id -> Int8,
        requester_id -> Int8,
        owner_id -> Int8,
        requested_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only radius and location changes.
    location_history (id) {
        id -> Int8,
        user_id -> Int8,
        radius_km -> Int4,
        lat -> Float8,
        lon -> Float8,
        recorded_at -> Timestamptz,
    }
}

diesel::table! {
    /// One-off notices already emitted per user.
    dismissed_callouts (id) {
        id -> Int8,
        user_id -> Int8,
        feature -> Text,
        dismissed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Durable priority queue feeding the delivery worker.
    outbound_messages (id) {
        id -> Int8,
        priority -> Int2,
        /// Payload variant label, for inspection only.
        kind -> Text,
        payload -> Jsonb,
        /// `pending`, `claimed`, `done` or `poisoned`.
        status -> Text,
        claimed_at -> Nullable<Timestamptz>,
        attempts -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(listings -> users (owner_id));
diesel::joinable!(timeline_entries -> listings (listing_id));
diesel::joinable!(contact_requests -> listings (listing_id));
diesel::joinable!(location_history -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    listings,
    timeline_entries,
    contact_requests,
    location_history,
    dismissed_callouts,
    outbound_messages,
);
