//! Append-only history of a user's search radius and location.
//!
//! Selecting a radius appends an entry with zero coordinates; the following
//! location message fills in the coordinates of that newest entry.

use chrono::{DateTime, Utc};

use super::UserId;

/// One recorded (radius, lat, lon) sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationHistoryEntry {
    /// User the sample belongs to.
    pub user_id: UserId,
    /// Search radius in kilometres.
    pub radius_km: u32,
    /// Latitude, zero until a location is shared.
    pub lat: f64,
    /// Longitude, zero until a location is shared.
    pub lon: f64,
    /// Append instant.
    pub recorded_at: DateTime<Utc>,
}

impl LocationHistoryEntry {
    /// Entry appended when a radius is chosen.
    #[must_use]
    pub const fn for_radius(user_id: UserId, radius_km: u32, recorded_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            radius_km,
            lat: 0.0,
            lon: 0.0,
            recorded_at,
        }
    }

    #[expect(clippy::float_cmp, reason = "stored coordinates are compared verbatim")]
    const fn differs_from(&self, other: &Self) -> bool {
        self.radius_km != other.radius_km || self.lat != other.lat || self.lon != other.lon
    }
}

/// Decide whether the latest profile change warrants a historical replay.
///
/// `newest_first` holds the most recent entries, newest at index zero. The
/// first-ever entry always triggers; afterwards only a difference between the
/// two newest entries does.
#[must_use]
pub const fn should_trigger(newest_first: &[LocationHistoryEntry]) -> bool {
    match newest_first {
        [] => false,
        [_] => true,
        [latest, previous, ..] => latest.differs_from(previous),
    }
}
