//! User data model.
//!
//! A user is created on the first inbound event, mutated by the session
//! engine and never hard-deleted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GeoPoint, MenuState};

/// Default locale assigned to users whose client reports none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Chat platform identifier of a user.
///
/// Private chats share their id with the user, so the same value addresses
/// the user's chat for outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw platform id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw platform id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Profile fields reported by the chat platform alongside an event.
///
/// Every field is optional: synthetic follow-up events carry none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    /// Public `@handle` without the leading `@`.
    pub username: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Raw IETF language tag reported by the client.
    pub language_code: Option<String>,
}

/// Input payload for [`User::from_draft`], used by storage adapters.
#[derive(Debug, Clone)]
pub struct UserDraft {
    /// Platform id.
    pub id: UserId,
    /// Public handle, empty when unknown.
    pub username: String,
    /// Given name, empty when unknown.
    pub first_name: String,
    /// Family name, empty when unknown.
    pub last_name: String,
    /// Supported language code.
    pub language_code: String,
    /// Last shared location.
    pub location: Option<GeoPoint>,
    /// Search radius in kilometres.
    pub search_radius_km: Option<u32>,
    /// Shared phone number.
    pub phone: Option<String>,
    /// Current dialogue state.
    pub menu_state: MenuState,
}

/// Persistent per-user session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    first_name: String,
    last_name: String,
    language_code: String,
    location: Option<GeoPoint>,
    search_radius_km: Option<u32>,
    phone: Option<String>,
    menu_state: MenuState,
}

impl User {
    /// Fresh record for a user seen for the first time.
    #[must_use]
    pub fn bootstrap(id: UserId) -> Self {
        Self {
            id,
            username: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            language_code: DEFAULT_LANGUAGE.to_owned(),
            location: None,
            search_radius_km: None,
            phone: None,
            menu_state: MenuState::BOOTSTRAP,
        }
    }

    /// Rebuild a user from stored fields.
    #[must_use]
    pub fn from_draft(draft: UserDraft) -> Self {
        let UserDraft {
            id,
            username,
            first_name,
            last_name,
            language_code,
            location,
            search_radius_km,
            phone,
            menu_state,
        } = draft;
        Self {
            id,
            username,
            first_name,
            last_name,
            language_code,
            location,
            search_radius_km,
            phone,
            menu_state,
        }
    }

    /// Platform id.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Public handle, empty when unknown.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Given name, empty when unknown.
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Family name, empty when unknown.
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Supported language code.
    #[must_use]
    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Last shared location.
    #[must_use]
    pub const fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    /// Search radius in kilometres.
    #[must_use]
    pub const fn search_radius_km(&self) -> Option<u32> {
        self.search_radius_km
    }

    /// Shared phone number.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Current dialogue state.
    #[must_use]
    pub const fn menu_state(&self) -> MenuState {
        self.menu_state
    }

    /// Whether the user finished the location and radius onboarding steps.
    #[must_use]
    pub const fn is_onboarded(&self) -> bool {
        self.location.is_some() && self.search_radius_km.is_some()
    }

    /// Move to another dialogue state.
    pub const fn set_menu_state(&mut self, state: MenuState) {
        self.menu_state = state;
    }

    /// Store a shared location.
    pub const fn set_location(&mut self, location: GeoPoint) {
        self.location = Some(location);
    }

    /// Store a search radius.
    pub const fn set_search_radius_km(&mut self, radius_km: u32) {
        self.search_radius_km = Some(radius_km);
    }

    /// Store or clear the phone number.
    pub fn set_phone(&mut self, phone: Option<String>) {
        self.phone = phone.filter(|value| !value.trim().is_empty());
    }

    /// Switch the user's language. Callers pass a supported code.
    pub fn set_language_code(&mut self, code: impl Into<String>) {
        self.language_code = code.into();
    }

    /// Merge platform-reported profile fields into the record.
    ///
    /// Only non-empty values that differ from the stored ones are applied.
    /// The language is taken from the event only for brand-new users, so a
    /// later explicit language choice is never overwritten by the client tag.
    /// `resolve_language` maps the raw tag to a supported code.
    ///
    /// Returns whether anything changed.
    pub fn merge_profile(
        &mut self,
        profile: &SenderProfile,
        is_new: bool,
        resolve_language: impl Fn(&str) -> String,
    ) -> bool {
        let mut changed = false;
        changed |= merge_field(&mut self.username, profile.username.as_deref());
        changed |= merge_field(&mut self.first_name, profile.first_name.as_deref());
        changed |= merge_field(&mut self.last_name, profile.last_name.as_deref());

        if is_new
            && let Some(raw) = profile
                .language_code
                .as_deref()
                .filter(|value| !value.is_empty())
        {
            let resolved = resolve_language(raw);
            if resolved != self.language_code {
                self.language_code = resolved;
                changed = true;
            }
        }
        changed
    }
}

fn merge_field(slot: &mut String, incoming: Option<&str>) -> bool {
    match incoming {
        Some(value) if !value.is_empty() && value != slot.as_str() => {
            value.clone_into(slot);
            true
        }
        _ => false,
    }
}
