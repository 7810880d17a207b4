//! `getUpdates` payload shapes and their mapping onto domain events.

use serde::Deserialize;
use tracing::debug;

use crate::domain::{
    CallbackEvent, CallbackOrigin, GeoPoint, InboundEvent, MessageEvent, MessageId, SenderProfile,
    UserId,
};

/// One Bot API update. Fields the bot does not consume are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UpdateDto {
    /// Monotonic update identifier used for offset tracking.
    pub update_id: i64,
    /// New incoming message.
    #[serde(default)]
    pub message: Option<MessageDto>,
    /// Inline button press.
    #[serde(default)]
    pub callback_query: Option<CallbackQueryDto>,
}

/// Incoming chat message.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MessageDto {
    /// Message handle within the chat.
    pub message_id: i64,
    /// Sender; absent for channel posts.
    #[serde(default)]
    pub from: Option<UserDto>,
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// Shared location.
    #[serde(default)]
    pub location: Option<LocationDto>,
    /// Shared contact card.
    #[serde(default)]
    pub contact: Option<ContactDto>,
}

/// Inline button press.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CallbackQueryDto {
    /// Identifier used by `answerCallbackQuery`.
    pub id: String,
    /// User who pressed the button.
    pub from: UserDto,
    /// Message carrying the button, if still available.
    #[serde(default)]
    pub message: Option<MessageDto>,
    /// Button payload.
    #[serde(default)]
    pub data: Option<String>,
}

/// Bot API user.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserDto {
    /// Telegram user id.
    pub id: i64,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Handle without `@`.
    #[serde(default)]
    pub username: Option<String>,
    /// IETF tag of the client language.
    #[serde(default)]
    pub language_code: Option<String>,
}

/// Shared location.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct LocationDto {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Shared contact card.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ContactDto {
    /// Phone number as entered.
    pub phone_number: String,
    /// Telegram user the contact belongs to, when known.
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl From<&UserDto> for SenderProfile {
    fn from(user: &UserDto) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            language_code: user.language_code.clone(),
        }
    }
}

impl UpdateDto {
    /// Sender and domain event, or `None` for updates the bot ignores.
    #[must_use]
    pub fn into_event(self) -> Option<(UserId, InboundEvent)> {
        if let Some(query) = self.callback_query {
            return Some(callback_event(query));
        }
        let message = self.message?;
        let Some(from) = message.from.as_ref() else {
            debug!(update_id = self.update_id, "ignoring message without sender");
            return None;
        };
        let user_id = UserId::new(from.id);
        Some((user_id, InboundEvent::Message(message_event(&message, from))))
    }
}

fn message_event(message: &MessageDto, from: &UserDto) -> MessageEvent {
    let location = message
        .location
        .and_then(|loc| GeoPoint::new(loc.latitude, loc.longitude).ok());
    // Only the sender's own contact counts as a phone number.
    let contact_phone = message
        .contact
        .as_ref()
        .filter(|contact| contact.user_id == Some(from.id))
        .map(|contact| contact.phone_number.clone());
    MessageEvent {
        text: message.text.clone(),
        location,
        contact_phone,
        profile: SenderProfile::from(from),
    }
}

fn callback_event(query: CallbackQueryDto) -> (UserId, InboundEvent) {
    let origin = query.message.map(|message| CallbackOrigin {
        message_id: MessageId::new(message.message_id),
        text: message.text.unwrap_or_default(),
    });
    let event = CallbackEvent {
        callback_id: query.id,
        data: query.data.unwrap_or_default(),
        origin,
        profile: SenderProfile::from(&query.from),
    };
    (UserId::new(query.from.id), InboundEvent::Callback(event))
}
