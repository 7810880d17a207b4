//! Inbound events consumed by the session engine.

use super::{GeoPoint, MessageId, SenderProfile};

/// A chat message sent by the user, or a synthetic follow-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageEvent {
    /// Message text, if any.
    pub text: Option<String>,
    /// Shared location, if any.
    pub location: Option<GeoPoint>,
    /// Phone number from a contact the user shared about themselves.
    pub contact_phone: Option<String>,
    /// Profile fields reported with the message.
    pub profile: SenderProfile,
}

impl MessageEvent {
    /// Empty event used to cascade into the next state's entry action.
    #[must_use]
    pub fn synthetic() -> Self {
        Self::default()
    }

    /// Text message with no profile data.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Trimmed text, treating blank text as absent.
    #[must_use]
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Message a pressed button was attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOrigin {
    /// Message handle.
    pub message_id: MessageId,
    /// Current message text as rendered by the client.
    pub text: String,
}

/// A button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    /// Platform id used to answer the press.
    pub callback_id: String,
    /// Raw callback payload.
    pub data: String,
    /// Message carrying the button, when the platform still has it.
    pub origin: Option<CallbackOrigin>,
    /// Profile fields reported with the press.
    pub profile: SenderProfile,
}

/// Anything the listener hands to the session engine.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A chat message.
    Message(MessageEvent),
    /// A button press.
    Callback(CallbackEvent),
}

impl InboundEvent {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Callback(_) => "callback",
        }
    }

    /// Sender profile reported with the event.
    #[must_use]
    pub const fn profile(&self) -> &SenderProfile {
        match self {
            Self::Message(message) => &message.profile,
            Self::Callback(callback) => &callback.profile,
        }
    }
}
