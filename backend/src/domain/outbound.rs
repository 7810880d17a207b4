//! Outbound dispatch contract.
//!
//! Handlers and the fanout engine never talk to the chat transport directly.
//! They build [`Envelope`]s, each carrying a priority byte, and hand them to
//! the durable outbound queue drained by the delivery worker.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ListingId, UserId};

/// Chat addressed by an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(i64);

impl ChatId {
    /// Wrap a raw chat id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw chat id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<UserId> for ChatId {
    fn from(value: UserId) -> Self {
        Self(value.get())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport handle of a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Wrap a raw message id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw message id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Queue ordering hint; higher drains first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    /// Callback answers clear the client's spinner and go first.
    pub const CALLBACK_ANSWER: Self = Self(255);
    /// Direct replies to the user who sent the event.
    pub const DIRECT_REPLY: Self = Self(220);
    /// Edits of earlier messages.
    pub const EDIT: Self = Self(200);
    /// New-user notice posted to the admin channel.
    pub const ADMIN_NOTICE: Self = Self(200);
    /// Live listing notifications.
    pub const LIVE_FANOUT: Self = Self(100);
    /// Contact request notice sent to a listing owner.
    pub const CONTACT_NOTICE: Self = Self(100);
    /// Historical listing replays.
    pub const HISTORICAL_FANOUT: Self = Self(80);
    /// Continue prompt shown after a historical replay.
    pub const FANOUT_NUDGE: Self = Self(70);

    /// Wrap a raw priority byte.
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw priority byte.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Text formatting mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Text is sent verbatim.
    #[default]
    Plain,
    /// Text carries Telegram-flavoured HTML.
    Html,
}

/// Button attached to a message that sends a callback payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    /// Visible label.
    pub text: String,
    /// Callback payload delivered when pressed.
    pub callback_data: String,
}

impl InlineButton {
    /// Build a callback button.
    #[must_use]
    pub fn new(text: impl Into<String>, callback_data: impl fmt::Display) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.to_string(),
        }
    }
}

/// What a reply keyboard button asks the client to share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyRequest {
    /// Plain text button.
    #[default]
    Text,
    /// Shares the device location.
    Location,
    /// Shares the user's phone contact.
    Contact,
}

/// Button on a custom reply keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    /// Visible label, sent back as text for [`ReplyRequest::Text`].
    pub text: String,
    /// Data requested from the client.
    pub request: ReplyRequest,
}

impl ReplyButton {
    /// Build a reply keyboard button.
    #[must_use]
    pub fn new(text: impl Into<String>, request: ReplyRequest) -> Self {
        Self {
            text: text.into(),
            request,
        }
    }
}

/// Inline keyboard rows.
pub type InlineRows = Vec<Vec<InlineButton>>;

/// Keyboard attached to a new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Keyboard {
    /// Buttons under the message.
    Inline {
        /// Button rows.
        rows: InlineRows,
    },
    /// Custom reply keyboard replacing the client keyboard.
    Reply {
        /// Button rows.
        rows: Vec<Vec<ReplyButton>>,
        /// Hide the keyboard after one use.
        one_time: bool,
    },
    /// Remove any custom reply keyboard.
    RemoveReply,
}

/// A new chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Destination chat.
    pub chat_id: ChatId,
    /// Body text.
    pub text: String,
    /// Formatting mode.
    #[serde(default)]
    pub parse_mode: ParseMode,
    /// Optional keyboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl OutgoingMessage {
    /// Plain text message without a keyboard.
    #[must_use]
    pub fn text(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: ParseMode::Plain,
            keyboard: None,
        }
    }

    /// Switch to HTML formatting.
    #[must_use]
    pub const fn html(mut self) -> Self {
        self.parse_mode = ParseMode::Html;
        self
    }

    /// Attach inline buttons.
    #[must_use]
    pub fn with_inline(mut self, rows: InlineRows) -> Self {
        self.keyboard = Some(Keyboard::Inline { rows });
        self
    }

    /// Attach any keyboard.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Replacement text (and inline keyboard) for an earlier message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEdit {
    /// Chat holding the message.
    pub chat_id: ChatId,
    /// Message to edit.
    pub message_id: MessageId,
    /// New body text.
    pub text: String,
    /// Formatting mode.
    #[serde(default)]
    pub parse_mode: ParseMode,
    /// New inline keyboard; `None` removes the existing one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_rows: Option<InlineRows>,
}

impl MessageEdit {
    /// Replace a message's text and drop its keyboard.
    #[must_use]
    pub fn text(chat_id: impl Into<ChatId>, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
            text: text.into(),
            parse_mode: ParseMode::Plain,
            inline_rows: None,
        }
    }

    /// Switch to HTML formatting.
    #[must_use]
    pub const fn html(mut self) -> Self {
        self.parse_mode = ParseMode::Html;
        self
    }

    /// Keep inline buttons under the edited message.
    #[must_use]
    pub fn with_inline(mut self, rows: InlineRows) -> Self {
        self.inline_rows = Some(rows);
        self
    }
}

/// Acknowledgement of a button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackAnswer {
    /// Platform id of the callback query.
    pub callback_id: String,
    /// Optional toast text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Origin of a listing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutKind {
    /// Sent when the listing was posted.
    Live,
    /// Replayed to a user whose location or radius changed.
    Historical,
}

impl FanoutKind {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Historical => "historical",
        }
    }
}

/// A listing announcement whose delivery is tracked on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingNotification {
    /// Announced listing.
    pub listing_id: ListingId,
    /// Receiving user.
    pub recipient_id: UserId,
    /// Live or historical.
    pub kind: FanoutKind,
    /// Rendered message.
    pub message: OutgoingMessage,
}

/// Transport operation carried by an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Send a new message.
    Message(OutgoingMessage),
    /// Edit an earlier message.
    Edit(MessageEdit),
    /// Answer a button press.
    CallbackAnswer(CallbackAnswer),
    /// Send a tracked listing notification.
    ListingNotification(ListingNotification),
}

impl Payload {
    /// Stable label used for metrics and the queue's `kind` column.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Edit(_) => "edit",
            Self::CallbackAnswer(_) => "callback_answer",
            Self::ListingNotification(_) => "listing_notification",
        }
    }
}

/// Priority-tagged unit of outbound work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Queue ordering hint.
    pub priority: Priority,
    /// Operation to perform.
    pub payload: Payload,
}

impl Envelope {
    /// Wrap a payload with an explicit priority.
    #[must_use]
    pub const fn new(priority: Priority, payload: Payload) -> Self {
        Self { priority, payload }
    }

    /// Direct reply at [`Priority::DIRECT_REPLY`].
    #[must_use]
    pub const fn reply(message: OutgoingMessage) -> Self {
        Self::new(Priority::DIRECT_REPLY, Payload::Message(message))
    }

    /// New message at a custom priority.
    #[must_use]
    pub const fn message(priority: Priority, message: OutgoingMessage) -> Self {
        Self::new(priority, Payload::Message(message))
    }

    /// Edit at [`Priority::EDIT`].
    #[must_use]
    pub const fn edit(edit: MessageEdit) -> Self {
        Self::new(Priority::EDIT, Payload::Edit(edit))
    }

    /// Silent callback answer at [`Priority::CALLBACK_ANSWER`].
    #[must_use]
    pub fn answer(callback_id: impl Into<String>) -> Self {
        Self::new(
            Priority::CALLBACK_ANSWER,
            Payload::CallbackAnswer(CallbackAnswer {
                callback_id: callback_id.into(),
                text: None,
            }),
        )
    }

    /// Tracked listing notification.
    #[must_use]
    pub const fn listing_notification(priority: Priority, notification: ListingNotification) -> Self {
        Self::new(priority, Payload::ListingNotification(notification))
    }
}
