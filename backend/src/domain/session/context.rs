//! Shared collaborators handed to every menu handler.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::warn;

use crate::domain::ports::{
    BotMetrics, CalloutRepository, ContactRequestRepository, ListingRepository,
    LocationHistoryRepository, OutboundQueue, TimelineRepository, UserRepository,
};
use crate::domain::{
    CallbackEvent, Catalog, ChatId, Envelope, FanoutEngine, FanoutScheduler, HistoricalTrigger,
    MessageEdit, User,
};

/// Ports, catalog and clock used while handling one event.
pub(crate) struct SessionContext {
    pub(crate) users: Arc<dyn UserRepository>,
    pub(crate) listings: Arc<dyn ListingRepository>,
    pub(crate) timeline: Arc<dyn TimelineRepository>,
    pub(crate) contacts: Arc<dyn ContactRequestRepository>,
    pub(crate) history: Arc<dyn LocationHistoryRepository>,
    pub(crate) callouts: Arc<dyn CalloutRepository>,
    pub(crate) queue: Arc<dyn OutboundQueue>,
    pub(crate) metrics: Arc<dyn BotMetrics>,
    pub(crate) fanout: Arc<FanoutEngine>,
    pub(crate) scheduler: Arc<dyn FanoutScheduler>,
    pub(crate) trigger: HistoricalTrigger,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) admin_chat_id: Option<ChatId>,
}

impl SessionContext {
    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Template in the user's language.
    pub(crate) fn text<'a>(&'a self, user: &User, key: &'a str) -> &'a str {
        self.catalog.get(user.language_code(), key)
    }

    /// Formatted template in the user's language.
    pub(crate) fn format(&self, user: &User, key: &str, args: &[&dyn fmt::Display]) -> String {
        self.catalog.format(user.language_code(), key, args)
    }

    /// Replace the pressed message's text and drop its keyboard.
    ///
    /// `None` when the platform no longer reports the message.
    pub(crate) fn edit_origin(
        &self,
        user: &User,
        event: &CallbackEvent,
        text: impl Into<String>,
    ) -> Option<Envelope> {
        event.origin.as_ref().map(|origin| {
            Envelope::edit(MessageEdit::text(user.id(), origin.message_id, text).html())
        })
    }

    /// Hand effects to the outbound queue, continuing past failures.
    pub(crate) async fn enqueue_all(&self, effects: Vec<Envelope>) {
        for envelope in effects {
            if let Err(error) = self.queue.enqueue(&envelope).await {
                warn!(
                    message_type = envelope.payload.kind_label(),
                    priority = envelope.priority.get(),
                    error = %error,
                    "failed to enqueue session output"
                );
            }
        }
    }
}

/// Silent acknowledgement of a button press.
pub(crate) fn answer(event: &CallbackEvent) -> Envelope {
    Envelope::answer(event.callback_id.clone())
}
