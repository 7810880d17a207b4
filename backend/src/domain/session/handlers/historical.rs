//! Replay of recent nearby listings after onboarding or a location change.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::session::context::{SessionContext, answer};
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::session::contact::request_contact;
use crate::domain::{
    CallbackAction, CallbackEvent, Envelope, Error, InlineButton, MenuState, MessageEvent,
    OutgoingMessage, Priority, User,
};

/// Decides between the wait prompt and the main menu.
#[derive(Debug, Default)]
pub(crate) struct HistoricalExecuteHandler;

#[async_trait]
impl MenuHandler for HistoricalExecuteHandler {
    fn state(&self) -> MenuState {
        MenuState::HistoricalFanoutExecute
    }

    /// Fanout failures fall back to the main menu.
    async fn handle(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        _event: &MessageEvent,
    ) -> Result<Transition, Error> {
        match replay(ctx, user).await {
            Ok(true) => Ok(Transition::to(MenuState::HistoricalFanoutWait)),
            Ok(false) => Ok(Transition::to(MenuState::Main)),
            Err(error) => {
                warn!(user_id = %user.id(), error = %error, "historical fanout failed");
                Ok(Transition::to(MenuState::Main))
            }
        }
    }
}

/// Whether any historical listing was replayed.
async fn replay(ctx: &SessionContext, user: &User) -> Result<bool, Error> {
    if !ctx.trigger.should_trigger(user.id()).await? {
        return Ok(false);
    }
    let (Some(_), Some(location)) = (user.search_radius_km(), user.location()) else {
        return Ok(false);
    };
    let report = ctx.fanout.broadcast_historical(user.id(), location).await?;
    info!(
        user_id = %user.id(),
        considered = report.considered,
        queued = report.queued,
        "historical listings replayed"
    );
    Ok(report.considered > 0)
}

/// Holds the user until the replayed listings have been read.
#[derive(Debug, Default)]
pub(crate) struct HistoricalWaitHandler;

#[async_trait]
impl MenuHandler for HistoricalWaitHandler {
    fn state(&self) -> MenuState {
        MenuState::HistoricalFanoutWait
    }

    async fn handle(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        _event: &MessageEvent,
    ) -> Result<Transition, Error> {
        Ok(Transition::stay().with_all(self.prompt(ctx, user).unwrap_or_default()))
    }

    async fn handle_callback(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        event: &CallbackEvent,
        action: &CallbackAction,
    ) -> Result<Option<Transition>, Error> {
        match action {
            CallbackAction::HistoricalContinue => {
                Ok(Some(Transition::to(MenuState::Main).with(answer(event))))
            }
            CallbackAction::ContactRequest(listing_id) => {
                let effects = request_contact(ctx, user, event, *listing_id).await?;
                Ok(Some(Transition::to(MenuState::Main).with_all(effects)))
            }
            _ => Ok(None),
        }
    }

    /// Sent below every replayed listing thanks to its lower priority.
    fn prompt(&self, ctx: &SessionContext, user: &User) -> Option<Vec<Envelope>> {
        let button = InlineButton::new(
            ctx.text(user, "historical_fanout.button_continue"),
            CallbackAction::HistoricalContinue,
        );
        let message = OutgoingMessage::text(user.id(), ctx.text(user, "historical_fanout.message"))
            .html()
            .with_inline(vec![vec![button]]);
        Some(vec![Envelope::message(Priority::FANOUT_NUDGE, message)])
    }
}

/// The continue button pressed after the wait state was already left.
pub(crate) fn continue_outside_wait(
    ctx: &SessionContext,
    user: &User,
    event: &CallbackEvent,
) -> Transition {
    Transition::to(MenuState::Main)
        .with(answer(event))
        .with_all(ctx.edit_origin(user, event, ctx.text(user, "historical_fanout.message")))
}
