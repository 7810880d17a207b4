//! Terminal state for users from a restricted jurisdiction.

use async_trait::async_trait;

use crate::domain::session::context::{SessionContext, answer};
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::{
    CallbackAction, CallbackEvent, Envelope, Error, MenuState, MessageEvent, OutgoingMessage, User,
};

#[derive(Debug, Default)]
pub(crate) struct BlockedHandler;

#[async_trait]
impl MenuHandler for BlockedHandler {
    fn state(&self) -> MenuState {
        MenuState::Blocked
    }

    async fn handle(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        _event: &MessageEvent,
    ) -> Result<Transition, Error> {
        Ok(Transition::stay().with_all(self.prompt(ctx, user).unwrap_or_default()))
    }

    /// Every button is swallowed; stale menus must not reopen the dialogue.
    async fn handle_callback(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        event: &CallbackEvent,
        _action: &CallbackAction,
    ) -> Result<Option<Transition>, Error> {
        Ok(Some(
            Transition::stay()
                .with(answer(event))
                .with_all(self.prompt(ctx, user).unwrap_or_default()),
        ))
    }

    fn prompt(&self, ctx: &SessionContext, user: &User) -> Option<Vec<Envelope>> {
        Some(vec![Envelope::reply(OutgoingMessage::text(
            user.id(),
            ctx.text(user, "blocked.message"),
        ))])
    }
}
