//! Location request.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::session::context::SessionContext;
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::{
    Envelope, Error, Keyboard, MenuState, MessageEvent, OutgoingMessage, ReplyButton,
    ReplyRequest, User,
};

#[derive(Debug, Default)]
pub(crate) struct AskLocationHandler;

#[async_trait]
impl MenuHandler for AskLocationHandler {
    fn state(&self) -> MenuState {
        MenuState::AskLocation
    }

    async fn handle(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        event: &MessageEvent,
    ) -> Result<Transition, Error> {
        let Some(location) = event.location else {
            return Ok(Transition::stay().with_all(self.prompt(ctx, user).unwrap_or_default()));
        };

        user.set_location(location);
        let updated = ctx
            .history
            .update_latest_coordinates(user.id(), location)
            .await?;
        if !updated {
            debug!(user_id = %user.id(), "location shared without a radius history entry");
        }

        let confirmation = OutgoingMessage::text(
            user.id(),
            ctx.text(user, "ask_location_menu.location_received"),
        )
        .with_keyboard(Keyboard::RemoveReply);
        Ok(Transition::to(MenuState::AskPhone).with(Envelope::reply(confirmation)))
    }

    fn prompt(&self, ctx: &SessionContext, user: &User) -> Option<Vec<Envelope>> {
        let keyboard = Keyboard::Reply {
            rows: vec![vec![ReplyButton::new(
                ctx.text(user, "ask_location_menu.next_button"),
                ReplyRequest::Location,
            )]],
            one_time: true,
        };
        let message = OutgoingMessage::text(user.id(), ctx.text(user, "ask_location_menu.message"))
            .with_keyboard(keyboard);
        Some(vec![Envelope::reply(message)])
    }
}
