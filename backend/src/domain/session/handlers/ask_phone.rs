//! Optional phone number, shared as a contact or skipped.

use async_trait::async_trait;

use crate::domain::session::context::SessionContext;
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::{
    Envelope, Error, Keyboard, MenuState, MessageEvent, OutgoingMessage, ReplyButton,
    ReplyRequest, User,
};

#[derive(Debug, Default)]
pub(crate) struct AskPhoneHandler;

#[async_trait]
impl MenuHandler for AskPhoneHandler {
    fn state(&self) -> MenuState {
        MenuState::AskPhone
    }

    async fn handle(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        event: &MessageEvent,
    ) -> Result<Transition, Error> {
        let key = if let Some(phone) = event.contact_phone.as_deref() {
            user.set_phone(Some(phone.to_owned()));
            "ask_phone_menu.phone_received"
        } else if event.trimmed_text() == Some(ctx.text(user, "ask_phone_menu.skip_button")) {
            user.set_phone(None);
            "ask_phone_menu.phone_skipped"
        } else {
            return Ok(Transition::stay().with_all(self.prompt(ctx, user).unwrap_or_default()));
        };

        let reply = OutgoingMessage::text(user.id(), ctx.text(user, key))
            .with_keyboard(Keyboard::RemoveReply);
        Ok(Transition::to(MenuState::HistoricalFanoutExecute).with(Envelope::reply(reply)))
    }

    fn prompt(&self, ctx: &SessionContext, user: &User) -> Option<Vec<Envelope>> {
        let keyboard = Keyboard::Reply {
            rows: vec![
                vec![ReplyButton::new(
                    ctx.text(user, "ask_phone_menu.share_button"),
                    ReplyRequest::Contact,
                )],
                vec![ReplyButton::new(
                    ctx.text(user, "ask_phone_menu.skip_button"),
                    ReplyRequest::Text,
                )],
            ],
            one_time: true,
        };
        let message = OutgoingMessage::text(user.id(), ctx.text(user, "ask_phone_menu.message"))
            .with_keyboard(keyboard);
        Some(vec![Envelope::reply(message)])
    }
}
