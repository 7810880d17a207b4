//! Jurisdiction question asked before onboarding.

use async_trait::async_trait;

use crate::domain::session::context::{SessionContext, answer};
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::{
    CallbackAction, CallbackEvent, Envelope, Error, InlineButton, MenuState, MessageEvent,
    OutgoingMessage, User,
};

#[derive(Debug, Default)]
pub(crate) struct ComplianceHandler;

#[async_trait]
impl MenuHandler for ComplianceHandler {
    fn state(&self) -> MenuState {
        MenuState::ComplianceCheck
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
        let CallbackAction::Compliance { restricted } = action else {
            return Ok(None);
        };
        let next = if *restricted {
            MenuState::Blocked
        } else {
            MenuState::Init
        };
        Ok(Some(
            Transition::to(next)
                .with(answer(event))
                .with_all(ctx.edit_origin(user, event, ctx.text(user, "us_compliance.question"))),
        ))
    }

    fn prompt(&self, ctx: &SessionContext, user: &User) -> Option<Vec<Envelope>> {
        let buttons = vec![
            InlineButton::new(
                ctx.text(user, "us_compliance.button_yes"),
                CallbackAction::Compliance { restricted: true },
            ),
            InlineButton::new(
                ctx.text(user, "us_compliance.button_no"),
                CallbackAction::Compliance { restricted: false },
            ),
        ];
        let question = OutgoingMessage::text(user.id(), ctx.text(user, "us_compliance.question"))
            .with_inline(vec![buttons]);
        Some(vec![Envelope::reply(question)])
    }
}
