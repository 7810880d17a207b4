//! Search radius choice.

use async_trait::async_trait;

use crate::domain::session::context::{SessionContext, answer};
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::{
    CallbackAction, CallbackEvent, Envelope, Error, InlineButton, LocationHistoryEntry, MenuState,
    MessageEvent, OutgoingMessage, RADIUS_OPTIONS_KM, User,
};

const RADIUS_LABEL_KEYS: [&str; 3] = [
    "select_radius_menu.big_city",
    "select_radius_menu.suburbs",
    "select_radius_menu.rural",
];

#[derive(Debug, Default)]
pub(crate) struct SelectRadiusHandler;

#[async_trait]
impl MenuHandler for SelectRadiusHandler {
    fn state(&self) -> MenuState {
        MenuState::SelectRadius
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
        let CallbackAction::Radius(radius_km) = action else {
            return Ok(None);
        };
        user.set_search_radius_km(*radius_km);
        ctx.history
            .append(&LocationHistoryEntry::for_radius(
                user.id(),
                *radius_km,
                ctx.now(),
            ))
            .await?;

        let confirmation = ctx.format(user, "select_radius_menu.radius_confirmed", &[radius_km]);
        Ok(Some(
            Transition::to(MenuState::AskLocation)
                .with(answer(event))
                .with_all(ctx.edit_origin(user, event, confirmation)),
        ))
    }

    fn prompt(&self, ctx: &SessionContext, user: &User) -> Option<Vec<Envelope>> {
        let rows = RADIUS_LABEL_KEYS
            .iter()
            .zip(RADIUS_OPTIONS_KM)
            .map(|(key, km)| vec![InlineButton::new(ctx.text(user, key), CallbackAction::Radius(km))])
            .collect();
        let message =
            OutgoingMessage::text(user.id(), ctx.text(user, "select_radius_menu.message"))
                .with_inline(rows);
        Some(vec![Envelope::reply(message)])
    }
}
