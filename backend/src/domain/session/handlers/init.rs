//! Welcome step and the one-off admin notice about a new user.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::ports::ADMIN_NEW_USER_CALLOUT;
use crate::domain::session::context::SessionContext;
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::session::identity::identifier;
use crate::domain::{
    ChatId, Envelope, Error, MenuState, MessageEvent, OutgoingMessage, Priority, User,
    english_name,
};

#[derive(Debug, Default)]
pub(crate) struct InitHandler;

#[async_trait]
impl MenuHandler for InitHandler {
    fn state(&self) -> MenuState {
        MenuState::Init
    }

    async fn handle(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        _event: &MessageEvent,
    ) -> Result<Transition, Error> {
        let language = english_name(user.language_code());
        let welcome = ctx.format(user, "init_menu.welcome", &[&language]);
        let transition = Transition::to(MenuState::SelectRadius)
            .with(Envelope::reply(OutgoingMessage::text(user.id(), welcome)));

        let Some(admin_chat_id) = ctx.admin_chat_id else {
            return Ok(transition);
        };
        Ok(transition.with_all(admin_notice(ctx, user, admin_chat_id).await))
    }
}

/// Notice for the admin channel, at most once per user.
///
/// Callout store failures skip the notice rather than the welcome.
async fn admin_notice(ctx: &SessionContext, user: &User, chat_id: ChatId) -> Option<Envelope> {
    match ctx
        .callouts
        .is_dismissed(user.id(), ADMIN_NEW_USER_CALLOUT)
        .await
    {
        Ok(true) => return None,
        Ok(false) => {}
        Err(error) => {
            warn!(user_id = %user.id(), error = %error, "failed to read admin callout");
            return None;
        }
    }
    if let Err(error) = ctx.callouts.dismiss(user.id(), ADMIN_NEW_USER_CALLOUT).await {
        warn!(user_id = %user.id(), error = %error, "failed to dismiss admin callout");
        return None;
    }

    let text = format!(
        "New user joined LibreCash: {}\nLanguage: {}",
        identifier(user),
        english_name(user.language_code())
    );
    Some(Envelope::message(
        Priority::ADMIN_NOTICE,
        OutgoingMessage::text(chat_id, text).html(),
    ))
}
