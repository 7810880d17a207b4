//! Idle menu and the start of a new listing.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{ListingEvent, log_metrics_failure};
use crate::domain::session::context::{SessionContext, answer};
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::{
    CallbackAction, CallbackEvent, Direction, Envelope, Error, InlineButton, ListingAction,
    ListingStatus, MenuState, MessageEvent, NewListing, OutgoingMessage, User,
};

use super::amount::amount_prompt;

#[derive(Debug, Default)]
pub(crate) struct MainMenuHandler;

#[async_trait]
impl MenuHandler for MainMenuHandler {
    fn state(&self) -> MenuState {
        MenuState::Main
    }

    async fn handle(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        _event: &MessageEvent,
    ) -> Result<Transition, Error> {
        Ok(Transition::stay().with(main_menu(ctx, user)))
    }

    fn prompt(&self, ctx: &SessionContext, user: &User) -> Option<Vec<Envelope>> {
        Some(vec![main_menu(ctx, user)])
    }
}

/// The two exchange directions.
pub(crate) fn main_menu(ctx: &SessionContext, user: &User) -> Envelope {
    let rows = [Direction::CashToCrypto, Direction::CryptoToCash]
        .into_iter()
        .map(|direction| {
            let key = match direction {
                Direction::CashToCrypto => "main_menu.cash_to_crypto",
                Direction::CryptoToCash => "main_menu.crypto_to_cash",
            };
            vec![InlineButton::new(
                ctx.text(user, key),
                CallbackAction::Listing(ListingAction::Start(direction)),
            )]
        })
        .collect();
    Envelope::reply(
        OutgoingMessage::text(user.id(), ctx.text(user, "main_menu.message"))
            .html()
            .with_inline(rows),
    )
}

/// `listing-action:<direction>`: open a listing and ask for the amount.
///
/// An unfinished listing of the same owner is superseded first. Users
/// without a stored location cannot open listings.
pub(crate) async fn start_listing(
    ctx: &SessionContext,
    user: &User,
    event: &CallbackEvent,
    direction: Direction,
) -> Result<Transition, Error> {
    let now = ctx.now();
    if let Some(mut previous) = ctx.listings.find_latest_for_owner(user.id()).await?
        && previous.status() == ListingStatus::Initiated
    {
        previous
            .supersede(now)
            .map_err(|error| Error::internal(error.to_string()))?;
        ctx.listings.update(&previous).await?;
    }

    let Some(origin) = user.location() else {
        warn!(user_id = %user.id(), "listing requested without a stored location");
        return Ok(Transition::stay().with(answer(event)));
    };
    let listing = ctx
        .listings
        .create(&NewListing {
            owner_id: user.id(),
            direction,
            origin,
            created_at: now,
        })
        .await?;
    info!(
        user_id = %user.id(),
        listing_id = %listing.id(),
        direction = %direction,
        "listing initiated"
    );
    log_metrics_failure(
        ctx.metrics
            .record_listing(ListingEvent::Initiated, direction)
            .await,
    );

    let key = match direction {
        Direction::CashToCrypto => "main_menu.confirmed_cash_to_crypto",
        Direction::CryptoToCash => "main_menu.confirmed_crypto_to_cash",
    };
    Ok(Transition::to(MenuState::Amount)
        .with_all(ctx.edit_origin(user, event, ctx.text(user, key)))
        .with(answer(event))
        .with(amount_prompt(ctx, user)))
}
