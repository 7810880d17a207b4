//! Amount selection for an initiated listing.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{ListingEvent, log_metrics_failure};
use crate::domain::session::context::{SessionContext, answer};
use crate::domain::session::handler::{MenuHandler, Transition};
use crate::domain::{
    AMOUNT_OPTIONS_USD, CallbackAction, CallbackEvent, Envelope, Error, FanoutJob, InlineButton,
    Listing, ListingAction, ListingStatus, MenuState, MessageEvent, OutgoingMessage, User,
};

/// Amount buttons per row; the last row holds the remainder.
const AMOUNTS_PER_ROW: usize = 2;

#[derive(Debug, Default)]
pub(crate) struct AmountHandler;

#[async_trait]
impl MenuHandler for AmountHandler {
    fn state(&self) -> MenuState {
        MenuState::Amount
    }

    /// Only buttons advance this state; text is ignored.
    async fn handle(
        &self,
        _ctx: &SessionContext,
        _user: &mut User,
        _event: &MessageEvent,
    ) -> Result<Transition, Error> {
        Ok(Transition::stay())
    }

    fn prompt(&self, ctx: &SessionContext, user: &User) -> Option<Vec<Envelope>> {
        Some(vec![amount_prompt(ctx, user)])
    }
}

/// Amount buttons two per row, then cancel.
pub(crate) fn amount_prompt(ctx: &SessionContext, user: &User) -> Envelope {
    let mut rows: Vec<Vec<InlineButton>> = AMOUNT_OPTIONS_USD
        .chunks(AMOUNTS_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|usd| {
                    let key = format!("amount_menu.button_{usd}");
                    InlineButton::new(ctx.text(user, &key), CallbackAction::Amount(*usd))
                })
                .collect()
        })
        .collect();
    rows.push(vec![InlineButton::new(
        ctx.text(user, "amount_menu.button_cancel"),
        CallbackAction::Listing(ListingAction::Cancel),
    )]);

    let radius = user.search_radius_km().unwrap_or_default();
    let text = ctx.format(user, "amount_menu.message", &[&radius]);
    Envelope::reply(OutgoingMessage::text(user.id(), text).html().with_inline(rows))
}

async fn latest_initiated(ctx: &SessionContext, user: &User) -> Result<Option<Listing>, Error> {
    Ok(ctx
        .listings
        .find_latest_for_owner(user.id())
        .await?
        .filter(|listing| listing.status() == ListingStatus::Initiated))
}

/// `listing-amount:<usd>`: post the listing and hand it to fanout.
pub(crate) async fn select_amount(
    ctx: &SessionContext,
    user: &User,
    event: &CallbackEvent,
    amount_usd: u32,
) -> Result<Transition, Error> {
    let Some(mut listing) = latest_initiated(ctx, user).await? else {
        return Ok(Transition::stay().with(answer(event)));
    };
    listing
        .post(amount_usd, ctx.now())
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    ctx.listings.update(&listing).await?;
    info!(
        user_id = %user.id(),
        listing_id = %listing.id(),
        amount_usd,
        "listing posted"
    );
    log_metrics_failure(
        ctx.metrics
            .record_listing(ListingEvent::Posted, listing.direction())
            .await,
    );
    if let Err(error) = ctx.scheduler.schedule(FanoutJob::listing(listing.clone())).await {
        warn!(listing_id = %listing.id(), error = %error, "failed to schedule live fanout");
    }

    let confirmation = ctx.format(user, "amount_menu.amount_selected", &[&amount_usd]);
    Ok(Transition::to(MenuState::Main)
        .with_all(ctx.edit_origin(user, event, confirmation))
        .with(answer(event)))
}

/// `listing-action:cancel`: abandon the unfinished listing.
pub(crate) async fn cancel_listing(
    ctx: &SessionContext,
    user: &User,
    event: &CallbackEvent,
) -> Result<Transition, Error> {
    if let Some(mut listing) = latest_initiated(ctx, user).await? {
        listing
            .cancel(ctx.now())
            .map_err(|error| Error::internal(error.to_string()))?;
        ctx.listings.update(&listing).await?;
        log_metrics_failure(
            ctx.metrics
                .record_listing(ListingEvent::Canceled, listing.direction())
                .await,
        );
    }

    Ok(Transition::to(MenuState::Main)
        .with_all(ctx.edit_origin(user, event, ctx.text(user, "amount_menu.canceled")))
        .with(answer(event)))
}
