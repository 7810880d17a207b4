//! `delete-listing:<id>`: retract a listing and every notification of it.

use tracing::{info, warn};

use crate::domain::ports::{ListingEvent, log_metrics_failure};
use crate::domain::{
    CallbackEvent, DEFAULT_LANGUAGE, Envelope, Error, ListingId, MessageEdit, User, UserId,
};

use super::context::{SessionContext, answer};

/// Soft-delete the listing and rewrite each delivered notification.
///
/// Only the owner may delete; anyone else is answered and logged as a
/// security event.
pub(crate) async fn delete_listing(
    ctx: &SessionContext,
    user: &User,
    event: &CallbackEvent,
    listing_id: ListingId,
) -> Result<Vec<Envelope>, Error> {
    let Some(listing) = ctx.listings.find_by_id(listing_id).await? else {
        return Ok(vec![answer(event)]);
    };
    if listing.owner_id() != user.id() {
        warn!(
            security_event = true,
            listing_id = %listing_id,
            owner_id = %listing.owner_id(),
            user_id = %user.id(),
            "non-owner attempted to delete a listing"
        );
        return Ok(vec![answer(event)]);
    }

    let now = ctx.now();
    let mut effects = vec![answer(event)];
    ctx.listings.soft_delete(listing_id, now).await?;
    log_metrics_failure(
        ctx.metrics
            .record_listing(ListingEvent::Deleted, listing.direction())
            .await,
    );

    let entries = ctx.timeline.list_for_listing(listing_id).await?;
    let retracted = ctx.timeline.mark_deleted_for_listing(listing_id, now).await?;
    info!(
        listing_id = %listing_id,
        notifications = entries.len(),
        retracted,
        "listing deleted"
    );

    for entry in entries {
        let Some(message_id) = entry.editable_message() else {
            continue;
        };
        let text = if entry.recipient_id == user.id() {
            ctx.text(user, "delete_exchange.deleted_by_you").to_owned()
        } else {
            let language = recipient_language(ctx, entry.recipient_id).await;
            ctx.catalog
                .get(&language, "delete_exchange.deleted_by_author")
                .to_owned()
        };
        effects.push(Envelope::edit(MessageEdit::text(
            entry.recipient_id,
            message_id,
            text,
        )));
    }
    Ok(effects)
}

async fn recipient_language(ctx: &SessionContext, recipient_id: UserId) -> String {
    match ctx.users.find_by_id(recipient_id).await {
        Ok(Some(recipient)) => recipient.language_code().to_owned(),
        Ok(None) => DEFAULT_LANGUAGE.to_owned(),
        Err(error) => {
            warn!(recipient_id = %recipient_id, error = %error, "recipient lookup failed");
            DEFAULT_LANGUAGE.to_owned()
        }
    }
}
