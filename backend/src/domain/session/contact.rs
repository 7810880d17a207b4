//! `contact-request:<id>`: reveal a listing owner to an interested user.

use tracing::{debug, info};

use crate::domain::ports::log_metrics_failure;
use crate::domain::{
    CallbackEvent, Envelope, Error, ListingId, NewContactRequest, OutgoingMessage, Priority, User,
};

use super::context::{SessionContext, answer};
use super::identity::{escape_html, identifier_with_phone};

/// Record the request and exchange identifiers between both parties.
///
/// The pressed notification keeps its text and gains the owner's contact;
/// the owner is told who asked. Missing listings and owners are answered
/// as a no-op.
pub(crate) async fn request_contact(
    ctx: &SessionContext,
    requester: &User,
    event: &CallbackEvent,
    listing_id: ListingId,
) -> Result<Vec<Envelope>, Error> {
    let Some(listing) = ctx.listings.find_by_id(listing_id).await? else {
        debug!(listing_id = %listing_id, "contact requested for a missing listing");
        return Ok(vec![answer(event)]);
    };
    let Some(owner) = ctx.users.find_by_id(listing.owner_id()).await? else {
        debug!(listing_id = %listing_id, "contact requested for a missing owner");
        return Ok(vec![answer(event)]);
    };

    let outcome = ctx
        .contacts
        .create_if_absent(&NewContactRequest {
            listing_id,
            requester_id: requester.id(),
            owner_id: owner.id(),
            requested_at: ctx.now(),
        })
        .await?;
    info!(
        listing_id = %listing_id,
        requester_id = %requester.id(),
        outcome = outcome.as_str(),
        "contact request processed"
    );
    log_metrics_failure(ctx.metrics.record_contact_request(outcome).await);

    let mut effects = vec![answer(event)];

    let owner_contact = identifier_with_phone(&ctx.catalog, requester.language_code(), &owner);
    let contact_line = ctx.format(requester, "contact_request.contact_info", &[&owner_contact]);
    let original = event
        .origin
        .as_ref()
        .map(|origin| escape_html(&origin.text))
        .unwrap_or_default();
    effects.extend(ctx.edit_origin(requester, event, format!("{original}\n\n{contact_line}")));

    let requester_contact = identifier_with_phone(&ctx.catalog, owner.language_code(), requester);
    let notice = ctx.format(&owner, "contact_request.notification", &[&requester_contact]);
    effects.push(Envelope::message(
        Priority::CONTACT_NOTICE,
        OutgoingMessage::text(owner.id(), notice).html(),
    ));
    Ok(effects)
}
