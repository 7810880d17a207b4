//! Localised rendering of listing notifications.

use crate::domain::{
    CallbackAction, Catalog, Direction, InlineButton, Listing, OutgoingMessage, TimeAgo, User,
};

/// How the recipient relates to the announced listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Author,
    Counterparty,
}

impl Audience {
    fn of(listing: &Listing, recipient: &User) -> Self {
        if recipient.id() == listing.owner_id() {
            Self::Author
        } else {
            Self::Counterparty
        }
    }
}

/// Live notification: the author gets a delete button, everyone else a
/// show-contact button and the distance.
pub(super) fn live_notification(
    catalog: &Catalog,
    listing: &Listing,
    recipient: &User,
    distance_km: i64,
) -> OutgoingMessage {
    let lang = recipient.language_code();
    let audience = Audience::of(listing, recipient);
    let header = match audience {
        Audience::Author => catalog.get(lang, "fanout.author_notification_header"),
        Audience::Counterparty => catalog.get(lang, "fanout.notification_header"),
    };

    let mut lines = vec![header.to_owned(), String::new()];
    lines.extend(direction_lines(catalog, lang, listing.direction(), audience));
    if let Some(amount) = listing.amount_usd() {
        lines.push(catalog.format(lang, "fanout.notification_amount", &[&amount]));
    }

    let button = match audience {
        Audience::Author => InlineButton::new(
            catalog.get(lang, "fanout.button_delete"),
            CallbackAction::DeleteListing(listing.id()),
        ),
        Audience::Counterparty => {
            lines.push(catalog.format(lang, "fanout.notification_distance", &[&distance_km]));
            InlineButton::new(
                catalog.get(lang, "fanout.button_show_contact"),
                CallbackAction::ContactRequest(listing.id()),
            )
        }
    };

    OutgoingMessage::text(recipient.id(), lines.join("\n"))
        .html()
        .with_inline(vec![vec![button]])
}

/// Historical replay: always counterparty copy, prefixed with the listing age.
pub(super) fn historical_notification(
    catalog: &Catalog,
    listing: &Listing,
    recipient: &User,
    distance_km: i64,
    age: TimeAgo,
) -> OutgoingMessage {
    let lang = recipient.language_code();
    let age_text = catalog.format(lang, age.key, &[&age.count]);

    let mut lines = vec![
        catalog.format(lang, "fanout.historical_notification_header", &[&age_text]),
        String::new(),
    ];
    lines.extend(direction_lines(
        catalog,
        lang,
        listing.direction(),
        Audience::Counterparty,
    ));
    if let Some(amount) = listing.amount_usd() {
        lines.push(catalog.format(lang, "fanout.notification_amount", &[&amount]));
    }
    lines.push(catalog.format(lang, "fanout.notification_distance", &[&distance_km]));

    let button = InlineButton::new(
        catalog.get(lang, "fanout.button_show_contact"),
        CallbackAction::ContactRequest(listing.id()),
    );
    OutgoingMessage::text(recipient.id(), lines.join("\n"))
        .html()
        .with_inline(vec![vec![button]])
}

fn direction_lines(
    catalog: &Catalog,
    lang: &str,
    direction: Direction,
    audience: Audience,
) -> [String; 2] {
    let keys = match (audience, direction) {
        (Audience::Author, Direction::CashToCrypto) => [
            "fanout.author_notification_have_cash",
            "fanout.author_notification_need_crypto",
        ],
        (Audience::Author, Direction::CryptoToCash) => [
            "fanout.author_notification_have_crypto",
            "fanout.author_notification_need_cash",
        ],
        (Audience::Counterparty, Direction::CashToCrypto) => [
            "fanout.notification_have_cash",
            "fanout.notification_need_crypto",
        ],
        (Audience::Counterparty, Direction::CryptoToCash) => [
            "fanout.notification_have_crypto",
            "fanout.notification_need_cash",
        ],
    };
    keys.map(|key| catalog.get(lang, key).to_owned())
}
