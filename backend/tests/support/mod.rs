//! Shared helpers for the dialogue integration suites.
//!
//! Each suite compiles as its own crate, so not every helper is used by
//! every suite.
#![expect(dead_code, reason = "helpers are shared across independent test crates")]

use librecash::domain::{
    CallbackEvent, CallbackOrigin, Catalog, GeoPoint, InboundEvent, ListingId, MessageEvent,
    MessageId, SenderProfile,
};
use librecash::test_support::bot::MemoryBot;

/// English template for `key` from the embedded catalog.
pub fn english(key: &str) -> String {
    let catalog = Catalog::embedded().expect("embedded catalog");
    catalog.get("en", key).to_owned()
}

/// Press the button carrying `data` on a message with id 1.
pub async fn press(bot: &MemoryBot, user_id: i64, data: &str) {
    bot.event(
        user_id,
        InboundEvent::Callback(CallbackEvent {
            callback_id: format!("cb-{user_id}-{data}"),
            data: data.to_owned(),
            origin: Some(CallbackOrigin {
                message_id: MessageId::new(1),
                text: "previous prompt".to_owned(),
            }),
            profile: SenderProfile::default(),
        }),
    )
    .await;
}

/// Share a location as `user_id`.
pub async fn share_location(bot: &MemoryBot, user_id: i64, location: GeoPoint) {
    bot.event(
        user_id,
        InboundEvent::Message(MessageEvent {
            location: Some(location),
            ..MessageEvent::default()
        }),
    )
    .await;
}

/// Walk a new user from `/start` through the phone step.
pub async fn onboard(bot: &MemoryBot, user_id: i64, radius_km: u32, location: GeoPoint) {
    bot.text(user_id, "/start").await;
    press(bot, user_id, "compliance:no").await;
    press(bot, user_id, &format!("radius:{radius_km}")).await;
    share_location(bot, user_id, location).await;
    bot.text(user_id, &english("ask_phone_menu.skip_button")).await;
}

/// Post a listing as an onboarded user sitting in the main menu.
pub async fn post_listing(bot: &MemoryBot, owner_id: i64, direction: &str, amount_usd: u32) {
    press(bot, owner_id, &format!("listing-action:{direction}")).await;
    press(bot, owner_id, &format!("listing-amount:{amount_usd}")).await;
}

/// Id of the most recently created listing.
pub async fn latest_listing_id(bot: &MemoryBot) -> ListingId {
    bot.store
        .listings()
        .await
        .last()
        .map(|listing| listing.id())
        .expect("a listing was created")
}
