//! Steps for creating, posting and cancelling listings.

use std::collections::BTreeSet;

use librecash::domain::{Listing, MenuState, TimelineStatus, UserId};
use librecash::test_support::fixtures::{onboarded_user, user_in_state};
use rstest_bdd_macros::{given, then, when};

use super::world::{DialogueWorld, place, user_ids};
use crate::support::{english, post_listing};

fn assert_status(listing: &Listing, status: &str) {
    assert_eq!(format!("{:?}", listing.status()), status, "{listing:?}");
}

#[given("an onboarded user {id} at {location} with a {radius} km radius")]
fn an_onboarded_user(world: &DialogueWorld, id: i64, location: String, radius: u32) {
    let bot = world.bot();
    world.run(bot.seed_user(&onboarded_user(id, place(&location), radius)));
}

#[given("user {id} at {location} with a {radius} km radius is entering an amount")]
fn a_user_entering_an_amount(world: &DialogueWorld, id: i64, location: String, radius: u32) {
    let user = user_in_state(id, MenuState::Amount, Some(place(&location)), Some(radius));
    let bot = world.bot();
    world.run(bot.seed_user(&user));
}

#[when("user {id} posts a {direction} listing for {amount} USD")]
fn user_posts_a_listing(world: &DialogueWorld, id: i64, direction: String, amount: u32) {
    let bot = world.bot();
    world.run(post_listing(&bot, id, &direction, amount));
    world.deliver();
}

#[then("the latest listing is {status}")]
fn the_latest_listing_is(world: &DialogueWorld, status: String) {
    assert_status(&world.latest_listing(), &status);
}

#[then("the first listing is {status}")]
fn the_first_listing_is(world: &DialogueWorld, status: String) {
    let first = world.listings().into_iter().next().expect("a listing was created");
    assert_status(&first, &status);
}

#[then("the latest listing asks for {amount} USD")]
fn the_latest_listing_asks_for(world: &DialogueWorld, amount: u32) {
    assert_eq!(world.latest_listing().amount_usd(), Some(amount));
}

#[then("the latest listing was delivered to users {ids}")]
fn the_latest_listing_was_delivered_to(world: &DialogueWorld, ids: String) {
    let entries = world.timeline_of(world.latest_listing().id());
    let recipients: BTreeSet<UserId> = entries.iter().map(|entry| entry.recipient_id).collect();
    assert_eq!(recipients, user_ids(&ids).into_iter().collect());
    assert!(
        entries
            .iter()
            .all(|entry| entry.status == TimelineStatus::Sent && entry.message_id.is_some()),
        "{entries:?}"
    );
}

#[then("the latest listing was delivered to nobody")]
fn the_latest_listing_was_delivered_to_nobody(world: &DialogueWorld) {
    let entries = world.timeline_of(world.latest_listing().id());
    assert!(entries.is_empty(), "{entries:?}");
}

#[then("user {id} received a message starting with the {key} text")]
fn user_received_a_message_starting_with(world: &DialogueWorld, id: i64, key: String) {
    let header = english(&key);
    let texts = world.bot().texts_to(id);
    assert!(
        texts.iter().any(|text| text.starts_with(&header)),
        "{key} in {texts:?}"
    );
}

#[then("user {id} received no messages")]
fn user_received_no_messages(world: &DialogueWorld, id: i64) {
    let texts = world.bot().texts_to(id);
    assert!(texts.is_empty(), "{texts:?}");
}
