//! Steps for contact requests and listing deletion.

use librecash::domain::ports::{ContactRequestRepository, ListingRepository};
use librecash::domain::{
    ContactRequestOutcome, NewContactRequest, SessionConfig, TimelineStatus, UserId,
};
use librecash::test_support::clock::fixed_now;
use librecash::test_support::fixtures::{brooklyn, lower_manhattan, onboarded_user, times_square};
use librecash::test_support::transport::TransportCall;
use rstest_bdd_macros::{given, then, when};

use super::world::{DialogueWorld, user_ids};
use crate::support::{english, post_listing, press};

fn delete_listing(world: &DialogueWorld, id: i64) {
    let data = format!("delete-listing:{}", world.listing_id());
    let bot = world.bot();
    world.run(press(&bot, id, &data));
    world.deliver();
}

fn has_contact_request(world: &DialogueWorld, id: i64) -> bool {
    let bot = world.bot();
    world
        .run(bot.store.exists(world.listing_id(), UserId::new(id)))
        .expect("contact lookup")
}

#[given("an announced {direction} listing by user {owner} seen by users {ids}")]
fn an_announced_listing(world: &DialogueWorld, direction: String, owner: i64, ids: String) {
    world.start(SessionConfig::default());
    let bot = world.bot();
    world.run(async {
        bot.seed_user(&onboarded_user(owner, lower_manhattan(), 15)).await;
        for (recipient, location) in user_ids(&ids)
            .into_iter()
            .zip([times_square(), brooklyn()].into_iter().cycle())
        {
            bot.seed_user(&onboarded_user(recipient.get(), location, 15)).await;
        }
        post_listing(&bot, owner, &direction, 100).await;
    });
    world.deliver();
    world.remember_latest_listing();
}

#[given("user {id} deleted the listing")]
fn user_deleted_the_listing(world: &DialogueWorld, id: i64) {
    delete_listing(world, id);
}

#[when("user {id} deletes the listing")]
fn user_deletes_the_listing(world: &DialogueWorld, id: i64) {
    delete_listing(world, id);
}

#[when("user {id} asks for contact on the listing {count} times")]
fn user_asks_for_contact(world: &DialogueWorld, id: i64, count: usize) {
    let data = format!("contact-request:{}", world.listing_id());
    let bot = world.bot();
    world.run(async {
        for _ in 0..count {
            press(&bot, id, &data).await;
        }
    });
    world.deliver();
}

#[then("user {id} has a stored contact request for the listing")]
fn user_has_a_stored_contact_request(world: &DialogueWorld, id: i64) {
    assert!(has_contact_request(world, id));
}

#[then("user {id} has no stored contact request for the listing")]
fn user_has_no_stored_contact_request(world: &DialogueWorld, id: i64) {
    assert!(!has_contact_request(world, id));
}

#[then("another contact request by user {id} is reported as a duplicate")]
fn another_contact_request_is_a_duplicate(world: &DialogueWorld, id: i64) {
    let listing_id = world.listing_id();
    let owner_id = world
        .listings()
        .into_iter()
        .find(|listing| listing.id() == listing_id)
        .map(|listing| listing.owner_id())
        .expect("remembered listing is stored");
    let bot = world.bot();
    let outcome = world
        .run(bot.store.create_if_absent(&NewContactRequest {
            listing_id,
            requester_id: UserId::new(id),
            owner_id,
            requested_at: fixed_now(),
        }))
        .expect("insert");
    assert_eq!(outcome, ContactRequestOutcome::AlreadyRequested);
}

#[then("user {id} received a message mentioning {handle}")]
fn user_received_a_message_mentioning(world: &DialogueWorld, id: i64, handle: String) {
    let texts = world.bot().texts_to(id);
    assert!(
        texts.iter().any(|text| text.contains(&handle)),
        "{handle} in {texts:?}"
    );
}

#[then("user {id} saw an edit mentioning {handle}")]
fn user_saw_an_edit_mentioning(world: &DialogueWorld, id: i64, handle: String) {
    let edits = world.bot().transport.edits_in(UserId::new(id));
    assert!(
        edits.iter().any(|edit| edit.text.contains(&handle)),
        "{handle} in {edits:?}"
    );
}

#[then("user {id} saw an edit with the {key} text")]
fn user_saw_an_edit_with_the_text(world: &DialogueWorld, id: i64, key: String) {
    let expected = english(&key);
    let edits = world.bot().transport.edits_in(UserId::new(id));
    assert!(
        edits.iter().any(|edit| edit.text == expected),
        "{key} in {edits:?}"
    );
}

#[then("user {id} saw no edits")]
fn user_saw_no_edits(world: &DialogueWorld, id: i64) {
    let edits = world.bot().transport.edits_in(UserId::new(id));
    assert!(edits.is_empty(), "{edits:?}");
}

#[then("the last press was answered")]
fn the_last_press_was_answered(world: &DialogueWorld) {
    let calls = world.bot().transport.calls();
    assert!(
        calls.iter().any(|call| matches!(call, TransportCall::Answer(_))),
        "{calls:?}"
    );
}

#[then("the listing is gone")]
fn the_listing_is_gone(world: &DialogueWorld) {
    let bot = world.bot();
    let found = world
        .run(bot.store.find_by_id(world.listing_id()))
        .expect("lookup");
    assert!(found.is_none(), "{found:?}");
}

#[then("the listing is still stored")]
fn the_listing_is_still_stored(world: &DialogueWorld) {
    let bot = world.bot();
    let found = world
        .run(bot.store.find_by_id(world.listing_id()))
        .expect("lookup");
    assert!(found.is_some());
}

#[then("every notification of the listing is marked deleted")]
fn every_notification_is_marked_deleted(world: &DialogueWorld) {
    let entries = world.timeline_of(world.listing_id());
    assert!(!entries.is_empty());
    assert!(
        entries
            .iter()
            .all(|entry| entry.is_deleted && entry.status == TimelineStatus::Deleted),
        "{entries:?}"
    );
}

#[then("no notification of the listing is marked deleted")]
fn no_notification_is_marked_deleted(world: &DialogueWorld) {
    let entries = world.timeline_of(world.listing_id());
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|entry| !entry.is_deleted), "{entries:?}");
}
