//! Behaviour scenarios for the chat dialogue.
//!
//! The bot runs on in-memory adapters with a recording transport; every
//! scenario starts from an empty store.
//
// rstest-bdd generates guard variables with double underscores.
#![expect(non_snake_case, reason = "rstest-bdd scenario guards")]

mod support;

mod dialogue_bdd {
    pub mod contact_steps;
    pub mod listing_steps;
    pub mod onboarding_steps;
    pub mod world;
}

use dialogue_bdd::world::DialogueWorld;
use rstest::fixture;
use rstest_bdd_macros::scenario;

#[fixture]
fn world() -> DialogueWorld {
    DialogueWorld::default()
}

#[scenario(
    path = "tests/features/onboarding.feature",
    name = "A new user reaches the main menu"
)]
fn new_user_reaches_the_main_menu(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/onboarding.feature",
    name = "Declining the jurisdiction question continues to radius selection"
)]
fn declining_jurisdiction_continues(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/onboarding.feature",
    name = "Restricted users are blocked"
)]
fn restricted_users_are_blocked(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/onboarding.feature",
    name = "Restarting leaves the blocked state"
)]
fn restarting_leaves_the_blocked_state(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/onboarding.feature",
    name = "The exchange command waits for finished onboarding"
)]
fn exchange_command_waits_for_onboarding(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/onboarding.feature",
    name = "The location command reopens radius selection"
)]
fn location_command_reopens_radius_selection(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/onboarding.feature",
    name = "The admin channel hears about each user once"
)]
fn admin_channel_hears_about_each_user_once(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/listing.feature",
    name = "A posted listing reaches idle neighbours and its owner"
)]
fn posted_listing_reaches_idle_neighbours(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/listing.feature",
    name = "A cancelled listing is never announced"
)]
fn cancelled_listing_is_never_announced(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/listing.feature",
    name = "Starting another listing supersedes the unfinished one"
)]
fn another_listing_supersedes_the_unfinished_one(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/contact_and_delete.feature",
    name = "Repeated contact presses store one request"
)]
fn repeated_contact_presses_store_one_request(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/contact_and_delete.feature",
    name = "Contacting a missing listing is only answered"
)]
fn contacting_a_missing_listing_is_only_answered(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/contact_and_delete.feature",
    name = "The owner deletes the listing"
)]
fn owner_deletes_the_listing(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/contact_and_delete.feature",
    name = "A deleted listing accepts no contact requests"
)]
fn deleted_listing_accepts_no_contact_requests(world: DialogueWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/contact_and_delete.feature",
    name = "Strangers cannot delete a listing"
)]
fn strangers_cannot_delete_a_listing(world: DialogueWorld) {
    let _ = world;
}
