//! Steps for onboarding, global commands and the admin notice.

use librecash::domain::{ChatId, SessionConfig};
use rstest_bdd_macros::{given, then, when};

use super::world::{DialogueWorld, place};
use crate::support::{english, onboard, press, share_location};

const ONBOARDING_PROMPTS: [&str; 5] = [
    "us_compliance.question",
    "select_radius_menu.message",
    "ask_location_menu.message",
    "ask_phone_menu.message",
    "main_menu.message",
];

fn complete_onboarding(world: &DialogueWorld, id: i64, radius: u32, location: &str) {
    let bot = world.bot();
    world.run(onboard(&bot, id, radius, place(location)));
    world.deliver();
}

fn send(world: &DialogueWorld, id: i64, text: &str) {
    let bot = world.bot();
    world.run(bot.text(id, text));
    world.deliver();
}

#[given("an empty bot")]
fn an_empty_bot(world: &DialogueWorld) {
    world.start(SessionConfig::default());
}

#[given("a bot that announces new users in chat {chat}")]
fn a_bot_that_announces_new_users(world: &DialogueWorld, chat: i64) {
    world.start(SessionConfig {
        admin_chat_id: Some(ChatId::new(chat)),
    });
}

#[given("user {id} completed onboarding with a {radius} km radius at {location}")]
fn user_completed_onboarding(world: &DialogueWorld, id: i64, radius: u32, location: String) {
    complete_onboarding(world, id, radius, &location);
}

#[given("user {id} declared a restricted jurisdiction")]
fn user_declared_a_restricted_jurisdiction(world: &DialogueWorld, id: i64) {
    send(world, id, "/start");
    let bot = world.bot();
    world.run(press(&bot, id, "compliance:yes"));
    world.deliver();
}

#[when("user {id} completes onboarding with a {radius} km radius at {location}")]
fn user_completes_onboarding(world: &DialogueWorld, id: i64, radius: u32, location: String) {
    complete_onboarding(world, id, radius, &location);
}

#[when("user {id} sends {text}")]
fn user_sends(world: &DialogueWorld, id: i64, text: String) {
    send(world, id, &text);
}

#[when("user {id} presses {data}")]
fn user_presses(world: &DialogueWorld, id: i64, data: String) {
    let bot = world.bot();
    world.run(press(&bot, id, &data));
    world.deliver();
}

#[when("user {id} shares the location of {location}")]
fn user_shares_the_location_of(world: &DialogueWorld, id: i64, location: String) {
    let bot = world.bot();
    world.run(share_location(&bot, id, place(&location)));
    world.deliver();
}

#[then("user {id} is in the {state} state")]
fn user_is_in_state(world: &DialogueWorld, id: i64, state: String) {
    let bot = world.bot();
    let actual = world.run(bot.user(id)).menu_state();
    assert_eq!(format!("{actual:?}"), state);
}

#[then("user {id} searches within {radius} km of {location}")]
fn user_searches_within(world: &DialogueWorld, id: i64, radius: u32, location: String) {
    let bot = world.bot();
    let user = world.run(bot.user(id));
    assert_eq!(user.search_radius_km(), Some(radius));
    assert_eq!(user.location(), Some(place(&location)));
}

#[then("user {id} was shown every onboarding prompt")]
fn user_was_shown_every_onboarding_prompt(world: &DialogueWorld, id: i64) {
    let texts = world.bot().texts_to(id);
    for key in ONBOARDING_PROMPTS {
        assert!(
            texts.contains(&english(key)),
            "missing prompt {key} in {texts:?}"
        );
    }
    let bot = world.bot();
    assert!(world.run(bot.user(id)).is_onboarded());
}

#[then("user {id} received the {key} text {count} times")]
fn user_received_the_text(world: &DialogueWorld, id: i64, key: String, count: usize) {
    let expected = english(&key);
    let texts = world.bot().texts_to(id);
    let seen = texts.iter().filter(|text| **text == expected).count();
    assert_eq!(seen, count, "{key} in {texts:?}");
}

#[then("chat {chat} received exactly one new user notice")]
fn chat_received_one_new_user_notice(world: &DialogueWorld, chat: i64) {
    let notices = world.bot().texts_to(chat);
    assert_eq!(notices.len(), 1, "{notices:?}");
    assert!(notices.iter().all(|text| text.contains("New user joined")));
}
