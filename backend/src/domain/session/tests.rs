//! Dialogue scenarios driven through the public engine surface.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use chrono::Duration;
use rstest::rstest;

use super::{SessionConfig, SessionEngine, SessionPorts};
use crate::domain::fanout::MockFanoutScheduler;
use crate::domain::ports::{
    MockCalloutRepository, MockContactRequestRepository, MockListingRepository,
    MockLocationHistoryRepository, MockOutboundQueue, MockTimelineRepository, MockUserRepository,
    NoOpBotMetrics, UserRepositoryError,
};
use crate::domain::{
    CallbackEvent, CallbackOrigin, Catalog, ChatId, ContactRequestOutcome, Direction, Envelope,
    FanoutEngine, FanoutJob, FanoutPorts, GeoPoint, Keyboard, Listing, ListingDraft, ListingId,
    ListingStatus, LocationHistoryEntry, MenuState, MessageEvent, MessageId, NewContactRequest,
    Payload, Priority, SenderProfile, TimelineEntry, TimelineStatus, User, UserId,
};
use crate::test_support::clock::{MutableClock, fixed_now};
use crate::test_support::fixtures::{
    lower_manhattan, onboarded_user, posted_listing, times_square, user_in_state,
};

/// Shared state behind the mocked ports.
#[derive(Default)]
struct World {
    users: Mutex<BTreeMap<UserId, User>>,
    listings: Mutex<Vec<Listing>>,
    deleted: Mutex<BTreeSet<ListingId>>,
    nearby: Mutex<Vec<Listing>>,
    history: Mutex<Vec<LocationHistoryEntry>>,
    timeline: Mutex<Vec<TimelineEntry>>,
    contacts: Mutex<Vec<NewContactRequest>>,
    callouts: Mutex<BTreeSet<UserId>>,
    enqueued: Mutex<Vec<Envelope>>,
    scheduled: Mutex<Vec<FanoutJob>>,
    failing_saves: Mutex<bool>,
}

impl World {
    fn with_users(users: impl IntoIterator<Item = User>) -> Arc<Self> {
        let world = Arc::new(Self::default());
        for user in users {
            world.put_user(user);
        }
        world
    }

    fn put_user(&self, user: User) {
        self.users.lock().expect("users").insert(user.id(), user);
    }

    fn user(&self, id: i64) -> User {
        self.users
            .lock()
            .expect("users")
            .get(&UserId::new(id))
            .cloned()
            .expect("user stored")
    }

    fn put_listing(&self, listing: Listing) {
        self.listings.lock().expect("listings").push(listing);
    }

    fn listing(&self, id: i64) -> Listing {
        self.listings
            .lock()
            .expect("listings")
            .iter()
            .find(|listing| listing.id() == ListingId::new(id))
            .cloned()
            .expect("listing stored")
    }

    fn drain(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.enqueued.lock().expect("queue"))
    }
}

fn users_port(world: &Arc<World>) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    let find_by_id_world = Arc::clone(world);
    users
        .expect_find_by_id()
        .returning(move |id| Ok(find_by_id_world.users.lock().expect("users").get(&id).cloned()));
    let save_world = Arc::clone(world);
    users.expect_save().returning(move |user| {
        if *save_world.failing_saves.lock().expect("flag") {
            return Err(UserRepositoryError::connection("database unavailable"));
        }
        save_world.put_user(user.clone());
        Ok(())
    });
    let find_within_radius_world = Arc::clone(world);
    users
        .expect_find_within_radius()
        .returning(move |_, _| Ok(find_within_radius_world.users.lock().expect("users").values().cloned().collect()));
    users
}

fn listings_port(world: &Arc<World>) -> MockListingRepository {
    let mut listings = MockListingRepository::new();
    let create_world = Arc::clone(world);
    listings.expect_create().returning(move |new| {
        let mut stored = create_world.listings.lock().expect("listings");
        let id = i64::try_from(stored.len()).expect("small store") + 1;
        let listing = Listing::from_draft(ListingDraft {
            id: ListingId::new(id),
            owner_id: new.owner_id,
            direction: new.direction,
            status: ListingStatus::Initiated,
            amount_usd: None,
            origin: new.origin,
            deleted_at: None,
            created_at: new.created_at,
            updated_at: new.created_at,
            posted_at: None,
        });
        stored.push(listing.clone());
        Ok(listing)
    });
    let find_by_id_world = Arc::clone(world);
    listings.expect_find_by_id().returning(move |id| {
        if find_by_id_world.deleted.lock().expect("deleted").contains(&id) {
            return Ok(None);
        }
        Ok(find_by_id_world.listings
            .lock()
            .expect("listings")
            .iter()
            .find(|listing| listing.id() == id)
            .cloned())
    });
    let find_latest_for_owner_world = Arc::clone(world);
    listings.expect_find_latest_for_owner().returning(move |owner| {
        Ok(find_latest_for_owner_world.listings
            .lock()
            .expect("listings")
            .iter()
            .rev()
            .find(|listing| listing.owner_id() == owner)
            .cloned())
    });
    let update_world = Arc::clone(world);
    listings.expect_update().returning(move |listing| {
        let mut stored = update_world.listings.lock().expect("listings");
        if let Some(slot) = stored.iter_mut().find(|slot| slot.id() == listing.id()) {
            *slot = listing.clone();
        }
        Ok(())
    });
    let soft_delete_world = Arc::clone(world);
    listings
        .expect_soft_delete()
        .returning(move |id, _| Ok(soft_delete_world.deleted.lock().expect("deleted").insert(id)));
    let find_posted_near_world = Arc::clone(world);
    listings
        .expect_find_posted_near()
        .returning(move |_| Ok(find_posted_near_world.nearby.lock().expect("nearby").clone()));
    listings
}

fn history_port(world: &Arc<World>) -> MockLocationHistoryRepository {
    let mut history = MockLocationHistoryRepository::new();
    let append_world = Arc::clone(world);
    history.expect_append().returning(move |entry| {
        append_world.history.lock().expect("history").push(*entry);
        Ok(())
    });
    let update_latest_coordinates_world = Arc::clone(world);
    history
        .expect_update_latest_coordinates()
        .returning(move |user_id, location| {
            let mut entries = update_latest_coordinates_world.history.lock().expect("history");
            let Some(latest) = entries.iter_mut().rev().find(|entry| entry.user_id == user_id)
            else {
                return Ok(false);
            };
            latest.lat = location.lat();
            latest.lon = location.lon();
            Ok(true)
        });
    let latest_world = Arc::clone(world);
    history.expect_latest().returning(move |user_id, limit| {
        Ok(latest_world.history
            .lock()
            .expect("history")
            .iter()
            .rev()
            .filter(|entry| entry.user_id == user_id)
            .take(limit)
            .copied()
            .collect())
    });
    history
}

fn timeline_port(world: &Arc<World>) -> MockTimelineRepository {
    let mut timeline = MockTimelineRepository::new();
    let list_for_listing_world = Arc::clone(world);
    timeline.expect_list_for_listing().returning(move |listing_id| {
        Ok(list_for_listing_world.timeline
            .lock()
            .expect("timeline")
            .iter()
            .filter(|entry| entry.listing_id == listing_id)
            .copied()
            .collect())
    });
    let mark_deleted_for_listing_world = Arc::clone(world);
    timeline
        .expect_mark_deleted_for_listing()
        .returning(move |listing_id, _| {
            let mut entries = mark_deleted_for_listing_world.timeline.lock().expect("timeline");
            let mut count = 0;
            for entry in entries
                .iter_mut()
                .filter(|entry| entry.listing_id == listing_id && !entry.is_deleted)
            {
                entry.is_deleted = true;
                count += 1;
            }
            Ok(count)
        });
    timeline
}

fn contacts_port(world: &Arc<World>) -> MockContactRequestRepository {
    let mut contacts = MockContactRequestRepository::new();
    let create_if_absent_world = Arc::clone(world);
    contacts.expect_create_if_absent().returning(move |request| {
        let mut stored = create_if_absent_world.contacts.lock().expect("contacts");
        let duplicate = stored.iter().any(|existing| {
            existing.listing_id == request.listing_id
                && existing.requester_id == request.requester_id
        });
        if duplicate {
            return Ok(ContactRequestOutcome::AlreadyRequested);
        }
        stored.push(*request);
        Ok(ContactRequestOutcome::Created)
    });
    contacts
}

fn callouts_port(world: &Arc<World>) -> MockCalloutRepository {
    let mut callouts = MockCalloutRepository::new();
    let is_dismissed_world = Arc::clone(world);
    callouts
        .expect_is_dismissed()
        .returning(move |user_id, _| Ok(is_dismissed_world.callouts.lock().expect("callouts").contains(&user_id)));
    let dismiss_world = Arc::clone(world);
    callouts.expect_dismiss().returning(move |user_id, _| {
        dismiss_world.callouts.lock().expect("callouts").insert(user_id);
        Ok(())
    });
    callouts
}

fn queue_port(world: &Arc<World>) -> MockOutboundQueue {
    let mut queue = MockOutboundQueue::new();
    let enqueue_world = Arc::clone(world);
    queue.expect_enqueue().returning(move |envelope| {
        enqueue_world.enqueued.lock().expect("queue").push(envelope.clone());
        Ok(())
    });
    queue
}

fn scheduler_port(world: &Arc<World>) -> MockFanoutScheduler {
    let mut scheduler = MockFanoutScheduler::new();
    let schedule_world = Arc::clone(world);
    scheduler.expect_schedule().returning(move |job| {
        schedule_world.scheduled.lock().expect("scheduled").push(job);
        Ok(())
    });
    scheduler
}

fn engine(world: &Arc<World>, admin_chat_id: Option<ChatId>) -> SessionEngine {
    let catalog = Arc::new(
        Catalog::from_json_sources([(
            "ru".to_owned(),
            include_str!("../../../locales/ru.json").to_owned(),
        )])
        .expect("shipped catalog"),
    );
    let clock = Arc::new(MutableClock::fixed());
    let users = Arc::new(users_port(world));
    let listings = Arc::new(listings_port(world));
    let queue = Arc::new(queue_port(world));
    let metrics = Arc::new(NoOpBotMetrics);
    let fanout = FanoutEngine::new(
        FanoutPorts {
            users: users.clone(),
            listings: listings.clone(),
            queue: queue.clone(),
            metrics: metrics.clone(),
        },
        Arc::clone(&catalog),
        clock.clone(),
    );
    SessionEngine::new(
        SessionPorts {
            users,
            listings,
            timeline: Arc::new(timeline_port(world)),
            contacts: Arc::new(contacts_port(world)),
            history: Arc::new(history_port(world)),
            callouts: Arc::new(callouts_port(world)),
            queue,
            metrics,
            fanout: Arc::new(fanout),
            scheduler: Arc::new(scheduler_port(world)),
        },
        SessionConfig { admin_chat_id },
        catalog,
        clock,
    )
}

fn press(data: &str) -> CallbackEvent {
    CallbackEvent {
        callback_id: "cb-1".to_owned(),
        data: data.to_owned(),
        origin: Some(CallbackOrigin {
            message_id: MessageId::new(500),
            text: "Original <text>".to_owned(),
        }),
        profile: SenderProfile::default(),
    }
}

fn kinds(envelopes: &[Envelope]) -> Vec<&'static str> {
    envelopes
        .iter()
        .map(|envelope| envelope.payload.kind_label())
        .collect()
}

fn sent_texts(envelopes: &[Envelope]) -> Vec<&str> {
    envelopes
        .iter()
        .filter_map(|envelope| match &envelope.payload {
            Payload::Message(message) => Some(message.text.as_str()),
            _ => None,
        })
        .collect()
}

fn edit_texts(envelopes: &[Envelope]) -> Vec<&str> {
    envelopes
        .iter()
        .filter_map(|envelope| match &envelope.payload {
            Payload::Edit(edit) => Some(edit.text.as_str()),
            _ => None,
        })
        .collect()
}

fn inline_data(envelope: &Envelope) -> Vec<Vec<String>> {
    match &envelope.payload {
        Payload::Message(message) => match &message.keyboard {
            Some(Keyboard::Inline { rows }) => rows
                .iter()
                .map(|row| row.iter().map(|button| button.callback_data.clone()).collect())
                .collect(),
            other => panic!("expected inline keyboard, got {other:?}"),
        },
        other => panic!("expected message, got {other:?}"),
    }
}

fn location_event(point: GeoPoint) -> MessageEvent {
    MessageEvent {
        location: Some(point),
        ..MessageEvent::default()
    }
}

#[tokio::test]
async fn first_message_bootstraps_the_user_and_asks_compliance() {
    let world = World::with_users([]);
    let engine = engine(&world, None);

    let event = MessageEvent {
        text: Some("hello".to_owned()),
        profile: SenderProfile {
            username: Some("alice".to_owned()),
            language_code: Some("ru".to_owned()),
            ..SenderProfile::default()
        },
        ..MessageEvent::default()
    };
    engine.handle_message(UserId::new(1), event).await;

    let user = world.user(1);
    assert_eq!(user.menu_state(), MenuState::ComplianceCheck);
    assert_eq!(user.username(), "alice");
    assert_eq!(user.language_code(), "ru");

    let effects = world.drain();
    assert_eq!(kinds(&effects), vec!["message"]);
    let prompt = effects.first().expect("compliance prompt");
    assert_eq!(
        inline_data(prompt),
        vec![vec!["compliance:yes".to_owned(), "compliance:no".to_owned()]]
    );
}

#[tokio::test]
async fn answering_no_cascades_through_the_welcome_into_radius_selection() {
    let world = World::with_users([user_in_state(1, MenuState::ComplianceCheck, None, None)]);
    let engine = engine(&world, None);

    engine.handle_callback(UserId::new(1), press("compliance:no")).await;

    assert_eq!(world.user(1).menu_state(), MenuState::SelectRadius);
    let effects = world.drain();
    assert_eq!(kinds(&effects), vec!["callback_answer", "edit", "message", "message"]);
    let texts = sent_texts(&effects);
    assert!(texts.first().expect("welcome").starts_with("👋 Welcome to LibreCash!"));
    let radius_prompt = effects.last().expect("radius prompt");
    assert_eq!(
        inline_data(radius_prompt),
        vec![
            vec!["radius:5".to_owned()],
            vec!["radius:15".to_owned()],
            vec!["radius:50".to_owned()],
        ]
    );
}

#[tokio::test]
async fn answering_yes_blocks_until_start_reopens_the_question() {
    let world = World::with_users([user_in_state(1, MenuState::ComplianceCheck, None, None)]);
    let engine = engine(&world, None);

    engine.handle_callback(UserId::new(1), press("compliance:yes")).await;
    assert_eq!(world.user(1).menu_state(), MenuState::Blocked);
    let blocked = world.drain();
    assert_eq!(
        sent_texts(&blocked),
        vec!["Sorry, LibreCash is not available in your jurisdiction."]
    );

    engine
        .handle_message(UserId::new(1), MessageEvent::text("hello"))
        .await;
    assert_eq!(world.user(1).menu_state(), MenuState::Blocked);
    assert_eq!(
        sent_texts(&world.drain()),
        vec!["Sorry, LibreCash is not available in your jurisdiction."]
    );

    engine
        .handle_message(UserId::new(1), MessageEvent::text("/start"))
        .await;
    assert_eq!(world.user(1).menu_state(), MenuState::ComplianceCheck);
    assert_eq!(
        sent_texts(&world.drain()),
        vec!["Before we start: are you a citizen or resident of the United States?"]
    );
}

#[rstest]
#[case("/location", MenuState::SelectRadius)]
#[case("/exchange", MenuState::Blocked)]
#[tokio::test]
async fn commands_run_from_the_blocked_state(#[case] command: &str, #[case] expected: MenuState) {
    let world = World::with_users([user_in_state(1, MenuState::Blocked, None, None)]);
    let engine = engine(&world, None);

    engine
        .handle_message(UserId::new(1), MessageEvent::text(command))
        .await;

    assert_eq!(world.user(1).menu_state(), expected);
}

#[tokio::test]
async fn admin_is_told_about_each_new_user_once() {
    let admin = ChatId::new(-100);
    let world = World::with_users([user_in_state(1, MenuState::ComplianceCheck, None, None)]);
    let engine = engine(&world, Some(admin));

    engine.handle_callback(UserId::new(1), press("compliance:no")).await;
    let first = world.drain();
    let notices: Vec<&Envelope> = first
        .iter()
        .filter(|envelope| {
            matches!(&envelope.payload, Payload::Message(message) if message.chat_id == admin)
        })
        .collect();
    assert_eq!(notices.len(), 1);
    let notice = notices.first().expect("admin notice");
    assert_eq!(notice.priority, Priority::ADMIN_NOTICE);
    assert_eq!(
        sent_texts(&[(*notice).clone()]),
        vec!["New user joined LibreCash: @user1\nLanguage: English"]
    );

    engine
        .handle_message(UserId::new(1), MessageEvent::text("/start"))
        .await;
    engine.handle_callback(UserId::new(1), press("compliance:no")).await;
    let second = world.drain();
    assert!(second.iter().all(|envelope| {
        !matches!(&envelope.payload, Payload::Message(message) if message.chat_id == admin)
    }));
}

#[tokio::test]
async fn onboarding_without_nearby_listings_lands_in_the_main_menu() {
    let world = World::with_users([user_in_state(1, MenuState::SelectRadius, None, None)]);
    let engine = engine(&world, None);

    engine.handle_callback(UserId::new(1), press("radius:15")).await;
    assert_eq!(world.user(1).menu_state(), MenuState::AskLocation);
    assert_eq!(world.user(1).search_radius_km(), Some(15));
    assert_eq!(world.history.lock().expect("history").len(), 1);
    let asked = world.drain();
    assert!(matches!(
        asked.last().map(|envelope| &envelope.payload),
        Some(Payload::Message(message))
            if matches!(message.keyboard, Some(Keyboard::Reply { one_time: true, .. }))
    ));

    engine
        .handle_message(UserId::new(1), location_event(times_square()))
        .await;
    assert_eq!(world.user(1).menu_state(), MenuState::AskPhone);
    let entry = *world.history.lock().expect("history").first().expect("entry");
    assert_eq!(entry.lat.to_bits(), times_square().lat().to_bits());
    world.drain();

    engine
        .handle_message(UserId::new(1), MessageEvent::text("Skip"))
        .await;
    let user = world.user(1);
    assert_eq!(user.menu_state(), MenuState::Main);
    assert_eq!(user.phone(), None);
    let effects = world.drain();
    assert_eq!(
        sent_texts(&effects),
        vec![
            "👌 No problem, your phone number will not be shared.",
            "What would you like to do?",
        ]
    );
}

#[tokio::test]
async fn onboarding_with_nearby_listings_waits_below_the_replay() {
    let world = World::with_users([user_in_state(
        2,
        MenuState::AskPhone,
        Some(times_square()),
        Some(15),
    )]);
    world
        .history
        .lock()
        .expect("history")
        .push(LocationHistoryEntry {
            user_id: UserId::new(2),
            radius_km: 15,
            lat: times_square().lat(),
            lon: times_square().lon(),
            recorded_at: fixed_now(),
        });
    world.nearby.lock().expect("nearby").push(posted_listing(
        9,
        1,
        Direction::CashToCrypto,
        50,
        lower_manhattan(),
        fixed_now() - Duration::days(2),
    ));
    let engine = engine(&world, None);

    let shared = MessageEvent {
        contact_phone: Some("+15550100".to_owned()),
        ..MessageEvent::default()
    };
    engine.handle_message(UserId::new(2), shared).await;

    let user = world.user(2);
    assert_eq!(user.menu_state(), MenuState::HistoricalFanoutWait);
    assert_eq!(user.phone(), Some("+15550100"));

    let effects = world.drain();
    let priorities: Vec<Priority> = effects.iter().map(|envelope| envelope.priority).collect();
    assert_eq!(
        priorities,
        vec![
            Priority::DIRECT_REPLY,
            Priority::HISTORICAL_FANOUT,
            Priority::FANOUT_NUDGE,
        ]
    );
    let nudge = effects.last().expect("nudge");
    assert_eq!(
        inline_data(nudge),
        vec![vec!["historical-fanout:continue".to_owned()]]
    );

    engine
        .handle_callback(UserId::new(2), press("historical-fanout:continue"))
        .await;
    assert_eq!(world.user(2).menu_state(), MenuState::Main);
}

#[tokio::test]
async fn exchange_requires_finished_onboarding() {
    let world = World::with_users([user_in_state(1, MenuState::AskLocation, None, Some(5))]);
    let engine = engine(&world, None);

    engine
        .handle_message(UserId::new(1), MessageEvent::text("/exchange"))
        .await;

    assert_eq!(world.user(1).menu_state(), MenuState::AskLocation);
    assert_eq!(
        sent_texts(&world.drain()),
        vec![
            "⚠️ Please finish setting up your location and search radius first. Send /start to begin."
        ]
    );
}

#[tokio::test]
async fn exchange_jumps_an_onboarded_user_back_to_the_menu() {
    let mut user = onboarded_user(1, times_square(), 5);
    user.set_menu_state(MenuState::Amount);
    let world = World::with_users([user]);
    let engine = engine(&world, None);

    engine
        .handle_message(UserId::new(1), MessageEvent::text("/exchange"))
        .await;

    assert_eq!(world.user(1).menu_state(), MenuState::Main);
    assert_eq!(sent_texts(&world.drain()), vec!["What would you like to do?"]);
}

#[tokio::test]
async fn location_command_restarts_radius_selection() {
    let world = World::with_users([onboarded_user(1, times_square(), 5)]);
    let engine = engine(&world, None);

    engine
        .handle_message(UserId::new(1), MessageEvent::text("/location"))
        .await;

    assert_eq!(world.user(1).menu_state(), MenuState::SelectRadius);
    assert_eq!(
        sent_texts(&world.drain()),
        vec!["How far are you willing to travel for an exchange?"]
    );
}

#[tokio::test]
async fn language_command_lists_loaded_languages_with_the_current_one_ticked() {
    let world = World::with_users([onboarded_user(1, times_square(), 5)]);
    let engine = engine(&world, None);

    engine
        .handle_message(UserId::new(1), MessageEvent::text("/language"))
        .await;

    let effects = world.drain();
    let picker = effects.first().expect("picker");
    let rows = inline_data(picker);
    assert_eq!(rows, vec![vec!["lang:en".to_owned(), "lang:ru".to_owned()]]);
    let Payload::Message(message) = &picker.payload else {
        panic!("picker is a message");
    };
    assert_eq!(message.text, "🌐 Select your language\nCurrent language: English");
    let Some(Keyboard::Inline { rows: buttons }) = &message.keyboard else {
        panic!("picker has inline buttons");
    };
    let first = buttons.first().and_then(|row| row.first()).expect("button");
    assert_eq!(first.text, "✅ English");
}

#[tokio::test]
async fn language_callback_switches_and_re_renders_the_current_prompt() {
    let world = World::with_users([onboarded_user(1, times_square(), 5)]);
    let engine = engine(&world, None);

    engine.handle_callback(UserId::new(1), press("lang:ru")).await;

    assert_eq!(world.user(1).language_code(), "ru");
    assert_eq!(world.user(1).menu_state(), MenuState::Main);
    let effects = world.drain();
    assert_eq!(kinds(&effects), vec!["callback_answer", "edit", "message"]);
    assert_eq!(edit_texts(&effects), vec!["✅ Язык изменён: Русский."]);
    assert_eq!(sent_texts(&effects), vec!["Что вы хотите сделать?"]);
}

#[tokio::test]
async fn starting_a_listing_supersedes_the_unfinished_one() {
    let world = World::with_users([onboarded_user(1, times_square(), 15)]);
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(1), press("listing-action:cash_to_crypto"))
        .await;
    assert_eq!(world.user(1).menu_state(), MenuState::Amount);
    let effects = world.drain();
    assert_eq!(
        edit_texts(&effects),
        vec!["✅ You have cash and need crypto."]
    );
    let prompt = effects.last().expect("amount prompt");
    assert_eq!(
        inline_data(prompt),
        vec![
            vec!["listing-amount:5".to_owned(), "listing-amount:10".to_owned()],
            vec!["listing-amount:15".to_owned(), "listing-amount:25".to_owned()],
            vec!["listing-amount:50".to_owned(), "listing-amount:75".to_owned()],
            vec!["listing-amount:100".to_owned()],
            vec!["listing-action:cancel".to_owned()],
        ]
    );

    engine
        .handle_callback(UserId::new(1), press("listing-action:crypto_to_cash"))
        .await;
    assert_eq!(world.listing(1).status(), ListingStatus::Superseded);
    assert_eq!(world.listing(2).status(), ListingStatus::Initiated);
    assert_eq!(world.listing(2).direction(), Direction::CryptoToCash);
}

#[tokio::test]
async fn choosing_an_amount_posts_and_schedules_the_broadcast() {
    let world = World::with_users([onboarded_user(1, times_square(), 15)]);
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(1), press("listing-action:cash_to_crypto"))
        .await;
    world.drain();
    engine
        .handle_callback(UserId::new(1), press("listing-amount:50"))
        .await;

    let listing = world.listing(1);
    assert_eq!(listing.status(), ListingStatus::Posted);
    assert_eq!(listing.amount_usd(), Some(50));
    let scheduled = world.scheduled.lock().expect("scheduled").clone();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(
        scheduled.first().map(|job| job.target().id()),
        Some(ListingId::new(1))
    );
    assert_eq!(world.user(1).menu_state(), MenuState::Main);
    let effects = world.drain();
    assert_eq!(
        edit_texts(&effects),
        vec!["✅ Your offer for $50 has been posted. We will notify people nearby."]
    );
}

#[tokio::test]
async fn cancel_abandons_the_listing() {
    let world = World::with_users([onboarded_user(1, times_square(), 15)]);
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(1), press("listing-action:crypto_to_cash"))
        .await;
    engine
        .handle_callback(UserId::new(1), press("listing-action:cancel"))
        .await;

    assert_eq!(world.listing(1).status(), ListingStatus::Canceled);
    assert_eq!(world.user(1).menu_state(), MenuState::Main);
    assert!(world.scheduled.lock().expect("scheduled").is_empty());
}

#[tokio::test]
async fn amount_without_an_initiated_listing_is_a_no_op() {
    let world = World::with_users([onboarded_user(1, times_square(), 15)]);
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(1), press("listing-amount:25"))
        .await;

    assert_eq!(kinds(&world.drain()), vec!["callback_answer"]);
    assert!(world.scheduled.lock().expect("scheduled").is_empty());
}

#[tokio::test]
async fn contact_request_introduces_both_parties_once() {
    let mut owner = onboarded_user(1, lower_manhattan(), 15);
    owner.set_phone(Some("+15550100".to_owned()));
    let world = World::with_users([owner, onboarded_user(2, times_square(), 15)]);
    world.put_listing(posted_listing(
        7,
        1,
        Direction::CashToCrypto,
        25,
        lower_manhattan(),
        fixed_now(),
    ));
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(2), press("contact-request:7"))
        .await;

    let effects = world.drain();
    assert_eq!(
        edit_texts(&effects),
        vec!["Original &lt;text&gt;\n\n👤 Contact: @user1\n📞 Phone: +15550100"]
    );
    let notice = effects.last().expect("owner notice");
    assert_eq!(notice.priority, Priority::CONTACT_NOTICE);
    let Payload::Message(message) = &notice.payload else {
        panic!("owner notice is a message");
    };
    assert_eq!(message.chat_id, ChatId::new(1));
    assert!(message.text.ends_with("Contact: @user2"));

    engine
        .handle_callback(UserId::new(2), press("contact-request:7"))
        .await;
    assert_eq!(world.contacts.lock().expect("contacts").len(), 1);
}

#[tokio::test]
async fn contact_request_for_a_missing_listing_is_only_answered() {
    let world = World::with_users([onboarded_user(2, times_square(), 15)]);
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(2), press("contact-request:404"))
        .await;

    assert_eq!(kinds(&world.drain()), vec!["callback_answer"]);
    assert!(world.contacts.lock().expect("contacts").is_empty());
}

fn delivered(listing: i64, recipient: i64, message: i64) -> TimelineEntry {
    TimelineEntry {
        id: recipient,
        listing_id: ListingId::new(listing),
        recipient_id: UserId::new(recipient),
        message_id: Some(MessageId::new(message)),
        status: TimelineStatus::Sent,
        is_deleted: false,
        updated_at: fixed_now(),
    }
}

#[tokio::test]
async fn owner_delete_rewrites_every_delivered_notification() {
    let mut russian = onboarded_user(2, times_square(), 15);
    russian.set_language_code("ru");
    let world = World::with_users([onboarded_user(1, lower_manhattan(), 15), russian]);
    world.put_listing(posted_listing(
        7,
        1,
        Direction::CashToCrypto,
        25,
        lower_manhattan(),
        fixed_now(),
    ));
    {
        let mut timeline = world.timeline.lock().expect("timeline");
        timeline.push(delivered(7, 1, 11));
        timeline.push(delivered(7, 2, 22));
        timeline.push(TimelineEntry {
            message_id: None,
            status: TimelineStatus::Failed,
            ..delivered(7, 3, 0)
        });
    }
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(1), press("delete-listing:7"))
        .await;

    assert!(world.deleted.lock().expect("deleted").contains(&ListingId::new(7)));
    assert!(
        world
            .timeline
            .lock()
            .expect("timeline")
            .iter()
            .all(|entry| entry.is_deleted)
    );
    let effects = world.drain();
    assert_eq!(kinds(&effects), vec!["callback_answer", "edit", "edit"]);
    let targets: Vec<(ChatId, MessageId)> = effects
        .iter()
        .filter_map(|envelope| match &envelope.payload {
            Payload::Edit(edit) => Some((edit.chat_id, edit.message_id)),
            _ => None,
        })
        .collect();
    assert_eq!(
        targets,
        vec![
            (ChatId::new(1), MessageId::new(11)),
            (ChatId::new(2), MessageId::new(22)),
        ]
    );
    assert_eq!(
        edit_texts(&effects),
        vec![
            "🗑 You deleted this exchange offer.",
            "🗑 Автор удалил это предложение.",
        ]
    );
}

#[tokio::test]
async fn non_owner_delete_is_rejected() {
    let world = World::with_users([
        onboarded_user(1, lower_manhattan(), 15),
        onboarded_user(2, times_square(), 15),
    ]);
    world.put_listing(posted_listing(
        7,
        1,
        Direction::CashToCrypto,
        25,
        lower_manhattan(),
        fixed_now(),
    ));
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(2), press("delete-listing:7"))
        .await;

    assert!(world.deleted.lock().expect("deleted").is_empty());
    assert_eq!(kinds(&world.drain()), vec!["callback_answer"]);
}

#[rstest]
#[case::unknown_prefix("bogus:1")]
#[case::extra_colon("contact-request:1:2")]
#[case::off_menu_radius("radius:7")]
#[case::unsupported_language("lang:xx")]
#[tokio::test]
async fn malformed_callbacks_are_answered_and_ignored(#[case] data: &str) {
    let world = World::with_users([onboarded_user(1, times_square(), 15)]);
    let engine = engine(&world, None);

    engine.handle_callback(UserId::new(1), press(data)).await;

    assert_eq!(kinds(&world.drain()), vec!["callback_answer"]);
    assert_eq!(world.user(1), onboarded_user(1, times_square(), 15));
}

#[tokio::test]
async fn callbacks_from_unknown_users_are_answered() {
    let world = World::with_users([]);
    let engine = engine(&world, None);

    engine
        .handle_callback(UserId::new(9), press("listing-action:cash_to_crypto"))
        .await;

    assert_eq!(kinds(&world.drain()), vec!["callback_answer"]);
    assert!(world.users.lock().expect("users").is_empty());
}

#[tokio::test]
async fn failed_saves_drop_the_step_but_still_answer() {
    let world = World::with_users([user_in_state(1, MenuState::SelectRadius, None, None)]);
    *world.failing_saves.lock().expect("flag") = true;
    let engine = engine(&world, None);

    engine.handle_callback(UserId::new(1), press("radius:5")).await;

    assert_eq!(world.user(1).menu_state(), MenuState::SelectRadius);
    assert_eq!(kinds(&world.drain()), vec!["callback_answer"]);
}

#[tokio::test]
async fn stale_onboarding_buttons_are_answered_without_effect() {
    let world = World::with_users([onboarded_user(1, times_square(), 15)]);
    let engine = engine(&world, None);

    engine.handle_callback(UserId::new(1), press("radius:50")).await;

    assert_eq!(world.user(1).search_radius_km(), Some(15));
    assert_eq!(kinds(&world.drain()), vec!["callback_answer"]);
}
