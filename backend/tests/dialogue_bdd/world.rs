//! Scenario state for the dialogue behaviour suite.
//!
//! Steps are synchronous; every async call goes through [`DialogueWorld::run`]
//! on a current-thread runtime owned by the scenario. Actions deliver the
//! outbound queue before returning, so `Then` steps observe what a chat
//! client would have received.

use std::future::Future;
use std::sync::Arc;

use librecash::domain::{GeoPoint, Listing, ListingId, SessionConfig, TimelineEntry, UserId};
use librecash::test_support::bot::MemoryBot;
use librecash::test_support::fixtures::{brooklyn, lower_manhattan, point, times_square};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use tokio::runtime::{Builder, Runtime};

/// Bot, runtime and the listing a scenario talks about.
#[derive(Default, ScenarioState)]
pub struct DialogueWorld {
    runtime: Slot<Arc<Runtime>>,
    bot: Slot<Arc<MemoryBot>>,
    listing: Slot<ListingId>,
}

impl DialogueWorld {
    /// Replace the bot with a fresh one using `config`.
    pub fn start(&self, config: SessionConfig) {
        self.bot.set(Arc::new(MemoryBot::with_config(config)));
    }

    /// The bot started by a `Given` step.
    pub fn bot(&self) -> Arc<MemoryBot> {
        self.bot.get().expect("a Given step starts the bot")
    }

    /// Drive `future` to completion on the scenario runtime.
    pub fn run<F: Future>(&self, future: F) -> F::Output {
        let runtime = self.runtime.get().unwrap_or_else(|| {
            let built = Arc::new(
                Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("scenario runtime"),
            );
            self.runtime.set(Arc::clone(&built));
            built
        });
        runtime.block_on(future)
    }

    /// Drain the outbound queue into the recording transport.
    pub fn deliver(&self) {
        let bot = self.bot();
        self.run(bot.deliver_all());
    }

    /// Every stored listing, deleted ones included, in id order.
    pub fn listings(&self) -> Vec<Listing> {
        let bot = self.bot();
        self.run(bot.store.listings())
    }

    /// Most recently created listing.
    pub fn latest_listing(&self) -> Listing {
        self.listings().pop().expect("a listing was created")
    }

    /// Make the latest listing the subject of later steps.
    pub fn remember_latest_listing(&self) {
        self.listing.set(self.latest_listing().id());
    }

    /// Listing remembered by [`Self::remember_latest_listing`].
    pub fn listing_id(&self) -> ListingId {
        self.listing.get().expect("a Given step announced a listing")
    }

    /// Timeline entries of `listing_id`, oldest first.
    pub fn timeline_of(&self, listing_id: ListingId) -> Vec<TimelineEntry> {
        let bot = self.bot();
        self.run(bot.store.timeline_entries())
            .into_iter()
            .filter(|entry| entry.listing_id == listing_id)
            .collect()
    }
}

/// Named test location.
pub fn place(name: &str) -> GeoPoint {
    match name {
        "Times Square" => times_square(),
        "Lower Manhattan" => lower_manhattan(),
        "Brooklyn" => brooklyn(),
        "Los Angeles" => point(34.0522, -118.2437),
        other => panic!("unknown place {other}"),
    }
}

/// Comma-separated user ids such as `2,3`.
pub fn user_ids(list: &str) -> Vec<UserId> {
    list.split(',')
        .map(|raw| {
            raw.trim()
                .parse()
                .map(UserId::new)
                .unwrap_or_else(|error| panic!("user id {raw:?}: {error}"))
        })
        .collect()
}
