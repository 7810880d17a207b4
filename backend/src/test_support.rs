//! Test utilities for the bot crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

pub mod clock {
    //! Deterministic clocks.

    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
    use mockable::Clock;

    /// Fixed instant used across the suites: 2026-03-01 12:00:00 UTC.
    #[must_use]
    pub fn fixed_now() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single() {
            Some(now) => now,
            None => panic!("fixed test instant is valid"),
        }
    }

    /// Clock that only moves when told to.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        /// Clock frozen at `now`.
        #[must_use]
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        /// Clock frozen at [`fixed_now`].
        #[must_use]
        pub fn fixed() -> Self {
            Self::new(fixed_now())
        }

        /// Move the clock forward.
        ///
        /// # Panics
        /// When `delta` does not fit a [`TimeDelta`].
        pub fn advance(&self, delta: Duration) {
            let step = TimeDelta::from_std(delta).unwrap_or_else(|error| {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            });
            *self.lock_clock() += step;
        }

        /// Move the clock forward by whole days.
        pub fn advance_days(&self, days: i64) {
            *self.lock_clock() += TimeDelta::days(days);
        }

        fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
            match self.0.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.lock_clock()
        }
    }
}

pub mod delivery {
    //! Runtime doubles for the delivery worker.

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use crate::domain::{BackoffJitter, DeliverySleeper};

    /// Sleeper that returns immediately.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ImmediateSleeper;

    #[async_trait]
    impl DeliverySleeper for ImmediateSleeper {
        async fn sleep(&self, _duration: Duration) {}
    }

    /// Sleeper that records each requested delay and returns immediately.
    #[derive(Default)]
    pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

    impl RecordingSleeper {
        /// Delays requested so far.
        ///
        /// # Panics
        /// When the recording mutex is poisoned.
        #[must_use]
        pub fn recorded(&self) -> Vec<Duration> {
            match self.0.lock() {
                Ok(entries) => entries.clone(),
                Err(_) => panic!("sleeper mutex"),
            }
        }
    }

    #[async_trait]
    impl DeliverySleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            let mut entries = match self.0.lock() {
                Ok(entries) => entries,
                Err(_) => panic!("sleeper mutex"),
            };
            entries.push(duration);
        }
    }

    /// Jitter that returns the base delay unchanged.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NoJitter;

    impl BackoffJitter for NoJitter {
        fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
            base
        }
    }
}

pub mod fixtures {
    //! Domain value builders.

    use chrono::{DateTime, Utc};

    use crate::domain::{
        Direction, GeoPoint, Listing, ListingDraft, ListingId, ListingStatus, MenuState, User,
        UserDraft, UserId,
    };

    /// Times Square, the default recipient location.
    #[must_use]
    pub fn times_square() -> GeoPoint {
        point(40.7589, -73.9851)
    }

    /// Lower Manhattan, the default listing origin.
    #[must_use]
    pub fn lower_manhattan() -> GeoPoint {
        point(40.7128, -74.0060)
    }

    /// Brooklyn Bridge Park.
    #[must_use]
    pub fn brooklyn() -> GeoPoint {
        point(40.7021, -73.9969)
    }

    /// Valid point or panic.
    ///
    /// # Panics
    /// When the coordinates are out of range.
    #[must_use]
    pub fn point(lat: f64, lon: f64) -> GeoPoint {
        match GeoPoint::new(lat, lon) {
            Ok(point) => point,
            Err(error) => panic!("invalid test point: {error}"),
        }
    }

    /// Onboarded English-speaking user in the main menu.
    #[must_use]
    pub fn onboarded_user(id: i64, location: GeoPoint, radius_km: u32) -> User {
        user_in_state(id, MenuState::Main, Some(location), Some(radius_km))
    }

    /// User in an arbitrary state.
    #[must_use]
    pub fn user_in_state(
        id: i64,
        menu_state: MenuState,
        location: Option<GeoPoint>,
        search_radius_km: Option<u32>,
    ) -> User {
        User::from_draft(UserDraft {
            id: UserId::new(id),
            username: format!("user{id}"),
            first_name: String::new(),
            last_name: String::new(),
            language_code: "en".to_owned(),
            location,
            search_radius_km,
            phone: None,
            menu_state,
        })
    }

    /// Posted listing with an amount.
    #[must_use]
    pub fn posted_listing(
        id: i64,
        owner_id: i64,
        direction: Direction,
        amount_usd: u32,
        origin: GeoPoint,
        posted_at: DateTime<Utc>,
    ) -> Listing {
        Listing::from_draft(ListingDraft {
            id: ListingId::new(id),
            owner_id: UserId::new(owner_id),
            direction,
            status: ListingStatus::Posted,
            amount_usd: Some(amount_usd),
            origin,
            deleted_at: None,
            created_at: posted_at,
            updated_at: posted_at,
            posted_at: Some(posted_at),
        })
    }
}

pub mod transport {
    //! In-process chat transport double.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::ports::{ChatTransport, ChatTransportError};
    use crate::domain::{CallbackAnswer, ChatId, MessageEdit, MessageId, OutgoingMessage};

    /// Every call the transport received, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TransportCall {
        /// `send_message`.
        Send(OutgoingMessage),
        /// `edit_message`.
        Edit(MessageEdit),
        /// `answer_callback`.
        Answer(CallbackAnswer),
    }

    #[derive(Default)]
    struct State {
        calls: Vec<TransportCall>,
        next_message_id: i64,
        rejections: HashMap<ChatId, (u16, String)>,
    }

    /// Transport that records calls and hands out increasing message ids.
    #[derive(Default)]
    pub struct RecordingTransport {
        state: Mutex<State>,
    }

    impl RecordingTransport {
        /// Reject every send or edit addressed to `chat_id`.
        pub fn reject_chat(&self, chat_id: impl Into<ChatId>, status: u16, message: &str) {
            self.lock()
                .rejections
                .insert(chat_id.into(), (status, message.to_owned()));
        }

        /// Calls received so far.
        #[must_use]
        pub fn calls(&self) -> Vec<TransportCall> {
            self.lock().calls.clone()
        }

        /// Messages sent to `chat_id`.
        #[must_use]
        pub fn sent_to(&self, chat: impl Into<ChatId>) -> Vec<OutgoingMessage> {
            let chat_id = chat.into();
            self.lock()
                .calls
                .iter()
                .filter_map(|call| match call {
                    TransportCall::Send(message) if message.chat_id == chat_id => {
                        Some(message.clone())
                    }
                    _ => None,
                })
                .collect()
        }

        /// Edits applied in `chat_id`.
        #[must_use]
        pub fn edits_in(&self, chat: impl Into<ChatId>) -> Vec<MessageEdit> {
            let chat_id = chat.into();
            self.lock()
                .calls
                .iter()
                .filter_map(|call| match call {
                    TransportCall::Edit(edit) if edit.chat_id == chat_id => Some(edit.clone()),
                    _ => None,
                })
                .collect()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, State> {
            match self.state.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("transport mutex"),
            }
        }

        fn rejection(state: &State, chat_id: ChatId) -> Option<ChatTransportError> {
            state
                .rejections
                .get(&chat_id)
                .map(|(status, message)| ChatTransportError::rejected(*status, message.as_str()))
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_message(
            &self,
            message: &OutgoingMessage,
        ) -> Result<MessageId, ChatTransportError> {
            let mut state = self.lock();
            state.calls.push(TransportCall::Send(message.clone()));
            if let Some(error) = Self::rejection(&state, message.chat_id) {
                return Err(error);
            }
            state.next_message_id += 1;
            Ok(MessageId::new(state.next_message_id))
        }

        async fn edit_message(&self, edit: &MessageEdit) -> Result<(), ChatTransportError> {
            let mut state = self.lock();
            state.calls.push(TransportCall::Edit(edit.clone()));
            Self::rejection(&state, edit.chat_id).map_or(Ok(()), Err)
        }

        async fn answer_callback(&self, answer: &CallbackAnswer) -> Result<(), ChatTransportError> {
            self.lock().calls.push(TransportCall::Answer(answer.clone()));
            Ok(())
        }
    }
}

pub mod bot {
    //! Whole bot wired over the in-memory adapters.
    //!
    //! Live fanout runs inline instead of through the background dispatcher so
    //! scenarios observe every notification as soon as the triggering event
    //! has been handled.

    use std::sync::Arc;

    use async_trait::async_trait;

    use super::clock::MutableClock;
    use super::delivery::{ImmediateSleeper, NoJitter};
    use super::transport::RecordingTransport;
    use crate::domain::ports::{NoOpBotMetrics, UserRepository};
    use crate::domain::{
        Catalog, ChatId, DeliveryOutcome, DeliveryPorts, DeliveryRuntime, DeliveryWorker,
        DeliveryWorkerConfig, Error, FanoutEngine, FanoutJob, FanoutPorts, FanoutScheduler,
        InboundEvent, MessageEvent, SessionConfig, SessionEngine, SessionPorts, User, UserId,
    };
    use crate::outbound::memory::{MemoryOutboundQueue, MemoryStore};

    /// Scheduler that broadcasts before returning.
    pub struct InlineScheduler(Arc<FanoutEngine>);

    #[async_trait]
    impl FanoutScheduler for InlineScheduler {
        async fn schedule(&self, job: FanoutJob) -> Result<(), Error> {
            self.0.broadcast_listing(job.target()).await.map(|_| ())
        }
    }

    /// Session engine, fanout engine and delivery worker sharing one store.
    pub struct MemoryBot {
        /// Repository state.
        pub store: Arc<MemoryStore>,
        /// Outbound queue.
        pub queue: Arc<MemoryOutboundQueue>,
        /// Transport receiving delivered envelopes.
        pub transport: Arc<RecordingTransport>,
        /// Clock shared by every component.
        pub clock: Arc<MutableClock>,
        /// Dialogue engine.
        pub engine: Arc<SessionEngine>,
        /// Fanout engine.
        pub fanout: Arc<FanoutEngine>,
        worker: DeliveryWorker,
    }

    impl MemoryBot {
        /// Bot with the embedded catalog and no admin channel.
        #[must_use]
        pub fn new() -> Self {
            Self::with_config(SessionConfig::default())
        }

        /// Bot with a custom session configuration.
        ///
        /// # Panics
        /// When the embedded catalog is malformed.
        #[must_use]
        pub fn with_config(config: SessionConfig) -> Self {
            let catalog = match Catalog::embedded() {
                Ok(catalog) => Arc::new(catalog),
                Err(error) => panic!("embedded catalog: {error}"),
            };
            let store = Arc::new(MemoryStore::new());
            let queue = Arc::new(MemoryOutboundQueue::new());
            let transport = Arc::new(RecordingTransport::default());
            let clock = Arc::new(MutableClock::fixed());
            let metrics = Arc::new(NoOpBotMetrics);

            let fanout = Arc::new(FanoutEngine::new(
                FanoutPorts {
                    users: store.clone(),
                    listings: store.clone(),
                    queue: queue.clone(),
                    metrics: metrics.clone(),
                },
                Arc::clone(&catalog),
                clock.clone(),
            ));
            let engine = Arc::new(SessionEngine::new(
                SessionPorts {
                    users: store.clone(),
                    listings: store.clone(),
                    timeline: store.clone(),
                    contacts: store.clone(),
                    history: store.clone(),
                    callouts: store.clone(),
                    queue: queue.clone(),
                    metrics: metrics.clone(),
                    fanout: Arc::clone(&fanout),
                    scheduler: Arc::new(InlineScheduler(Arc::clone(&fanout))),
                },
                config,
                catalog,
                clock.clone(),
            ));
            let worker = DeliveryWorker::with_runtime(
                DeliveryPorts {
                    queue: queue.clone(),
                    transport: transport.clone(),
                    timeline: store.clone(),
                    metrics,
                },
                clock.clone(),
                DeliveryRuntime {
                    sleeper: Arc::new(ImmediateSleeper),
                    jitter: Arc::new(NoJitter),
                },
                DeliveryWorkerConfig::default(),
            );

            Self {
                store,
                queue,
                transport,
                clock,
                engine,
                fanout,
                worker,
            }
        }

        /// Persist `user` directly.
        ///
        /// # Panics
        /// When the store rejects the write.
        pub async fn seed_user(&self, user: &User) {
            if let Err(error) = self.store.save(user).await {
                panic!("seed user: {error}");
            }
        }

        /// Current record for `id`.
        ///
        /// # Panics
        /// When the user does not exist.
        pub async fn user(&self, id: i64) -> User {
            match self.store.find_by_id(UserId::new(id)).await {
                Ok(Some(user)) => user,
                Ok(None) => panic!("user {id} not stored"),
                Err(error) => panic!("load user {id}: {error}"),
            }
        }

        /// Send a text message as `user_id`.
        pub async fn text(&self, user_id: i64, text: &str) {
            self.engine
                .handle(
                    UserId::new(user_id),
                    InboundEvent::Message(MessageEvent::text(text)),
                )
                .await;
        }

        /// Feed an arbitrary event as `user_id`.
        pub async fn event(&self, user_id: i64, event: InboundEvent) {
            self.engine.handle(UserId::new(user_id), event).await;
        }

        /// Deliver every queued envelope and return the outcomes in order.
        ///
        /// # Panics
        /// When the in-memory queue fails.
        pub async fn deliver_all(&self) -> Vec<DeliveryOutcome> {
            let mut outcomes = Vec::new();
            loop {
                match self.worker.deliver_next().await {
                    Ok(DeliveryOutcome::Idle) => return outcomes,
                    Ok(outcome) => outcomes.push(outcome),
                    Err(error) => panic!("memory queue failed: {error}"),
                }
            }
        }

        /// Texts delivered to `chat_id` so far.
        #[must_use]
        pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
            self.transport
                .sent_to(ChatId::new(chat_id))
                .into_iter()
                .map(|message| message.text)
                .collect()
        }
    }

    impl Default for MemoryBot {
        fn default() -> Self {
            Self::new()
        }
    }
}
