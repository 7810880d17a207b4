//! Per-user dialogue engine.
//!
//! Every inbound event runs through a bounded trampoline: global commands
//! first, then the handler bound to the user's current [`MenuState`]. When a
//! handler moves the user to a new state the engine immediately re-enters
//! with a synthetic event so the new state can send its entry prompt. The
//! trampoline stops when a handler keeps its state or when the next state
//! was already visited during this event.
//!
//! Handlers never talk to the chat transport. They return envelopes that
//! the engine places on the outbound queue after persisting the user.

use std::collections::BTreeSet;
use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    BotMetrics, CalloutRepository, ContactRequestRepository, ListingRepository,
    LocationHistoryRepository, OutboundQueue, TimelineRepository, UserRepository,
    log_metrics_failure,
};
use crate::domain::{
    CallbackAction, CallbackEvent, Catalog, ChatId, Envelope, Error, FanoutEngine,
    FanoutScheduler, HistoricalTrigger, InboundEvent, ListingAction, MenuState, MessageEvent,
    OutgoingMessage, SenderProfile, User, UserId, native_name, resolve_language,
};

mod commands;
mod contact;
mod context;
mod delete;
mod handler;
mod handlers;
mod identity;
mod language_picker;

use commands::Command;
use context::{SessionContext, answer};
use handler::Transition;
use handlers::HandlerRegistry;

/// Port bundle required by the session engine.
pub struct SessionPorts {
    /// User records.
    pub users: Arc<dyn UserRepository>,
    /// Listing records.
    pub listings: Arc<dyn ListingRepository>,
    /// Delivered notification handles.
    pub timeline: Arc<dyn TimelineRepository>,
    /// Contact request ledger.
    pub contacts: Arc<dyn ContactRequestRepository>,
    /// Radius and location history.
    pub history: Arc<dyn LocationHistoryRepository>,
    /// One-off notice bookkeeping.
    pub callouts: Arc<dyn CalloutRepository>,
    /// Outbound queue receiving every reply.
    pub queue: Arc<dyn OutboundQueue>,
    /// Activity counters.
    pub metrics: Arc<dyn BotMetrics>,
    /// Historical replays run inline.
    pub fanout: Arc<FanoutEngine>,
    /// Live broadcasts are handed off.
    pub scheduler: Arc<dyn FanoutScheduler>,
}

/// Deployment-specific behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Chat receiving new-user notices, if any.
    pub admin_chat_id: Option<ChatId>,
}

/// Drives inbound events through the dialogue state machine.
pub struct SessionEngine {
    ctx: SessionContext,
    handlers: HandlerRegistry,
}

enum CommandOutcome {
    /// Continue with the handler of the (possibly new) current state.
    Dispatch,
    /// Reply without touching the state.
    Reply(Envelope),
}

impl SessionEngine {
    /// Build an engine; handlers are constructed once here.
    #[must_use]
    pub fn new(
        ports: SessionPorts,
        config: SessionConfig,
        catalog: Arc<Catalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let trigger = HistoricalTrigger::new(Arc::clone(&ports.history));
        Self {
            ctx: SessionContext {
                users: ports.users,
                listings: ports.listings,
                timeline: ports.timeline,
                contacts: ports.contacts,
                history: ports.history,
                callouts: ports.callouts,
                queue: ports.queue,
                metrics: ports.metrics,
                fanout: ports.fanout,
                scheduler: ports.scheduler,
                trigger,
                catalog,
                clock,
                admin_chat_id: config.admin_chat_id,
            },
            handlers: HandlerRegistry::default(),
        }
    }

    /// Process one inbound event. Failures are logged, never returned.
    pub async fn handle(&self, user_id: UserId, event: InboundEvent) {
        match event {
            InboundEvent::Message(message) => self.handle_message(user_id, message).await,
            InboundEvent::Callback(callback) => self.handle_callback(user_id, callback).await,
        }
    }

    /// Process a chat message.
    pub async fn handle_message(&self, user_id: UserId, event: MessageEvent) {
        if let Err(error) = self.process_message(user_id, event).await {
            warn!(user_id = %user_id, error = %error, "message handling aborted");
        }
    }

    /// Process a button press.
    ///
    /// Aborted presses are still answered so the client stops spinning.
    pub async fn handle_callback(&self, user_id: UserId, event: CallbackEvent) {
        if let Err(error) = self.process_callback(user_id, &event).await {
            warn!(user_id = %user_id, error = %error, "callback handling aborted");
            self.ctx.enqueue_all(vec![answer(&event)]).await;
        }
    }

    async fn process_message(&self, user_id: UserId, event: MessageEvent) -> Result<(), Error> {
        let mut user = self.load_or_bootstrap(user_id, &event.profile).await?;
        self.run(&mut user, event).await
    }

    async fn load_or_bootstrap(
        &self,
        user_id: UserId,
        profile: &SenderProfile,
    ) -> Result<User, Error> {
        if let Some(mut user) = self.ctx.users.find_by_id(user_id).await? {
            if user.merge_profile(profile, false, resolve_tag) {
                self.ctx.users.save(&user).await?;
            }
            return Ok(user);
        }

        let mut user = User::bootstrap(user_id);
        user.merge_profile(profile, true, resolve_tag);
        self.ctx.users.save(&user).await?;
        info!(
            user_id = %user_id,
            language = user.language_code(),
            "new user bootstrapped"
        );
        log_metrics_failure(
            self.ctx
                .metrics
                .record_new_user(user.language_code())
                .await,
        );
        Ok(user)
    }

    /// The trampoline.
    async fn run(&self, user: &mut User, first: MessageEvent) -> Result<(), Error> {
        let mut visited = BTreeSet::new();
        let mut event = first;
        loop {
            let before = user.clone();
            visited.insert(before.menu_state());

            if let Some(command) = command_for(&event) {
                log_metrics_failure(self.ctx.metrics.record_command(command.label()).await);
                if let CommandOutcome::Reply(reply) = self.apply_command(user, command) {
                    self.ctx.enqueue_all(vec![reply]).await;
                    return Ok(());
                }
            }

            let dispatched = user.menu_state();
            visited.insert(dispatched);
            let transition = self
                .handlers
                .get(dispatched)
                .handle(&self.ctx, user, &event)
                .await?;
            self.commit(user, &before, transition).await?;

            let reached = user.menu_state();
            if reached == dispatched {
                return Ok(());
            }
            if !visited.insert(reached) {
                debug!(user_id = %user.id(), state = %reached, "cascade reached a visited state");
                return Ok(());
            }
            event = MessageEvent::synthetic();
        }
    }

    fn apply_command(&self, user: &mut User, command: Command) -> CommandOutcome {
        debug!(user_id = %user.id(), command = command.label(), "global command");
        match command {
            Command::Start => user.set_menu_state(MenuState::ComplianceCheck),
            Command::Location => user.set_menu_state(MenuState::SelectRadius),
            Command::Language => {
                return CommandOutcome::Reply(language_picker::language_picker(&self.ctx, user));
            }
            Command::Exchange if !user.is_onboarded() => {
                let text = self.ctx.text(user, "exchange_command.not_initialized");
                return CommandOutcome::Reply(Envelope::reply(OutgoingMessage::text(
                    user.id(),
                    text,
                )));
            }
            Command::Exchange => user.set_menu_state(MenuState::Main),
        }
        CommandOutcome::Dispatch
    }

    /// Apply the transition, persist the user, then enqueue the effects.
    ///
    /// Effects are dropped when the save fails so nothing is promised that
    /// was not stored.
    async fn commit(&self, user: &mut User, before: &User, transition: Transition) -> Result<(), Error> {
        if let Some(next) = transition.next {
            user.set_menu_state(next);
        }
        if user != before {
            self.ctx.users.save(user).await?;
        }

        let (from, to) = (before.menu_state(), user.menu_state());
        if from != to {
            debug!(user_id = %user.id(), from = %from, to = %to, "menu transition");
            log_metrics_failure(self.ctx.metrics.record_menu_transition(from, to).await);
        }
        self.ctx.enqueue_all(transition.effects).await;
        Ok(())
    }

    async fn process_callback(&self, user_id: UserId, event: &CallbackEvent) -> Result<(), Error> {
        let Some(mut user) = self.ctx.users.find_by_id(user_id).await? else {
            debug!(user_id = %user_id, "callback from an unknown user");
            self.ctx.enqueue_all(vec![answer(event)]).await;
            return Ok(());
        };
        if user.merge_profile(&event.profile, false, resolve_tag) {
            self.ctx.users.save(&user).await?;
        }

        let action = match event.data.parse::<CallbackAction>() {
            Ok(action) => action,
            Err(error) => {
                warn!(user_id = %user_id, data = %event.data, error = %error, "malformed callback payload");
                self.ctx.enqueue_all(vec![answer(event)]).await;
                return Ok(());
            }
        };

        let before = user.clone();
        let (transition, cascade) = match &action {
            CallbackAction::Language(code) => self.change_language(&mut user, event, code),
            other => (self.route_callback(&mut user, event, other).await?, false),
        };
        self.commit(&mut user, &before, transition).await?;

        if cascade || user.menu_state() != before.menu_state() {
            self.run(&mut user, MessageEvent::synthetic()).await?;
        }
        Ok(())
    }

    /// `lang:<code>` is honoured in every state.
    ///
    /// The current state's prompt is re-sent in the new language; states
    /// without a prompt re-run their entry action instead.
    fn change_language(
        &self,
        user: &mut User,
        event: &CallbackEvent,
        code: &str,
    ) -> (Transition, bool) {
        user.set_language_code(code);
        info!(user_id = %user.id(), language = code, "language changed");

        let changed = self
            .ctx
            .format(user, "language.changed", &[&native_name(code)]);
        let transition = Transition::stay()
            .with(answer(event))
            .with_all(self.ctx.edit_origin(user, event, changed));
        let prompt = self.handlers.get(user.menu_state()).prompt(&self.ctx, user);
        let needs_repaint = prompt.is_none();
        (transition.with_all(prompt.into_iter().flatten()), needs_repaint)
    }

    async fn route_callback(
        &self,
        user: &mut User,
        event: &CallbackEvent,
        action: &CallbackAction,
    ) -> Result<Transition, Error> {
        let ctx = &self.ctx;
        let state = user.menu_state();
        if let Some(transition) = self
            .handlers
            .get(state)
            .handle_callback(ctx, user, event, action)
            .await?
        {
            return Ok(transition);
        }

        match action {
            CallbackAction::Listing(ListingAction::Start(direction))
                if matches!(state, MenuState::Main | MenuState::Amount) =>
            {
                handlers::start_listing(ctx, user, event, *direction).await
            }
            CallbackAction::Listing(ListingAction::Cancel) => {
                handlers::cancel_listing(ctx, user, event).await
            }
            CallbackAction::Amount(amount_usd) => {
                handlers::select_amount(ctx, user, event, *amount_usd).await
            }
            CallbackAction::ContactRequest(listing_id) => Ok(Transition::stay().with_all(
                contact::request_contact(ctx, user, event, *listing_id).await?,
            )),
            CallbackAction::DeleteListing(listing_id) => Ok(Transition::stay().with_all(
                delete::delete_listing(ctx, user, event, *listing_id).await?,
            )),
            CallbackAction::HistoricalContinue => {
                Ok(handlers::continue_outside_wait(ctx, user, event))
            }
            CallbackAction::Listing(ListingAction::Start(_))
            | CallbackAction::Compliance { .. }
            | CallbackAction::Radius(_)
            | CallbackAction::Language(_) => {
                debug!(user_id = %user.id(), state = %state, data = %event.data, "stale callback");
                Ok(Transition::stay().with(answer(event)))
            }
        }
    }
}

/// Commands apply in every state, `Blocked` included.
fn command_for(event: &MessageEvent) -> Option<Command> {
    event.trimmed_text().and_then(Command::parse)
}

fn resolve_tag(raw: &str) -> String {
    resolve_language(raw).to_owned()
}

#[cfg(test)]
mod tests;
