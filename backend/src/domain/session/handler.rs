//! Per-state handler capability and the transitions handlers return.

use async_trait::async_trait;

use crate::domain::{CallbackAction, CallbackEvent, Envelope, Error, MenuState, MessageEvent, User};

use super::context::SessionContext;

/// Outcome of one handler step: an optional next state plus outbound effects.
#[derive(Debug, Default, PartialEq)]
#[must_use]
pub(crate) struct Transition {
    pub(crate) next: Option<MenuState>,
    pub(crate) effects: Vec<Envelope>,
}

impl Transition {
    /// Keep the current state.
    pub(crate) fn stay() -> Self {
        Self::default()
    }

    /// Move to `state`.
    pub(crate) const fn to(state: MenuState) -> Self {
        Self {
            next: Some(state),
            effects: Vec::new(),
        }
    }

    pub(crate) fn with(mut self, envelope: Envelope) -> Self {
        self.effects.push(envelope);
        self
    }

    pub(crate) fn with_all(mut self, envelopes: impl IntoIterator<Item = Envelope>) -> Self {
        self.effects.extend(envelopes);
        self
    }
}

/// Behaviour bound to one [`MenuState`].
///
/// Handlers mutate the user in place; the engine persists the record and
/// the state change after the handler returns.
#[async_trait]
pub(crate) trait MenuHandler: Send + Sync {
    /// State this handler serves.
    fn state(&self) -> MenuState;

    /// React to a message, or to the synthetic event of a cascade.
    async fn handle(
        &self,
        ctx: &SessionContext,
        user: &mut User,
        event: &MessageEvent,
    ) -> Result<Transition, Error>;

    /// Claim a button press before global routing. `None` leaves it to the
    /// router.
    async fn handle_callback(
        &self,
        _ctx: &SessionContext,
        _user: &mut User,
        _event: &CallbackEvent,
        _action: &CallbackAction,
    ) -> Result<Option<Transition>, Error> {
        Ok(None)
    }

    /// The state's question, re-sendable after a language switch. `None`
    /// for transient states.
    fn prompt(&self, _ctx: &SessionContext, _user: &User) -> Option<Vec<Envelope>> {
        None
    }
}
