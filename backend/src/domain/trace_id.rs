//! Correlation identifier for one inbound update and the work it causes.
//!
//! The listener opens a trace per update; every state-machine iteration and
//! fanout job spawned from that update logs under the same id. Tokio
//! task-locals are not inherited by spawned tasks, so background work
//! captures [`TraceId::current`] and re-enters it with [`TraceId::scope`].

use std::fmt;
use std::future::Future;

use tokio::task_local;
use tracing::Instrument;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// Per-update trace identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use librecash::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let trace_id = TraceId::generate();
/// let observed = TraceId::scope(trace_id, async { TraceId::current() }).await;
/// assert_eq!(observed, Some(trace_id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier in scope for the running task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` in scope.
    pub async fn scope<Fut>(trace_id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }

    /// Run `fut` under a fresh trace id and an `update` span carrying it.
    pub async fn trace_update<Fut>(update_id: i64, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        let trace_id = Self::generate();
        let span = tracing::info_span!("update", trace_id = %trace_id, update_id);
        Self::scope(trace_id, fut.instrument(span)).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
