//! Repository and queue selection.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use librecash::domain::ports::{
    CalloutRepository, ContactRequestRepository, ListingRepository, LocationHistoryRepository,
    OutboundQueue, TimelineRepository, UserRepository,
};
use librecash::inbound::ops::ReadinessProbe;
use librecash::outbound::memory::{MemoryOutboundQueue, MemoryStore};
use librecash::outbound::persistence::{
    DbPool, DieselCalloutRepository, DieselContactRequestRepository, DieselListingRepository,
    DieselLocationHistoryRepository, DieselOutboundQueue, DieselTimelineRepository,
    DieselUserRepository, PoolConfig,
};
use librecash::settings::AppSettings;
use tracing::info;

/// Every driven storage port, plus the dependency the readiness probe pings.
pub(crate) struct Stores {
    pub(crate) users: Arc<dyn UserRepository>,
    pub(crate) listings: Arc<dyn ListingRepository>,
    pub(crate) timeline: Arc<dyn TimelineRepository>,
    pub(crate) contacts: Arc<dyn ContactRequestRepository>,
    pub(crate) history: Arc<dyn LocationHistoryRepository>,
    pub(crate) callouts: Arc<dyn CalloutRepository>,
    pub(crate) queue: Arc<dyn OutboundQueue>,
    pub(crate) probe: Option<Arc<dyn ReadinessProbe>>,
}

/// Open the PostgreSQL pool sized from settings.
pub(crate) async fn open_pool(settings: &AppSettings) -> Result<DbPool> {
    let config =
        PoolConfig::new(settings.database_url()?).with_max_size(settings.database_pool_size());
    let max_size = config.max_size();
    let pool = DbPool::new(config)
        .await
        .wrap_err("failed to open the database pool")?;
    info!(max_size, "database pool ready");
    Ok(pool)
}

/// Open the pool and wrap it in the Diesel adapters.
pub(crate) async fn postgres_stores(settings: &AppSettings) -> Result<Stores> {
    let pool = open_pool(settings).await?;
    Ok(Stores {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        listings: Arc::new(DieselListingRepository::new(pool.clone())),
        timeline: Arc::new(DieselTimelineRepository::new(pool.clone())),
        contacts: Arc::new(DieselContactRequestRepository::new(pool.clone())),
        history: Arc::new(DieselLocationHistoryRepository::new(pool.clone())),
        callouts: Arc::new(DieselCalloutRepository::new(pool.clone())),
        queue: Arc::new(DieselOutboundQueue::new(pool.clone())),
        probe: Some(Arc::new(pool)),
    })
}

/// In-process store and queue; nothing survives a restart.
pub(crate) fn memory_stores() -> Stores {
    let store = Arc::new(MemoryStore::new());
    Stores {
        users: store.clone(),
        listings: store.clone(),
        timeline: store.clone(),
        contacts: store.clone(),
        history: store.clone(),
        callouts: store,
        queue: Arc::new(MemoryOutboundQueue::new()),
        probe: None,
    }
}
