//! Process wiring: adapters, telemetry, the instance lock and services for
//! each subcommand.

mod pid_lock;
mod stores;
mod telemetry;

pub(crate) use pid_lock::PidLock;
pub(crate) use stores::{Stores, memory_stores, open_pool, postgres_stores};
pub(crate) use telemetry::{Telemetry, init_telemetry};

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use librecash::domain::{
    Catalog, FanoutDispatcher, FanoutEngine, FanoutPorts, SessionConfig, SessionEngine,
    SessionPorts,
};
use librecash::outbound::telegram::{TelegramBotClient, TelegramClientConfig};
use librecash::settings::AppSettings;
use mockable::Clock;
use tokio::task::JoinHandle;

/// Bot API client from settings.
pub(crate) fn telegram_client(settings: &AppSettings) -> Result<TelegramBotClient> {
    let config = TelegramClientConfig::new(settings.telegram_api_url()?, settings.telegram_token()?);
    TelegramBotClient::new(config).wrap_err("failed to build the Bot API client")
}

/// Session engine plus the background fanout consumer it schedules onto.
pub(crate) struct Dialogue {
    pub(crate) engine: Arc<SessionEngine>,
    pub(crate) fanout_task: JoinHandle<()>,
}

/// Assemble the session engine over `stores`.
pub(crate) fn build_dialogue(
    stores: &Stores,
    telemetry: &Telemetry,
    settings: &AppSettings,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
) -> Dialogue {
    let fanout = Arc::new(FanoutEngine::new(
        FanoutPorts {
            users: Arc::clone(&stores.users),
            listings: Arc::clone(&stores.listings),
            queue: Arc::clone(&stores.queue),
            metrics: Arc::clone(&telemetry.metrics),
        },
        Arc::clone(&catalog),
        Arc::clone(&clock),
    ));
    let (dispatcher, fanout_task) =
        FanoutDispatcher::spawn(Arc::clone(&fanout), settings.fanout_channel_capacity());
    let engine = SessionEngine::new(
        SessionPorts {
            users: Arc::clone(&stores.users),
            listings: Arc::clone(&stores.listings),
            timeline: Arc::clone(&stores.timeline),
            contacts: Arc::clone(&stores.contacts),
            history: Arc::clone(&stores.history),
            callouts: Arc::clone(&stores.callouts),
            queue: Arc::clone(&stores.queue),
            metrics: Arc::clone(&telemetry.metrics),
            fanout,
            scheduler: Arc::new(dispatcher),
        },
        SessionConfig {
            admin_chat_id: settings.admin_chat_id(),
        },
        catalog,
        clock,
    );
    Dialogue {
        engine: Arc::new(engine),
        fanout_task,
    }
}
