//! LibreCash entry point.
//!
//! `listen` runs the Telegram update listener, `send` runs the delivery
//! worker and `migrate` applies the embedded schema migrations. Listener and
//! worker are separate processes sharing PostgreSQL; `listen --storage
//! memory` runs both in one process without a database. Each long-running
//! subcommand holds its own PID lock, so at most one listener and one worker
//! run from the same PID directory.

mod wiring;

use std::ffi::OsString;
use std::future::Future;
use std::sync::Arc;

use actix_web::web;
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr, eyre};
use librecash::domain::{DeliveryPorts, DeliveryWorker, DeliveryWorkerConfig};
use librecash::inbound::ops::{HealthState, OpsServerConfig, ReadinessProbe, create_ops_server};
use librecash::inbound::telegram::{ListenerConfig, UpdateListener};
use librecash::outbound::locales::load_catalog;
use librecash::outbound::persistence::{
    DieselOutboundQueue, DieselTimelineRepository, run_pending_migrations,
};
use librecash::reporting::init_reporting;
use librecash::settings::AppSettings;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::sync::watch;
use tracing::{error, info, warn};

use wiring::{PidLock, Telemetry};

#[derive(Debug, Parser)]
#[command(name = "librecash", version, about = "Cash and crypto peer-matching bot")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Long-poll Telegram and drive the dialogue.
    Listen(ListenArgs),
    /// Drain the outbound queue into Telegram.
    Send,
    /// Apply pending database migrations and exit.
    Migrate,
}

#[derive(Debug, Args, PartialEq, Eq)]
struct ListenArgs {
    /// Where users, listings and the outbound queue live.
    #[arg(long, value_enum, default_value_t = Storage::Postgres)]
    storage: Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Storage {
    /// PostgreSQL through Diesel.
    Postgres,
    /// In-process maps; also runs the delivery worker in this process.
    Memory,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let telemetry = wiring::init_telemetry()?;
    let settings = AppSettings::load_from_iter([OsString::from("librecash")])
        .map_err(|error| eyre!("failed to load configuration: {error}"))?;
    let reporting = init_reporting(&settings.reporting())?;

    let outcome = match cli.command {
        Command::Listen(args) => listen(&settings, telemetry, args.storage).await,
        Command::Send => send(&settings, telemetry).await,
        Command::Migrate => migrate(&settings).await,
    };
    if let Err(error) = &outcome {
        error!(error = %error, "librecash exited with an error");
    }
    if let Some(guard) = &reporting {
        guard.flush();
    }
    outcome
}

async fn listen(settings: &AppSettings, telemetry: Telemetry, storage: Storage) -> Result<()> {
    let _instance = PidLock::acquire(&settings.pid_file("listen"))?;
    let catalog = Arc::new(load_catalog(&settings.locales_dir())?);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let stores = match storage {
        Storage::Postgres => wiring::postgres_stores(settings).await?,
        Storage::Memory => wiring::memory_stores(),
    };
    let client = Arc::new(wiring::telegram_client(settings)?);
    let dialogue = wiring::build_dialogue(
        &stores,
        &telemetry,
        settings,
        catalog,
        Arc::clone(&clock),
    );
    let listener = UpdateListener::new(
        client.clone(),
        dialogue.engine,
        ListenerConfig {
            poll_timeout: settings.poll_timeout(),
            ..ListenerConfig::default()
        },
    );

    let delivery = delivery_config(settings)?;
    let (health, stop) = start_ops(settings, &telemetry, stores.probe.clone())?;
    let local_worker = (storage == Storage::Memory).then(|| {
        let worker = DeliveryWorker::new(
            DeliveryPorts {
                queue: Arc::clone(&stores.queue),
                transport: client,
                timeline: Arc::clone(&stores.timeline),
                metrics: Arc::clone(&telemetry.metrics),
            },
            Arc::clone(&clock),
            delivery,
        );
        let stopped = stop.subscribe();
        tokio::spawn(async move { worker.run(wait_for_stop(stopped)).await })
    });

    health.mark_ready();
    listener.run(wait_for_stop(stop.subscribe())).await;

    drop(listener);
    if let Err(error) = dialogue.fanout_task.await {
        warn!(error = %error, "fanout dispatcher ended abnormally");
    }
    if let Some(worker) = local_worker
        && let Err(error) = worker.await
    {
        warn!(error = %error, "delivery worker ended abnormally");
    }
    Ok(())
}

async fn send(settings: &AppSettings, telemetry: Telemetry) -> Result<()> {
    let _instance = PidLock::acquire(&settings.pid_file("send"))?;
    let pool = wiring::open_pool(settings).await?;
    let worker = DeliveryWorker::new(
        DeliveryPorts {
            queue: Arc::new(DieselOutboundQueue::new(pool.clone())),
            transport: Arc::new(wiring::telegram_client(settings)?),
            timeline: Arc::new(DieselTimelineRepository::new(pool.clone())),
            metrics: Arc::clone(&telemetry.metrics),
        },
        Arc::new(DefaultClock),
        delivery_config(settings)?,
    );

    let (health, stop) = start_ops(settings, &telemetry, Some(Arc::new(pool)))?;
    health.mark_ready();
    worker.run(wait_for_stop(stop.subscribe())).await;
    Ok(())
}

async fn migrate(settings: &AppSettings) -> Result<()> {
    let applied = run_pending_migrations(settings.database_url()?.to_owned()).await?;
    info!(count = applied.len(), versions = ?applied, "migrations applied");
    Ok(())
}

fn delivery_config(settings: &AppSettings) -> Result<DeliveryWorkerConfig> {
    Ok(DeliveryWorkerConfig {
        rate_per_second: settings.send_rate_per_second()?,
        ..DeliveryWorkerConfig::default()
    })
}

/// Start the ops server and the signal watcher.
///
/// On SIGINT or SIGTERM liveness fails, the returned channel flips to `true`
/// and the ops server stops.
fn start_ops(
    settings: &AppSettings,
    telemetry: &Telemetry,
    probe: Option<Arc<dyn ReadinessProbe>>,
) -> Result<(web::Data<HealthState>, Arc<watch::Sender<bool>>)> {
    let health = web::Data::new(HealthState::new(probe));
    let server = create_ops_server(
        health.clone(),
        OpsServerConfig {
            bind_addr: settings.ops_bind_addr(),
            #[cfg(feature = "metrics")]
            prometheus: telemetry.prometheus.clone(),
        },
    )
    .wrap_err("failed to bind the ops server")?;
    #[cfg(not(feature = "metrics"))]
    let _ = telemetry;
    let server_handle = server.handle();
    tokio::spawn(server);
    info!(addr = %settings.ops_bind_addr(), "ops server listening");

    let (stop_tx, _) = watch::channel(false);
    let stop = Arc::new(stop_tx);
    let signal_health = health.clone();
    let signal_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        signal_health.mark_unhealthy();
        signal_stop.send_replace(true);
        server_handle.stop(true).await;
    });
    Ok((health, stop))
}

fn wait_for_stop(mut stopped: watch::Receiver<bool>) -> impl Future<Output = ()> + Send {
    async move {
        if stopped.wait_for(|stop| *stop).await.is_err() {
            warn!("shutdown channel closed");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(error = %error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
