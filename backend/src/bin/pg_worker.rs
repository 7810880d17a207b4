//! Embedded PostgreSQL lifecycle helper for the Diesel test harness.
//!
//! `pg-embed-setup-unpriv` refuses to run `initdb` as root, so under root it
//! drops privileges and hands each step (`setup`, `start`, `stop`) to this
//! binary together with a JSON payload of settings and environment
//! overrides. The overrides are applied by re-running this binary with them
//! rather than by mutating the live process environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Report, Result};
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
use postgresql_embedded::PostgreSQL;
use tokio::runtime::Builder;

/// Set on the re-run child once the payload environment is in place.
const PREPARED_ENV: &str = "LIBRECASH_PG_WORKER_PREPARED";

#[derive(Debug, Parser)]
#[command(name = "pg_worker", about = "Run one embedded PostgreSQL lifecycle step")]
struct Args {
    /// Lifecycle step to run.
    #[arg(value_enum)]
    step: Step,
    /// Worker payload written by the test harness.
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Step {
    Setup,
    Start,
    Stop,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let args = Args::parse();
    let payload = read_payload(&args.config)?;
    if env::var_os(PREPARED_ENV).is_none() {
        return rerun_with(&payload.environment);
    }
    run(args.step, payload)?;
    Ok(ExitCode::SUCCESS)
}

fn read_payload(path: &Path) -> Result<WorkerPayload> {
    let raw = fs::read(path).wrap_err_with(|| format!("read worker payload {}", path.display()))?;
    serde_json::from_slice(&raw).wrap_err_with(|| format!("parse worker payload {}", path.display()))
}

fn rerun_with(overrides: &[(String, Option<PlainSecret>)]) -> Result<ExitCode> {
    let program = env::current_exe().wrap_err("locate pg_worker executable")?;
    let mut command = Command::new(program);
    command.args(env::args_os().skip(1)).env(PREPARED_ENV, "1");
    for (key, value) in overrides {
        match value {
            Some(setting) => command.env(key, setting.expose()),
            None => command.env_remove(key),
        };
    }
    let status = command.status().wrap_err("re-run pg_worker")?;
    Ok(status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from))
}

fn run(step: Step, payload: WorkerPayload) -> Result<()> {
    let settings = payload
        .settings
        .into_settings()
        .map_err(|error| Report::new(error).wrap_err("rebuild postgres settings"))?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("build pg_worker runtime")?;

    let mut postgres = PostgreSQL::new(settings);
    runtime
        .block_on(async {
            match step {
                Step::Setup => postgres.setup().await,
                Step::Start => postgres.start().await,
                Step::Stop => postgres.stop().await,
            }
        })
        .wrap_err_with(|| format!("postgresql_embedded {step:?} failed"))
}
