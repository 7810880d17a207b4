//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! Every test binary shares one cluster bootstrapped by
//! `pg-embed-setup-unpriv`. Each test receives its own database cloned from a
//! template that already carries the migrations; the template name embeds a
//! hash of `migrations/`, so a schema change provisions a new template
//! instead of reusing a stale one.
//!
//! A bootstrap failure fails the test. Set `SKIP_TEST_CLUSTER=1` to skip
//! instead, for hosts that cannot download or run the PostgreSQL binaries.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use librecash::outbound::persistence::migrate_blocking;
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use uuid::Uuid;

const SKIP_ENV: &str = "SKIP_TEST_CLUSTER";
const WORKER_ENV: &str = "PG_EMBEDDED_WORKER";
const ATTEMPTS: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);

static TEMPLATE_LOCK: Mutex<()> = Mutex::new(());

/// Whether `SKIP_TEST_CLUSTER` holds a truthy value (`1`, `true`, `yes`).
pub fn skip_requested() -> bool {
    std::env::var(SKIP_ENV)
        .is_ok_and(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// A migrated database of its own, or `None` when the cluster is unavailable
/// and skipping was requested.
///
/// # Panics
///
/// Panics when the cluster cannot be provisioned and skipping was not
/// requested, so a broken environment never passes silently.
#[expect(clippy::print_stderr, reason = "skip marker for CI logs")]
pub fn fresh_database() -> Option<TemporaryDatabase> {
    match provision() {
        Ok(database) => Some(database),
        Err(reason) if skip_requested() => {
            eprintln!("SKIP-TEST-CLUSTER: {reason}");
            None
        }
        Err(reason) => {
            panic!("embedded PostgreSQL unavailable: {reason}; set {SKIP_ENV}=1 to skip")
        }
    }
}

/// Synchronous client for seeding and inspecting rows behind the adapters.
pub fn client(database: &TemporaryDatabase) -> Client {
    Client::connect(database.url(), NoTls)
        .unwrap_or_else(|error| panic!("connect to the test database: {}", describe(&error)))
}

/// Render a `postgres` error with its SQLSTATE and server message.
pub fn describe(error: &postgres::Error) -> String {
    error.as_db_error().map_or_else(
        || error.to_string(),
        |db_error| {
            let mut text = format!("{:?}: {}", db_error.code(), db_error.message());
            if let Some(detail) = db_error.detail() {
                text.push_str("; ");
                text.push_str(detail);
            }
            text
        },
    )
}

fn provision() -> Result<TemporaryDatabase, String> {
    let cluster = with_retries("bootstrap cluster", bootstrap)?;
    with_retries("clone template", || {
        let template = ensure_template(cluster)?;
        let name = format!("test_{}", Uuid::new_v4().simple());
        cluster
            .temporary_database_from_template(name.as_str(), template.as_str())
            .map_err(|error| format!("{error:?}"))
    })
}

/// Start (or join) the shared cluster.
///
/// Running as root needs the unprivileged `pg_worker` helper; the variable
/// is only pointed at this package's build of it when the caller has not
/// chosen one.
fn bootstrap() -> Result<&'static ClusterHandle, String> {
    let _worker = option_env!("CARGO_BIN_EXE_pg_worker")
        .filter(|_| std::env::var_os(WORKER_ENV).is_none())
        .map(|worker| env_lock::lock_env([(WORKER_ENV, Some(worker))]));
    shared_cluster_handle().map_err(|error| error.to_string())
}

fn ensure_template(cluster: &ClusterHandle) -> Result<String, String> {
    let hash = hash_directory(migrations_dir()).map_err(|error| format!("hash migrations: {error}"))?;
    let name = format!("librecash_template_{}", hash.get(..8).unwrap_or(&hash));

    let _guard = TEMPLATE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let exists = cluster
        .database_exists(name.as_str())
        .map_err(|error| format!("template lookup: {error:?}"))?;
    if !exists {
        cluster
            .create_database(name.as_str())
            .map_err(|error| format!("create template: {error:?}"))?;
        let url = cluster.connection().database_url(&name);
        migrate_blocking(&url).map_err(|error| error.to_string())?;
    }
    Ok(name)
}

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn with_retries<T>(
    step: &str,
    mut attempt: impl FnMut() -> Result<T, String>,
) -> Result<T, String> {
    let mut failures = Vec::new();
    for round in 1..=ATTEMPTS {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(reason) => failures.push(format!("{step} {round}/{ATTEMPTS}: {reason}")),
        }
        if round < ATTEMPTS {
            std::thread::sleep(RETRY_DELAY);
        }
    }
    Err(failures.join("; "))
}
