//! Embedded schema migrations.
//!
//! The migration harness needs a synchronous connection, so callers on the
//! async runtime go through [`run_pending_migrations`], which moves the work
//! onto the blocking pool.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations from the backend/migrations directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying migrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// The database could not be reached.
    #[error("failed to connect for migrations: {message}")]
    Connect {
        /// Underlying error message.
        message: String,
    },
    /// A migration failed to apply.
    #[error("failed to apply migrations: {message}")]
    Apply {
        /// Underlying error message.
        message: String,
    },
}

/// Apply every pending migration and return the applied versions.
///
/// # Errors
///
/// Returns [`MigrationError`] when the database is unreachable or a
/// migration fails.
pub fn migrate_blocking(database_url: &str) -> Result<Vec<String>, MigrationError> {
    let mut conn = PgConnection::establish(database_url).map_err(|err| MigrationError::Connect {
        message: err.to_string(),
    })?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?;
    Ok(applied.iter().map(ToString::to_string).collect())
}

/// Async wrapper around [`migrate_blocking`].
///
/// # Errors
///
/// Returns [`MigrationError`] when migrations fail or the blocking task is
/// cancelled.
pub async fn run_pending_migrations(database_url: String) -> Result<Vec<String>, MigrationError> {
    let applied = tokio::task::spawn_blocking(move || migrate_blocking(&database_url))
        .await
        .map_err(|err| MigrationError::Apply {
            message: format!("migration task failed: {err}"),
        })??;
    info!(count = applied.len(), "database migrations applied");
    Ok(applied)
}
