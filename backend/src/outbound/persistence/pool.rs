//! Async connection pool shared by every LibreCash repository.
//!
//! Wraps `diesel-async` and `bb8`. The listener and the delivery worker each
//! build one pool at start-up and hand clones to their adapters; checkout
//! failures surface as [`PoolError`] and are mapped to port connection
//! errors by the repositories.

use std::time::Duration;

use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::define_port_error;

const DEFAULT_MAX_SIZE: u32 = 10;
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);

define_port_error! {
    /// Failures building the pool or checking out a connection.
    pub enum PoolError {
        /// No connection became available, or the one handed out is dead.
        Checkout { message: String } => "database pool checkout failed: {message}",
        /// The URL is invalid or the database refused the initial connections.
        Build { message: String } => "database pool could not be built: {message}",
    }
}

impl PoolError {
    /// The underlying driver message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Checkout { message } | Self::Build { message } => message,
        }
    }
}

/// Pool settings.
///
/// ```ignore
/// let config = PoolConfig::new(settings.database_url()?)
///     .with_max_size(settings.database_pool_size());
/// ```
#[derive(Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
}

impl PoolConfig {
    /// Ten connections against `database_url`.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    /// Cap the number of open connections. Zero is raised to one.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// Configured connection cap.
    #[must_use]
    pub const fn max_size(&self) -> u32 {
        self.max_size
    }
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("database_url", &"<redacted>")
            .field("max_size", &self.max_size)
            .finish()
    }
}

/// Cloneable handle to the PostgreSQL pool.
///
/// ```ignore
/// let pool = DbPool::new(config).await?;
/// let users = DieselUserRepository::new(pool.clone());
/// let queue = DieselOutboundQueue::new(pool);
/// ```
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool and open its first connection.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Build` if the URL is invalid or the database is
    /// unreachable.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(1))
            .connection_timeout(CHECKOUT_TIMEOUT)
            .test_on_check_out(true)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Checkout` when no connection frees up in time.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }

    /// Round-trip `SELECT 1`; backs the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Checkout` when no healthy connection is available.
    pub async fn ping(&self) -> Result<(), PoolError> {
        let mut conn = self.get().await?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))?;
        Ok(())
    }
}
