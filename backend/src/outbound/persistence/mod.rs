//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports and the durable
//! outbound queue, backed by PostgreSQL through `diesel-async` and `bb8`.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain records. No dialogue or fanout logic lives here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Raw SQL where Diesel stops**: great-circle radius predicates and the
//!   partial-index upsert use `sql_query` with typed binds.
//! - **Strongly typed errors**: pool and Diesel failures map onto each
//!   port's `Connection`/`Query` variants.
//!
//! # Example
//!
//! ```ignore
//! use librecash::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/librecash")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_callout_repository;
mod diesel_contact_request_repository;
mod diesel_listing_repository;
mod diesel_location_history_repository;
mod diesel_outbound_queue;
mod diesel_timeline_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_callout_repository::DieselCalloutRepository;
pub use diesel_contact_request_repository::DieselContactRequestRepository;
pub use diesel_listing_repository::DieselListingRepository;
pub use diesel_location_history_repository::DieselLocationHistoryRepository;
pub use diesel_outbound_queue::{DEFAULT_CLAIM_LEASE, DieselOutboundQueue};
pub use diesel_timeline_repository::DieselTimelineRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, migrate_blocking, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
