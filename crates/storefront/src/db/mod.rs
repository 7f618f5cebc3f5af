//! Primary datastore access.
//!
//! # Database
//!
//! `PostgreSQL` is the source of truth for products, orders and accounts:
//!
//! ## Tables
//!
//! - `storefront.product` - Catalog records (search index is derived from these)
//! - `storefront.order` - Immutable order snapshots written by checkout
//! - `storefront.user` - Email/password accounts
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Ports
//!
//! Handlers and services never see `PgPool` directly. They go through the
//! [`CatalogStore`] and [`OrderStore`] traits, which have a `PostgreSQL`
//! adapter for production and an in-memory adapter for tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cartwheel-cli -- migrate
//! ```

pub mod catalog;
pub mod memory;
pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::{CatalogStore, PgCatalogStore};
pub use memory::{MemoryCatalogStore, MemoryOrderStore};
pub use orders::{OrderStore, PgOrderStore};

/// Errors from a datastore adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Generate a new record key.
pub(crate) fn generate_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
