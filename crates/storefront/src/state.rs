//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{OrderStore, PgCatalogStore, PgOrderStore};
use crate::search::SearchIndex;
use crate::services::{Authenticator, CatalogSync, PasswordAuthenticator};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Every backend sits behind a port trait, so
/// the same router runs against `PostgreSQL` or in-memory adapters.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: CatalogSync,
    orders: Arc<dyn OrderStore>,
    auth: Arc<dyn Authenticator>,
    admin_secret: SecretString,
}

impl AppState {
    #[must_use]
    pub fn new(
        catalog: CatalogSync,
        orders: Arc<dyn OrderStore>,
        auth: Arc<dyn Authenticator>,
        admin_secret: SecretString,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                orders,
                auth,
                admin_secret,
            }),
        }
    }

    /// State backed by `PostgreSQL` with an empty search index.
    #[must_use]
    pub fn postgres(config: &StorefrontConfig, pool: PgPool) -> Self {
        let catalog = CatalogSync::new(
            Arc::new(PgCatalogStore::new(pool.clone())),
            SearchIndex::new(),
        );
        Self::new(
            catalog,
            Arc::new(PgOrderStore::new(pool.clone())),
            Arc::new(PasswordAuthenticator::new(pool)),
            config.admin_secret.clone(),
        )
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogSync {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.orders.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> &dyn Authenticator {
        self.inner.auth.as_ref()
    }

    /// Compare a submitted admin key against the configured one in constant time.
    #[must_use]
    pub fn is_admin_secret(&self, candidate: &str) -> bool {
        constant_time_eq(
            candidate.as_bytes(),
            self.inner.admin_secret.expose_secret().as_bytes(),
        )
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
