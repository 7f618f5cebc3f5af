//! Catalog synchronization between the primary store and the search index.
//!
//! Writes go to the [`CatalogStore`] first; its generated key becomes the
//! product id and the same record is then written to the [`SearchIndex`].
//! The two writes are sequential, not transactional. If the index write
//! fails the product still exists in the store and becomes searchable after
//! the next [`CatalogSync::rebuild_index`], which is the only repair path.
//!
//! Product creation and rebuilds are serialized through one async mutex so an
//! import never interleaves with a single-document write.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use cartwheel_core::{NewProduct, Product, ProductId, ProductSortKey, UnixTimestamp};

use crate::db::{CatalogStore, StoreError};
use crate::search::{SearchError, SearchIndex};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),
    #[error("catalog store error: {0}")]
    Store(#[from] StoreError),
    #[error("search index error: {0}")]
    Search(#[from] SearchError),
}

/// Keeps the search index consistent with the catalog store.
pub struct CatalogSync {
    store: Arc<dyn CatalogStore>,
    index: SearchIndex,
    admin: Mutex<()>,
}

impl CatalogSync {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, index: SearchIndex) -> Self {
        Self {
            store,
            index,
            admin: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    #[must_use]
    pub const fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Store a new product, then mirror it into the search index.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the primary write fails. An index
    /// failure is logged and does not fail the call.
    #[instrument(skip(self, product), fields(name = %product.name()))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let _admin = self.admin.lock().await;

        let created_at = UnixTimestamp::now();
        let id = self.store.create(&product, created_at).await?;
        let product = product.into_product(id, created_at);

        match self.index.create_document(&product) {
            Ok(()) => info!(id = %product.id, "Product created and indexed"),
            Err(e) => warn!(
                id = %product.id,
                error = %e,
                "Product stored but not indexed; searchable after the next rebuild"
            ),
        }

        Ok(product)
    }

    /// Replace the search index with a snapshot of every stored product.
    ///
    /// Returns the number of documents written.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the snapshot cannot be read (the
    /// current index is left untouched), or `CatalogError::Search` if the
    /// index cannot be recreated.
    #[instrument(skip(self))]
    pub async fn rebuild_index(&self) -> Result<usize, CatalogError> {
        let _admin = self.admin.lock().await;

        let products = self.store.list_all().await?;

        match self.index.drop_collection() {
            Ok(()) | Err(SearchError::CollectionMissing) => {}
            Err(e) => return Err(e.into()),
        }
        self.index.create_collection()?;
        self.index.import_documents(&products)?;

        info!(documents = products.len(), "Search index rebuilt");
        Ok(products.len())
    }

    /// Full-text search on product names, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Search` if the index is unavailable. No match
    /// is an empty result, not an error.
    pub fn search(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        Ok(self.index.search(query)?)
    }

    /// Look a product up in the index, falling back to the store.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if neither has it, or
    /// `CatalogError::Store` if the fallback read fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        match self.index.get_document(id) {
            Ok(Some(product)) => return Ok(product),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Index lookup failed, reading from store"),
        }

        self.store
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))
    }

    /// Every stored product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the read fails.
    pub async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list_all().await?)
    }

    /// Every stored product, ascending by `key`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the read fails.
    pub async fn list_sorted(&self, key: ProductSortKey) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list_ordered_by(key).await?)
    }
}
