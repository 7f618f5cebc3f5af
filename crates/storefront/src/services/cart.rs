//! Cart state transitions over a session.
//!
//! The engine never holds a cart of its own: each call loads the cart from
//! the session it is handed, applies one [`Cart`] transition and writes the
//! result back. Concurrent requests on one session are last-write-wins.

use thiserror::Error;
use tower_sessions::Session;
use tracing::{debug, instrument};

use cartwheel_core::{Cart, ProductId, Quantity};

use crate::models::session::{clear_cart, load_cart, store_cart};
use crate::services::catalog::{CatalogError, CatalogSync};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product could not be resolved; the cart is unchanged.
    #[error("product lookup failed: {0}")]
    Lookup(#[from] CatalogError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Applies cart operations against the catalog.
pub struct CartEngine<'a> {
    catalog: &'a CatalogSync,
}

impl<'a> CartEngine<'a> {
    #[must_use]
    pub const fn new(catalog: &'a CatalogSync) -> Self {
        Self { catalog }
    }

    /// Add `quantity` units of a product, priced at its current catalog price.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Lookup` without touching the session if the
    /// product cannot be resolved.
    #[instrument(skip(self, session))]
    pub async fn add_item(
        &self,
        session: &Session,
        id: &ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        let product = self.catalog.get_product(id).await?;
        let cart = Cart::add_item(load_cart(session).await?, &product, quantity);
        store_cart(session, Some(&cart)).await?;

        debug!(
            total_quantity = cart.total_quantity(),
            total_price = %cart.total_price(),
            "Item added to cart"
        );
        Ok(cart)
    }

    /// Remove a product's line entirely. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be read or written.
    #[instrument(skip(self, session))]
    pub async fn remove_item(
        &self,
        session: &Session,
        id: &ProductId,
    ) -> Result<Option<Cart>, CartError> {
        let Some(cart) = load_cart(session).await? else {
            return Ok(None);
        };
        let cart = cart.remove_item(id);
        store_cart(session, cart.as_ref()).await?;
        Ok(cart)
    }

    /// Drop the whole cart. Identity is kept.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be written.
    pub async fn empty(&self, session: &Session) -> Result<(), CartError> {
        clear_cart(session).await?;
        Ok(())
    }

    /// The current cart, if any.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be read.
    pub async fn current(&self, session: &Session) -> Result<Option<Cart>, CartError> {
        Ok(load_cart(session).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use cartwheel_core::{NewProduct, Price, Product};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::db::MemoryCatalogStore;
    use crate::search::SearchIndex;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn catalog_with(products: &[(&str, &str)]) -> (CatalogSync, Vec<Product>) {
        let index = SearchIndex::new();
        index.create_collection().unwrap();
        let catalog = CatalogSync::new(Arc::new(MemoryCatalogStore::new()), index);

        let mut created = Vec::new();
        for (name, price) in products {
            let product = NewProduct::parse(*name, *price, "SKU", "http://x/i.png").unwrap();
            created.push(catalog.create_product(product).await.unwrap());
        }
        (catalog, created)
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_read_back() {
        let (catalog, products) = catalog_with(&[("Widget", "9.99")]).await;
        let engine = CartEngine::new(&catalog);
        let session = session();

        engine.add_item(&session, &products[0].id, qty(2)).await.unwrap();

        let cart = engine.current(&session).await.unwrap().unwrap();
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total_price(), "19.98".parse::<Price>().unwrap());
    }

    #[tokio::test]
    async fn test_repeated_adds_merge() {
        let (catalog, products) = catalog_with(&[("Widget", "9.99"), ("Gadget", "5")]).await;
        let engine = CartEngine::new(&catalog);
        let session = session();

        engine.add_item(&session, &products[0].id, qty(1)).await.unwrap();
        engine.add_item(&session, &products[1].id, qty(3)).await.unwrap();
        let cart = engine.add_item(&session, &products[0].id, qty(2)).await.unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items().get(&products[0].id).unwrap().quantity, 3);
        assert_eq!(cart.total_quantity(), 6);
        assert_eq!(cart.total_price(), "44.97".parse::<Price>().unwrap());
    }

    #[tokio::test]
    async fn test_lines_keep_insertion_order_across_requests() {
        let (catalog, _) = catalog_with(&[]).await;
        for id in ["zzz", "mmm", "aaa"] {
            let product = NewProduct::parse(id, "1", "SKU", "http://x/i.png")
                .unwrap()
                .into_product(ProductId::new(id), cartwheel_core::UnixTimestamp::now());
            catalog.index().create_document(&product).unwrap();
        }
        let engine = CartEngine::new(&catalog);
        let session = session();

        for id in ["zzz", "mmm", "aaa", "zzz"] {
            engine
                .add_item(&session, &ProductId::new(id), qty(1))
                .await
                .unwrap();
        }

        let cart = engine.current(&session).await.unwrap().unwrap();
        let ids: Vec<_> = cart.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["zzz", "mmm", "aaa"]);
        assert_eq!(cart.total_quantity(), 4);
    }

    #[tokio::test]
    async fn test_unknown_product_leaves_cart_unchanged() {
        let (catalog, products) = catalog_with(&[("Widget", "9.99")]).await;
        let engine = CartEngine::new(&catalog);
        let session = session();
        let before = engine.add_item(&session, &products[0].id, qty(1)).await.unwrap();

        let result = engine
            .add_item(&session, &ProductId::new("missing"), qty(1))
            .await;
        assert!(matches!(
            result,
            Err(CartError::Lookup(CatalogError::ProductNotFound(_)))
        ));
        assert_eq!(engine.current(&session).await.unwrap(), Some(before));
    }

    #[tokio::test]
    async fn test_remove_last_item_clears_cart() {
        let (catalog, products) = catalog_with(&[("Widget", "9.99")]).await;
        let engine = CartEngine::new(&catalog);
        let session = session();
        engine.add_item(&session, &products[0].id, qty(4)).await.unwrap();

        assert_eq!(
            engine.remove_item(&session, &products[0].id).await.unwrap(),
            None
        );
        assert_eq!(engine.current(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_on_empty_cart_is_noop() {
        let (catalog, _) = catalog_with(&[]).await;
        let engine = CartEngine::new(&catalog);
        let session = session();

        assert_eq!(
            engine.remove_item(&session, &ProductId::new("x")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_empty_preserves_identity() {
        let (catalog, products) = catalog_with(&[("Widget", "9.99")]).await;
        let engine = CartEngine::new(&catalog);
        let session = session();
        session
            .insert(crate::models::session_keys::EMAIL, "amy@example.com")
            .await
            .unwrap();
        engine.add_item(&session, &products[0].id, qty(1)).await.unwrap();

        engine.empty(&session).await.unwrap();
        engine.empty(&session).await.unwrap();

        assert_eq!(engine.current(&session).await.unwrap(), None);
        let email: Option<String> = session
            .get(crate::models::session_keys::EMAIL)
            .await
            .unwrap();
        assert_eq!(email.as_deref(), Some("amy@example.com"));
    }
}
