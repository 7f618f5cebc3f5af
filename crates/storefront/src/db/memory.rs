//! In-memory store adapters.
//!
//! Same contracts as the `PostgreSQL` adapters, backed by vectors behind a
//! `tokio::sync::RwLock`. Used by unit tests and the integration-test harness.

use async_trait::async_trait;
use tokio::sync::RwLock;

use cartwheel_core::{
    Email, NewProduct, Order, OrderId, Product, ProductId, ProductSortKey, StoredOrder,
    UnixTimestamp,
};

use super::{CatalogStore, OrderStore, StoreError, generate_key};

/// In-memory [`CatalogStore`].
#[derive(Default)]
pub struct MemoryCatalogStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn create(
        &self,
        product: &NewProduct,
        created_at: UnixTimestamp,
    ) -> Result<ProductId, StoreError> {
        let id = ProductId::new(generate_key());
        let record = product.clone().into_product(id.clone(), created_at);
        self.products.write().await.push(record);
        Ok(id)
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| &p.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.read().await.clone())
    }

    async fn list_ordered_by(&self, key: ProductSortKey) -> Result<Vec<Product>, StoreError> {
        let mut products = self.products.read().await.clone();
        key.sort(&mut products);
        Ok(products)
    }
}

/// In-memory [`OrderStore`].
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<Vec<StoredOrder>>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders stored, across all customers.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<OrderId, StoreError> {
        let id = OrderId::new(generate_key());
        self.orders.write().await.push(StoredOrder {
            id: id.clone(),
            order: order.clone(),
        });
        Ok(id)
    }

    async fn list_for_email(&self, email: &Email) -> Result<Vec<StoredOrder>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| &o.order.email == email)
            .cloned()
            .collect())
    }
}
