//! Catalog records.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use cartwheel_core::{NewProduct, Price, Product, ProductId, ProductSortKey, UnixTimestamp};

use super::{StoreError, generate_key};

/// The primary store for products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a product and return its generated key.
    async fn create(
        &self,
        product: &NewProduct,
        created_at: UnixTimestamp,
    ) -> Result<ProductId, StoreError>;

    /// Fetch one product.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    /// Every product, in insertion order.
    async fn list_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Every product, ascending by `key`.
    async fn list_ordered_by(&self, key: ProductSortKey) -> Result<Vec<Product>, StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price: Decimal,
    sku: String,
    image: String,
    created_at: f64,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            StoreError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price,
            sku: row.sku,
            image: row.image,
            created_at: UnixTimestamp::from_secs_f64(row.created_at),
        })
    }
}

/// `PostgreSQL` adapter for [`CatalogStore`].
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn create(
        &self,
        product: &NewProduct,
        created_at: UnixTimestamp,
    ) -> Result<ProductId, StoreError> {
        let id = generate_key();

        sqlx::query(
            r"
            INSERT INTO storefront.product (id, name, price, sku, image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&id)
        .bind(product.name())
        .bind(product.price().amount())
        .bind(product.sku())
        .bind(product.image())
        .bind(created_at.as_secs_f64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("product key already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        Ok(ProductId::new(id))
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, sku, image, created_at
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, sku, image, created_at
            FROM storefront.product
            ORDER BY seq
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn list_ordered_by(&self, key: ProductSortKey) -> Result<Vec<Product>, StoreError> {
        // `column()` only yields fixed identifiers, never user input.
        let sql = format!(
            "SELECT id, name, price, sku, image, created_at \
             FROM storefront.product \
             ORDER BY {}, id",
            key.column()
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
