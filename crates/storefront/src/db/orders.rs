//! Order records.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use cartwheel_core::{CartItems, Email, Order, OrderId, Price, StoredOrder, UnixTimestamp};

use super::{StoreError, generate_key};

/// The primary store for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order and return its generated key.
    async fn create(&self, order: &Order) -> Result<OrderId, StoreError>;

    /// Orders placed by `email`, oldest first.
    async fn list_for_email(&self, email: &Email) -> Result<Vec<StoredOrder>, StoreError>;
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    name: String,
    address: String,
    phone: String,
    email: String,
    created_at: f64,
    items: Json<CartItems>,
    total_quantity: i32,
    total_price: Decimal,
}

impl TryFrom<OrderRow> for StoredOrder {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, detail: String| {
            StoreError::DataCorruption(format!("invalid {what} in order {}: {detail}", row.id))
        };

        let email = Email::parse(&row.email).map_err(|e| corrupt("email", e.to_string()))?;
        let total_price =
            Price::new(row.total_price).map_err(|e| corrupt("total_price", e.to_string()))?;
        let total_quantity = u32::try_from(row.total_quantity)
            .map_err(|e| corrupt("total_quantity", e.to_string()))?;

        Ok(Self {
            id: OrderId::new(row.id),
            order: Order {
                name: row.name,
                address: row.address,
                phone: row.phone,
                email,
                created_at: UnixTimestamp::from_secs_f64(row.created_at),
                items: row.items.0,
                total_quantity,
                total_price,
            },
        })
    }
}

/// `PostgreSQL` adapter for [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, order: &Order) -> Result<OrderId, StoreError> {
        let id = generate_key();
        let total_quantity = i32::try_from(order.total_quantity)
            .map_err(|_| StoreError::Conflict("order quantity out of range".to_owned()))?;

        sqlx::query(
            r"
            INSERT INTO storefront.order
                (id, name, address, phone, email, created_at, items, total_quantity, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&id)
        .bind(&order.name)
        .bind(&order.address)
        .bind(&order.phone)
        .bind(order.email.as_str())
        .bind(order.created_at.as_secs_f64())
        .bind(Json(&order.items))
        .bind(total_quantity)
        .bind(order.total_price.amount())
        .execute(&self.pool)
        .await?;

        Ok(OrderId::new(id))
    }

    async fn list_for_email(&self, email: &Email) -> Result<Vec<StoredOrder>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, name, address, phone, email, created_at,
                   items, total_quantity, total_price
            FROM storefront.order
            WHERE email = $1
            ORDER BY seq
            ",
        )
        .bind(email.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredOrder::try_from).collect()
    }
}
