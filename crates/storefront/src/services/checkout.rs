//! Checkout: turn the session cart into a persisted order.

use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, instrument};

use cartwheel_core::{Email, Order, OrderId, ShippingDetails, StoredOrder, UnixTimestamp};

use crate::db::{OrderStore, StoreError};
use crate::models::session::{clear_cart, load_cart};

/// Errors from checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("no items in cart")]
    EmptyCart,

    #[error("order store error: {0}")]
    Store(#[from] StoreError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Places and lists orders.
pub struct CheckoutEngine<'a> {
    orders: &'a dyn OrderStore,
}

impl<'a> CheckoutEngine<'a> {
    #[must_use]
    pub const fn new(orders: &'a dyn OrderStore) -> Self {
        Self { orders }
    }

    /// Persist the session cart as an order for `email`, then clear the cart.
    ///
    /// The cart is cleared only after the order write succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is no cart, or
    /// `CheckoutError::Store` if the order cannot be written. In both cases
    /// the session is unchanged.
    #[instrument(skip(self, session, shipping), fields(email = %email))]
    pub async fn checkout(
        &self,
        session: &Session,
        email: &Email,
        shipping: ShippingDetails,
    ) -> Result<OrderId, CheckoutError> {
        let cart = load_cart(session).await?.ok_or(CheckoutError::EmptyCart)?;

        let order = Order::from_cart(&cart, email.clone(), shipping, UnixTimestamp::now());
        let id = self.orders.create(&order).await?;
        clear_cart(session).await?;

        info!(
            order_id = %id,
            total_quantity = order.total_quantity,
            total_price = %order.total_price,
            "Order placed"
        );
        Ok(id)
    }

    /// Orders placed by `email`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Store` if the read fails.
    pub async fn orders_for(&self, email: &Email) -> Result<Vec<StoredOrder>, CheckoutError> {
        Ok(self.orders.list_for_email(email).await?)
    }
}
