//! Orders produced by checkout.

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItems};
use crate::types::{Email, OrderId, Price, UnixTimestamp};

/// Buyer-supplied shipping fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Validation failures for [`ShippingDetails`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShippingError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

impl ShippingDetails {
    /// # Errors
    ///
    /// Returns the first blank field.
    pub fn parse(name: &str, address: &str, phone: &str) -> Result<Self, ShippingError> {
        let field = |label: &'static str, value: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(ShippingError::MissingField(label))
            } else {
                Ok(value.to_owned())
            }
        };

        Ok(Self {
            name: field("name", name)?,
            address: field("address", address)?,
            phone: field("phone", phone)?,
        })
    }
}

/// Immutable snapshot of a cart at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Email,
    pub created_at: UnixTimestamp,
    pub items: CartItems,
    pub total_quantity: u32,
    pub total_price: Price,
}

impl Order {
    /// Snapshot `cart` for `email`. The cart itself is not consumed so that it
    /// can be kept if persisting the order fails.
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        email: Email,
        shipping: ShippingDetails,
        created_at: UnixTimestamp,
    ) -> Self {
        Self {
            name: shipping.name,
            address: shipping.address,
            phone: shipping.phone,
            email,
            created_at,
            items: cart.items().clone(),
            total_quantity: cart.total_quantity(),
            total_price: cart.total_price(),
        }
    }
}

/// An order together with its store-generated key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOrder {
    pub id: OrderId,
    #[serde(flatten)]
    pub order: Order,
}
