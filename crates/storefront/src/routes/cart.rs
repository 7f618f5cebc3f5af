//! Cart, checkout and order history handlers.
//!
//! The cart lives in the session under a single key. Responses carry a
//! [`CartSnapshot`]: `{email, items: [[id, line], ...], all_total_quantity,
//! all_total_price}`.

use axum::{
    Form, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use cartwheel_core::{CartSnapshot, OrderId, ProductId, Quantity, ShippingDetails, StoredOrder};

use super::{Success, success};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::{CartEngine, CartError, CheckoutEngine};
use crate::state::AppState;

/// Add to cart form data. `name` carries the product id.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub name: Option<String>,
    pub quantity: Option<String>,
}

/// Shipping form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Add a product to the cart.
///
/// POST /api/products/add
///
/// An unknown product leaves the cart as it was and still answers 200.
#[instrument(skip(state, session, email))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(email): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Json<Success<CartSnapshot>>> {
    let (Some(id), Some(quantity)) = (form.name.as_deref(), form.quantity.as_deref()) else {
        return Err(AppError::Validation("Missing data".to_string()));
    };
    let id = ProductId::new(id.trim());
    let quantity = Quantity::parse(quantity).map_err(|e| AppError::Validation(e.to_string()))?;

    let engine = CartEngine::new(state.catalog());
    let cart = match engine.add_item(&session, &id, quantity).await {
        Ok(cart) => Some(cart),
        Err(CartError::Lookup(e)) => {
            warn!(product_id = %id, error = %e, "Add to cart skipped");
            engine.current(&session).await?
        }
        Err(e) => return Err(e.into()),
    };

    add_breadcrumb("cart", "Item added", Some(&[("product_id", id.as_str())][..]));
    Ok(success(CartSnapshot::new(email, cart.as_ref())))
}

/// Current cart.
///
/// GET /api/products/cart
#[instrument(skip(state, session, email))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(email): RequireAuth,
) -> Result<Json<Success<CartSnapshot>>> {
    let cart = CartEngine::new(state.catalog()).current(&session).await?;
    Ok(success(CartSnapshot::new(email, cart.as_ref())))
}

/// Remove a product's line from the cart.
///
/// GET /api/products/delete/{id}
#[instrument(skip(state, session, email))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(email): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Success<CartSnapshot>>> {
    let cart = CartEngine::new(state.catalog())
        .remove_item(&session, &ProductId::new(id))
        .await?;
    Ok(success(CartSnapshot::new(email, cart.as_ref())))
}

/// Drop the cart.
///
/// GET /api/products/empty
#[instrument(skip(state, session, _auth))]
pub async fn empty(
    State(state): State<AppState>,
    session: Session,
    _auth: RequireAuth,
) -> Result<Json<Success<&'static str>>> {
    CartEngine::new(state.catalog()).empty(&session).await?;
    Ok(success("Successfully emptied cart"))
}

/// Turn the cart into an order.
///
/// POST /api/products/checkout
///
/// The cart survives any failure so the customer can retry.
#[instrument(skip(state, session, email, form))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(email): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Json<Success<OrderId>>> {
    let shipping = ShippingDetails::parse(
        form.name.as_deref().unwrap_or_default(),
        form.address.as_deref().unwrap_or_default(),
        form.phone.as_deref().unwrap_or_default(),
    )
    .map_err(|e| AppError::Validation(e.to_string()))?;

    let id = CheckoutEngine::new(state.orders())
        .checkout(&session, &email, shipping)
        .await?;
    Ok(success(id))
}

/// The caller's orders, oldest first.
///
/// GET /api/vieworder
#[instrument(skip(state, email))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(email): RequireAuth,
) -> Result<Json<Success<Vec<StoredOrder>>>> {
    let orders = CheckoutEngine::new(state.orders())
        .orders_for(&email)
        .await?;
    Ok(success(orders))
}
