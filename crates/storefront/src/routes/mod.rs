//! HTTP route handlers for storefront.
//!
//! Every endpoint speaks JSON and answers with either `{"success": ...}` or
//! `{"error": "..."}`. Request bodies are urlencoded forms.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Database + search index check
//!
//! # Auth (rate limited)
//! POST /api/login                  - Sign in {email, pass}
//! POST /api/register               - Create account and sign in {email, pass}
//! GET  /api/logout                 - Drop identity and cart
//!
//! # Catalog (requires auth)
//! GET  /api/products               - All products
//! GET  /api/products/id/{id}       - One product
//! GET  /api/products/sort/{field}  - Products ordered by name|price|sku|created_at
//! GET  /api/products/search/{q}    - Full-text search, newest first
//! POST /api/products/addproduct    - Create product {secretKey, name, price, sku, image}
//!
//! # Cart and orders (requires auth)
//! POST /api/products/add           - Add to cart {name (= product id), quantity}
//! GET  /api/products/cart          - Cart snapshot
//! GET  /api/products/delete/{id}   - Remove a line
//! GET  /api/products/empty         - Drop the cart
//! POST /api/products/checkout      - Place order {name, address, phone}
//! GET  /api/vieworder              - Caller's orders
//!
//! # Operations
//! POST /api/admin/reindex          - Rebuild the search index {secretKey}
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod products;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Success envelope: `{"success": value}`.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: T,
}

/// Wrap a value in the success envelope.
pub const fn success<T: Serialize>(value: T) -> Json<Success<T>> {
    Json(Success { success: value })
}

/// Create the sign-in and registration router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter())
}

/// Create the product, cart and checkout router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/id/{id}", get(products::show))
        .route("/sort/{field}", get(products::sorted))
        .route("/search/{query}", get(products::search))
        .route("/addproduct", post(products::create))
        .route("/add", post(cart::add))
        .route("/cart", get(cart::show))
        .route("/delete/{id}", get(cart::remove))
        .route("/empty", get(cart::empty))
        .route("/checkout", post(cart::checkout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(auth_routes())
        .route("/logout", get(auth::logout))
        .nest("/products", product_routes())
        .route("/vieworder", get(cart::orders))
        .route("/admin/reindex", post(admin::reindex));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}
