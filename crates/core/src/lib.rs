//! Cartwheel Core - Shared domain library.
//!
//! This crate provides the types and pure state transitions used by the
//! Cartwheel components:
//! - `storefront` - JSON API server (catalog, cart, checkout)
//! - `cli` - Command-line tools for migrations, seeding and reindexing
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. The cart state machine lives here because every
//! transition is a function of the current cart and a resolved product.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and timestamps
//! - [`product`] - Catalog product records and admin submissions
//! - [`cart`] - Session cart, line items and the add/remove transitions
//! - [`order`] - Immutable order snapshots produced by checkout

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod product;
pub mod types;

pub use cart::{Cart, CartItems, CartLine, CartSnapshot, InvalidQuantity, Quantity};
pub use order::{Order, ShippingDetails, ShippingError, StoredOrder};
pub use product::{NewProduct, Product, ProductError, ProductSortKey};
pub use types::*;
