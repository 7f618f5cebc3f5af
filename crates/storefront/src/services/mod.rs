//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email/password sign-in and registration
//! - `catalog` - Product creation and search index synchronization
//! - `cart` - Session cart transitions with product lookup
//! - `checkout` - Turning a cart into a persisted order

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;

pub use auth::{AuthError, Authenticator, MemoryAuthenticator, PasswordAuthenticator};
pub use cart::{CartEngine, CartError};
pub use catalog::{CatalogError, CatalogSync};
pub use checkout::{CheckoutEngine, CheckoutError};
