//! Session-related types.
//!
//! The session holds two things: the signed-in identity under
//! [`keys::EMAIL`] and the cart under [`keys::CART`]. An absent cart key is
//! the only representation of an empty cart.

use tower_sessions::Session;

use cartwheel_core::Cart;

/// Session keys.
pub mod keys {
    /// Key for the signed-in customer's email.
    pub const EMAIL: &str = "email";

    /// Key for the customer's cart.
    pub const CART: &str = "cart";
}

/// Read the cart from the session.
///
/// # Errors
///
/// Returns an error if the session store fails or the stored value is not a cart.
pub async fn load_cart(session: &Session) -> Result<Option<Cart>, tower_sessions::session::Error> {
    session.get::<Cart>(keys::CART).await
}

/// Write the cart back, removing the key when there is no cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_cart(
    session: &Session,
    cart: Option<&Cart>,
) -> Result<(), tower_sessions::session::Error> {
    match cart {
        Some(cart) => session.insert(keys::CART, cart).await,
        None => clear_cart(session).await,
    }
}

/// Remove the cart, leaving the identity in place.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_cart(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove_value(keys::CART).await?;
    Ok(())
}
