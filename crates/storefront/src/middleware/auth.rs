//! Authentication extractors and session identity helpers.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use cartwheel_core::Email;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::session_keys;

/// Extractor that requires a signed-in identity.
///
/// Rejects with [`AppError::Unauthenticated`] (403) when the session has no
/// email.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(email): RequireAuth) -> impl IntoResponse {
///     format!("Orders for {email}")
/// }
/// ```
pub struct RequireAuth(pub Email);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let email: Email = session
            .get(session_keys::EMAIL)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(Self(email))
    }
}

/// Store the signed-in identity in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_identity(
    session: &Session,
    email: &Email,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::EMAIL, email).await?;
    set_sentry_user(email.as_str());
    Ok(())
}

/// Remove the identity and the cart from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_identity(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove_value(session_keys::EMAIL).await?;
    session.remove_value(session_keys::CART).await?;
    clear_sentry_user();
    Ok(())
}
