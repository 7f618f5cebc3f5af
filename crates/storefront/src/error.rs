//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is written; clients only ever see
//! a `{"error": "..."}` body with a fixed message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use cartwheel_core::ProductId;

use crate::db::StoreError;
use crate::search::SearchError;
use crate::services::{AuthError, CartError, CatalogError, CheckoutError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// No identity in the session.
    #[error("user not authenticated")]
    Unauthenticated,

    /// Admin secret missing or wrong.
    #[error("forbidden")]
    Forbidden,

    /// Missing or malformed request field.
    #[error("validation error: {0}")]
    Validation(String),

    /// Checkout attempted with no cart.
    #[error("no items in cart")]
    EmptyCart,

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Sign-in rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration rejected (bad email, weak password, existing account).
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    /// The datastore or search index could not be reached.
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a sign-in failure. Anything the caller could have caused becomes
    /// [`AppError::InvalidCredentials`].
    #[must_use]
    pub fn from_sign_in(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => e.into(),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
            other => {
                debug!(reason = %other, "Sign-in rejected");
                Self::InvalidCredentials
            }
        }
    }

    /// Map a registration failure.
    #[must_use]
    pub fn from_register(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => e.into(),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
            other => Self::RegistrationFailed(other.to_string()),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_)
            | Self::EmptyCart
            | Self::InvalidCredentials
            | Self::RegistrationFailed(_) => StatusCode::BAD_REQUEST,
            Self::ProductNotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Never includes internal details.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Unauthenticated | Self::Forbidden => "User not authenticated".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::EmptyCart => "No items in cart".to_string(),
            Self::ProductNotFound(_) => "Product not found".to_string(),
            Self::InvalidCredentials => "Wrong username/password".to_string(),
            Self::RegistrationFailed(_) => "Error in registration".to_string(),
            Self::Upstream(_) => "External service error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Upstream(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(_) => Self::Upstream(err.to_string()),
            StoreError::DataCorruption(_) | StoreError::NotFound | StoreError::Conflict(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound(id) => Self::ProductNotFound(id),
            CatalogError::Store(e) => e.into(),
            CatalogError::Search(e) => e.into(),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Lookup(e) => e.into(),
            CartError::Session(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => Self::EmptyCart,
            CheckoutError::Store(e) => e.into(),
            CheckoutError::Session(e) => e.into(),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session: {err}"))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Item added", Some(&[("product_id", "abc")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
