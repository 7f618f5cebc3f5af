//! Authentication route handlers.
//!
//! Sign-in and registration both leave the caller signed in. Logout removes
//! the identity and the cart but keeps the session itself.

use axum::{Form, Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use super::{Success, success};
use crate::error::{AppError, Result};
use crate::middleware::{clear_identity, set_identity};
use crate::state::AppState;

/// Sign-in and registration form data.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: Option<String>,
    pub pass: Option<String>,
}

impl CredentialsForm {
    fn fields(&self) -> Option<(&str, &str)> {
        Some((self.email.as_deref()?, self.pass.as_deref()?))
    }
}

/// Handle login form submission.
///
/// POST /api/login
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Json<Success<&'static str>>> {
    let (email, pass) = form.fields().ok_or(AppError::InvalidCredentials)?;

    let email = state
        .auth()
        .sign_in(email, pass)
        .await
        .map_err(AppError::from_sign_in)?;
    set_identity(&session, &email).await?;

    info!(email = %email, "Customer signed in");
    Ok(success("Successful authentication"))
}

/// Handle registration form submission.
///
/// POST /api/register
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Json<Success<&'static str>>> {
    let (email, pass) = form
        .fields()
        .ok_or_else(|| AppError::RegistrationFailed("missing email or password".to_string()))?;

    let email = state
        .auth()
        .register(email, pass)
        .await
        .map_err(AppError::from_register)?;
    set_identity(&session, &email).await?;

    info!(email = %email, "Customer registered");
    Ok(success("Successful registration"))
}

/// Sign out.
///
/// GET /api/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Success<&'static str>>> {
    clear_identity(&session).await?;
    Ok(success("Successfully logged out"))
}
