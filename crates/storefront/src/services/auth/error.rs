//! Sign-in and registration failures.

use thiserror::Error;

use cartwheel_core::EmailError;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Unknown account or wrong password; callers cannot tell which.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("an account already exists for this email")]
    UserAlreadyExists,

    #[error("password rejected: {0}")]
    WeakPassword(String),

    #[error("account store error: {0}")]
    Store(#[from] StoreError),

    /// Argon2 failed to hash or parse a stored hash.
    #[error("password hashing error")]
    PasswordHash,
}
