//! Authentication service.
//!
//! Credentials are opaque to the rest of the storefront: handlers ask an
//! [`Authenticator`] to sign in or register, and on success store the
//! returned [`Email`] in the session. Signing out is purely a session
//! operation.

mod error;

use std::collections::HashMap;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use cartwheel_core::Email;

use crate::db::StoreError;
use crate::db::users::UserRepository;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Credential check and account creation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify a password and return the normalized identity.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Email, AuthError>;

    /// Create an account and return the normalized identity.
    async fn register(&self, email: &str, password: &str) -> Result<Email, AuthError>;
}

/// Argon2id password accounts stored in `PostgreSQL`.
#[derive(Clone)]
pub struct PasswordAuthenticator {
    pool: PgPool,
}

impl PasswordAuthenticator {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Email, AuthError> {
        let email = Email::parse(email)?;

        let password_hash = UserRepository::new(&self.pool)
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(email)
    }

    async fn register(&self, email: &str, password: &str) -> Result<Email, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        UserRepository::new(&self.pool)
            .create_with_password(&email, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Store(other),
            })?;

        Ok(email)
    }
}

/// In-memory accounts with the same hashing and validation rules.
#[derive(Default)]
pub struct MemoryAuthenticator {
    users: RwLock<HashMap<Email, String>>,
}

impl MemoryAuthenticator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Authenticator for MemoryAuthenticator {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Email, AuthError> {
        let email = Email::parse(email)?;
        let hash = self
            .users
            .read()
            .await
            .get(&email)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;
        Ok(email)
    }

    async fn register(&self, email: &str, password: &str) -> Result<Email, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let hash = hash_password(password)?;

        let mut users = self.users.write().await;
        if users.contains_key(&email) {
            return Err(AuthError::UserAlreadyExists);
        }
        users.insert(email.clone(), hash);
        Ok(email)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_memory_register_then_sign_in() {
        let auth = MemoryAuthenticator::new();
        let email = auth.register("Bob@Example.com", "hunter2hunter2").await.unwrap();
        assert_eq!(email.as_str(), "bob@example.com");

        let signed_in = auth.sign_in("bob@example.com", "hunter2hunter2").await.unwrap();
        assert_eq!(signed_in, email);
    }

    #[tokio::test]
    async fn test_memory_rejects_duplicates_and_bad_passwords() {
        let auth = MemoryAuthenticator::new();
        auth.register("amy@example.com", "password-1").await.unwrap();

        assert!(matches!(
            auth.register("AMY@example.com", "password-2").await,
            Err(AuthError::UserAlreadyExists)
        ));
        assert!(matches!(
            auth.sign_in("amy@example.com", "password-2").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("nobody@example.com", "password-1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("not-an-email", "password-1").await,
            Err(AuthError::InvalidEmail(_))
        ));
    }
}
