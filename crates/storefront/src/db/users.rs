//! User repository for database operations.

use sqlx::PgPool;

use cartwheel_core::Email;

use super::StoreError;

/// Repository for account rows.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the stored password hash for an email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    pub async fn get_password_hash(&self, email: &Email) -> Result<Option<String>, StoreError> {
        let hash = sqlx::query_scalar::<_, String>(
            r"
            SELECT password_hash
            FROM storefront.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(hash)
    }

    /// Create a new user with email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email already exists.
    /// Returns `StoreError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO storefront.user (email, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("email already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }
}
