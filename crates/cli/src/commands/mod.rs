//! CLI command implementations.

pub mod migrate;
pub mod reindex;
pub mod seed;

use secrecy::SecretString;

/// Load `.env` and read a required variable as a secret.
pub(crate) fn required_secret(key: &'static str) -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();
    std::env::var(key)
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar(key))
}

/// Database URL with the same fallback as the storefront.
pub(crate) fn database_url() -> Result<SecretString, CommandError> {
    required_secret("STOREFRONT_DATABASE_URL")
        .or_else(|_| required_secret("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
}
