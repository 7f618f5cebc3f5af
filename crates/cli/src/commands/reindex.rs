//! Trigger a search index rebuild on a running storefront.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_ADMIN_SECRET` - Admin key sent as `secretKey`

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::info;

use super::required_secret;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReindexResponse {
    Success { success: ReindexReport },
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct ReindexReport {
    documents: usize,
}

/// Rebuild the search index at `base_url` and report the document count.
///
/// # Errors
///
/// Returns an error if the admin secret is missing, the request fails, or
/// the storefront rejects it.
pub async fn trigger(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let secret = required_secret("STOREFRONT_ADMIN_SECRET")?;
    let endpoint = format!("{}/api/admin/reindex", base_url.trim_end_matches('/'));

    info!(endpoint = %endpoint, "Requesting reindex");
    let response = reqwest::Client::new()
        .post(&endpoint)
        .form(&[("secretKey", secret.expose_secret())])
        .send()
        .await?;

    let status = response.status();
    match response.json::<ReindexResponse>().await? {
        ReindexResponse::Success { success } => {
            info!(documents = success.documents, "Search index rebuilt");
            Ok(())
        }
        ReindexResponse::Error { error } => Err(format!("{status}: {error}").into()),
    }
}
