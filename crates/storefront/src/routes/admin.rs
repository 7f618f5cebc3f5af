//! Operator endpoints authorized by the admin secret alone.

use axum::{Form, Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{Success, success};
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AdminForm {
    #[serde(rename = "secretKey")]
    pub secret_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReindexReport {
    pub documents: usize,
}

/// Rebuild the search index from the catalog store.
///
/// POST /api/admin/reindex
#[instrument(skip(state, form))]
pub async fn reindex(
    State(state): State<AppState>,
    Form(form): Form<AdminForm>,
) -> Result<Json<Success<ReindexReport>>> {
    let secret = form.secret_key.as_deref().ok_or(AppError::Forbidden)?;
    if !state.is_admin_secret(secret) {
        return Err(AppError::Forbidden);
    }

    let documents = state.catalog().rebuild_index().await?;
    info!(documents, "Reindex requested by operator");
    Ok(success(ReindexReport { documents }))
}
