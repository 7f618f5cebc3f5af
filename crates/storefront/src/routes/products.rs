//! Catalog route handlers.

use axum::{
    Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use cartwheel_core::{NewProduct, Product, ProductError, ProductId, ProductSortKey};

use super::{Success, success};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::CatalogError;
use crate::state::AppState;

/// Every stored product.
///
/// GET /api/products
#[instrument(skip(state, _auth))]
pub async fn index(
    State(state): State<AppState>,
    _auth: RequireAuth,
) -> Result<Json<Success<Vec<Product>>>> {
    Ok(success(state.catalog().list().await?))
}

/// One product by id.
///
/// GET /api/products/id/{id}
///
/// A miss answers 200 with `{"error": "Product not found"}`.
#[instrument(skip(state, _auth))]
pub async fn show(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    match state.catalog().get_product(&ProductId::new(id)).await {
        Ok(product) => Ok(success(product).into_response()),
        Err(CatalogError::ProductNotFound(_)) => {
            Ok(Json(json!({ "error": "Product not found" })).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Products ordered ascending by a field.
///
/// GET /api/products/sort/{field}
#[instrument(skip(state, _auth))]
pub async fn sorted(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(field): Path<String>,
) -> Result<Json<Success<Vec<Product>>>> {
    let key: ProductSortKey = field
        .parse()
        .map_err(|e: ProductError| AppError::Validation(e.to_string()))?;
    Ok(success(state.catalog().list_sorted(key).await?))
}

/// Full-text search on product names, newest first.
///
/// GET /api/products/search/{query}
#[instrument(skip(state, _auth))]
pub async fn search(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(query): Path<String>,
) -> Result<Json<Success<Vec<Product>>>> {
    Ok(success(state.catalog().search(&query)?))
}

/// Admin product submission.
#[derive(Deserialize)]
pub struct NewProductForm {
    #[serde(rename = "secretKey")]
    pub secret_key: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
    pub sku: Option<String>,
    pub image: Option<String>,
}

impl std::fmt::Debug for NewProductForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewProductForm")
            .field("secret_key", &"[REDACTED]")
            .field("name", &self.name)
            .field("price", &self.price)
            .field("sku", &self.sku)
            .field("image", &self.image)
            .finish()
    }
}

/// Create a product in the store and the search index.
///
/// POST /api/products/addproduct
#[instrument(skip(state, _auth, form))]
pub async fn create(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Form(form): Form<NewProductForm>,
) -> Result<Json<Success<bool>>> {
    let secret = form.secret_key.as_deref().ok_or(AppError::Forbidden)?;
    if !state.is_admin_secret(secret) {
        return Err(AppError::Forbidden);
    }

    let product = NewProduct::parse(
        form.name.as_deref().unwrap_or_default(),
        form.price.as_deref().unwrap_or_default(),
        form.sku.as_deref().unwrap_or_default(),
        form.image.as_deref().unwrap_or_default(),
    )
    .map_err(|e| match e {
        ProductError::MissingField(_) => AppError::Validation("Missing data".to_string()),
        other => AppError::Validation(other.to_string()),
    })?;

    let product = state.catalog().create_product(product).await?;
    info!(id = %product.id, "Product added");
    Ok(success(true))
}
