// HTTP handlers for product endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::products::{CreateProductRequest, Product, UpdateProductRequest};
use crate::AppState;

/// Handler for POST /api/products
pub async fn create_product_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    tracing::debug!("Creating new product: {}", payload.name);
    payload.validate()?;

    let product = state.products.create(payload).await?;

    tracing::info!("Successfully created product with id: {}", product.id);
    Ok((StatusCode::CREATED, Json(product)))
}

/// Handler for GET /api/products
pub async fn list_products_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.products.list().await?;
    tracing::debug!("Retrieved {} products", products.len());
    Ok(Json(products))
}

/// Handler for GET /api/products/:id
pub async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(product))
}

/// Handler for PUT /api/products/:id
/// Price changes apply to future sales only; existing sale lines keep their snapshot.
pub async fn update_product_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    tracing::debug!("Updating product with id: {}", id);
    payload.validate()?;

    let product = state
        .products
        .update(id, payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    tracing::info!("Successfully updated product with id: {}", id);
    Ok(Json(product))
}

/// Handler for DELETE /api/products/:id
pub async fn delete_product_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.products.delete(id).await? {
        return Err(ApiError::not_found("Product", id));
    }

    tracing::info!("Successfully deleted product with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}
