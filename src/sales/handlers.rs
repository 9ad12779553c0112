// HTTP handlers for sale endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::ActingUser;
use crate::sales::{CreateSaleRequest, CreateSaleResponse, ListSalesQuery, SaleResponse};
use crate::AppState;

/// Handler for POST /api/sales
/// Creates a sale on behalf of the acting user
pub async fn create_sale_handler(
    State(state): State<AppState>,
    user: ActingUser,
    Json(request): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<CreateSaleResponse>), ApiError> {
    tracing::debug!(
        "Creating sale for branch {} with {} lines",
        request.branch_id,
        request.items.len()
    );

    let sale = state.sale_service.create_sale(user.user_id, request).await?;

    Ok((StatusCode::CREATED, Json(CreateSaleResponse::from(&sale))))
}

/// Handler for GET /api/sales
pub async fn list_sales_handler(
    State(state): State<AppState>,
    Query(query): Query<ListSalesQuery>,
) -> Result<Json<Vec<SaleResponse>>, ApiError> {
    let sales = state.sale_service.list_sales(query.branch_id).await?;
    Ok(Json(sales.into_iter().map(SaleResponse::from).collect()))
}

/// Handler for GET /api/sales/:id
pub async fn get_sale_handler(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale = state.sale_service.get_sale(sale_id).await?;
    Ok(Json(sale.into()))
}

/// Handler for POST /api/sales/:id/cancel
pub async fn cancel_sale_handler(
    State(state): State<AppState>,
    user: ActingUser,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale = state.sale_service.cancel_sale(user.user_id, sale_id).await?;
    Ok(Json(sale.into()))
}

/// Handler for POST /api/sales/:id/items/:item_id/cancel
pub async fn cancel_sale_item_handler(
    State(state): State<AppState>,
    user: ActingUser,
    Path((sale_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale = state
        .sale_service
        .cancel_item(user.user_id, sale_id, item_id)
        .await?;
    Ok(Json(sale.into()))
}

/// Handler for DELETE /api/sales/:id
pub async fn delete_sale_handler(
    State(state): State<AppState>,
    user: ActingUser,
    Path(sale_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sale_service.delete_sale(user.user_id, sale_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
