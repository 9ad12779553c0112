// HTTP handlers for branch endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::branches::{Branch, CreateBranchRequest};
use crate::error::ApiError;
use crate::AppState;

/// Handler for POST /api/branches
pub async fn create_branch_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateBranchRequest>,
) -> Result<(StatusCode, Json<Branch>), ApiError> {
    payload.validate()?;

    let branch = state.branches.create(payload).await?;

    tracing::info!("Successfully created branch with id: {}", branch.id);
    Ok((StatusCode::CREATED, Json(branch)))
}

/// Handler for GET /api/branches
pub async fn list_branches_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Branch>>, ApiError> {
    Ok(Json(state.branches.list().await?))
}

/// Handler for GET /api/branches/:id
pub async fn get_branch_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Branch>, ApiError> {
    let branch = state
        .branches
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Branch", id))?;

    Ok(Json(branch))
}

/// Handler for DELETE /api/branches/:id
pub async fn delete_branch_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.branches.delete(id).await? {
        return Err(ApiError::not_found("Branch", id));
    }

    tracing::info!("Successfully deleted branch with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}
