use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Store location under which sales are recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a branch
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 200, message = "Branch name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Location must be at most 500 characters"))]
    pub location: Option<String>,
}
