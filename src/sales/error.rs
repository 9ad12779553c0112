use uuid::Uuid;
use validator::ValidationErrors;

use crate::db::StoreError;

/// Error types for sale operations
#[derive(Debug, thiserror::Error)]
pub enum SaleError {
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Branch not found: {0}")]
    BranchNotFound(Uuid),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Sale not found: {0}")]
    SaleNotFound(Uuid),

    #[error("Sale item {item_id} not found in sale {sale_id}")]
    ItemNotFound { sale_id: Uuid, item_id: Uuid },

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl From<ValidationErrors> for SaleError {
    fn from(errors: ValidationErrors) -> Self {
        SaleError::Validation(errors)
    }
}

impl From<sqlx::Error> for SaleError {
    fn from(err: sqlx::Error) -> Self {
        SaleError::Persistence(StoreError::Database(err))
    }
}
