use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation;

/// Catalog product. Sales read `unit_price` once and keep their own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request DTO for creating a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(
        length(min = 1, max = 200, message = "Product name must be 1-200 characters"),
        custom = "validation::validate_name"
    )]
    pub name: String,
    #[validate(custom = "validation::validate_unit_price")]
    pub unit_price: Decimal,
}

/// Request DTO for updating a product. Omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(
        length(min = 1, max = 200, message = "Product name must be 1-200 characters"),
        custom = "validation::validate_name"
    )]
    pub name: Option<String>,
    #[validate(custom = "validation::validate_unit_price")]
    pub unit_price: Option<Decimal>,
}
