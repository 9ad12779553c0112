use std::borrow::Cow;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::sales::error::SaleError;
use crate::sales::pricing::{PriceCalculator, MAX_QUANTITY, MIN_QUANTITY};
use crate::validation;

/// A single product line within a sale.
///
/// `unit_price` is a snapshot of the product price at sale time; `discount`
/// and `total_amount` are derived from it and `quantity` when the line is
/// priced and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub is_cancelled: bool,
}

impl SaleItem {
    /// Price a new line from a product price snapshot.
    pub fn price(product_id: Uuid, unit_price: Decimal, quantity: i32) -> Result<Self, SaleError> {
        let line = PriceCalculator::price_line(quantity, unit_price).ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add("items", quantity_error(quantity));
            SaleError::Validation(errors)
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            unit_price,
            discount: line.discount,
            total_amount: line.total,
            is_cancelled: false,
        })
    }

    /// Active -> Cancelled
    pub fn cancel(&mut self) -> Result<(), SaleError> {
        if self.is_cancelled {
            return Err(SaleError::InvalidTransition(format!(
                "Sale item {} is already cancelled",
                self.id
            )));
        }
        self.is_cancelled = true;
        Ok(())
    }
}

/// Sale header as stored in the `sales` table
#[derive(Debug, Clone, FromRow)]
pub struct SaleRow {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub branch_id: Uuid,
    pub user_id: Uuid,
    pub is_cancelled: bool,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Sale aggregate root.
///
/// Items are owned exclusively by the sale. The total is computed when the
/// aggregate is assembled (or rebuilt from storage) and there is no other
/// way to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub branch_id: Uuid,
    pub user_id: Uuid,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    total_amount: Decimal,
    items: Vec<SaleItem>,
}

impl Sale {
    /// Assemble a new, active sale from priced lines.
    pub fn assemble(branch_id: Uuid, user_id: Uuid, items: Vec<SaleItem>) -> Result<Self, SaleError> {
        if items.is_empty() {
            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("items_required");
            error.message = Some(Cow::from("Sale must contain at least one item"));
            errors.add("items", error);
            return Err(SaleError::Validation(errors));
        }

        let now = timestamp();
        let total_amount = Self::sum_items(&items);

        Ok(Self {
            id: Uuid::new_v4(),
            sale_number: generate_sale_number(),
            sale_date: now,
            branch_id,
            user_id,
            is_cancelled: false,
            created_at: now,
            updated_at: None,
            total_amount,
            items,
        })
    }

    /// Rebuild a sale loaded from storage. The stored total is ignored in
    /// favour of the sum of the loaded items.
    pub fn from_row(row: SaleRow, items: Vec<SaleItem>) -> Self {
        let total_amount = Self::sum_items(&items);
        if total_amount != row.total_amount {
            tracing::warn!(
                sale_id = %row.id,
                stored = %row.total_amount,
                computed = %total_amount,
                "Stored sale total differs from its items"
            );
        }

        Self {
            id: row.id,
            sale_number: row.sale_number,
            sale_date: row.sale_date,
            branch_id: row.branch_id,
            user_id: row.user_id,
            is_cancelled: row.is_cancelled,
            created_at: row.created_at,
            updated_at: row.updated_at,
            total_amount,
            items,
        }
    }

    fn sum_items(items: &[SaleItem]) -> Decimal {
        let totals: Vec<Decimal> = items.iter().map(|item| item.total_amount).collect();
        PriceCalculator::calculate_total(&totals)
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    #[cfg(test)]
    pub fn item(&self, item_id: Uuid) -> Option<&SaleItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Active -> Cancelled. Item flags are left untouched.
    pub fn cancel(&mut self) -> Result<(), SaleError> {
        if self.is_cancelled {
            return Err(SaleError::InvalidTransition(format!(
                "Sale {} is already cancelled",
                self.sale_number
            )));
        }
        self.is_cancelled = true;
        self.updated_at = Some(timestamp());
        Ok(())
    }

    /// Cancel one line. The parent's cancelled flag is not consulted or changed.
    pub fn cancel_item(&mut self, item_id: Uuid) -> Result<&SaleItem, SaleError> {
        let sale_id = self.id;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(SaleError::ItemNotFound { sale_id, item_id })?;

        item.cancel()?;
        self.updated_at = Some(timestamp());
        Ok(item)
    }
}

/// Current time at the microsecond precision PostgreSQL stores
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn quantity_error(quantity: i32) -> ValidationError {
    let mut error = ValidationError::new("quantity_out_of_range");
    error.message = Some(Cow::from(format!(
        "Quantity must be between {} and {}",
        MIN_QUANTITY, MAX_QUANTITY
    )));
    error.add_param(Cow::from("quantity"), &quantity);
    error
}

/// Opaque, collision-resistant sale number derived from a v4 UUID
pub fn generate_sale_number() -> String {
    format!("SALE-{}", Uuid::new_v4().simple().to_string().to_uppercase())
}

/// Request DTO for one line of a new sale
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaleItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 20, message = "Quantity must be between 1 and 20"))]
    pub quantity: i32,
}

/// Request DTO for creating a new sale
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSaleRequest {
    pub branch_id: Uuid,
    #[validate(length(min = 1, message = "Sale must contain at least one item"))]
    pub items: Vec<SaleItemRequest>,
}

impl CreateSaleRequest {
    /// Structural checks performed before any lookup: derive rules, nil ids
    /// and per-line quantity bounds.
    pub fn validate_for(&self, user_id: Uuid) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        if let Err(error) = validation::validate_required_id(&self.branch_id) {
            errors.add("branch_id", error);
        }
        if let Err(error) = validation::validate_required_id(&user_id) {
            errors.add("user_id", error);
        }

        for (index, item) in self.items.iter().enumerate() {
            if item.validate().is_err() {
                let mut error = quantity_error(item.quantity);
                error.add_param(Cow::from("line"), &index);
                errors.add("items", error);
            }
            if let Err(error) = validation::validate_required_id(&item.product_id) {
                errors.add("items", error);
            }
        }

        validation::into_result(errors)
    }
}

/// Query parameters for sale listing
#[derive(Debug, Default, Deserialize)]
pub struct ListSalesQuery {
    pub branch_id: Option<Uuid>,
}

/// Response DTO returned after creating a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleResponse {
    pub id: Uuid,
    pub sale_number: String,
    pub total_amount: Decimal,
}

impl From<&Sale> for CreateSaleResponse {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id,
            sale_number: sale.sale_number.clone(),
            total_amount: sale.total_amount(),
        }
    }
}

/// Response DTO for a sale with its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleResponse {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub branch_id: Uuid,
    pub user_id: Uuid,
    pub is_cancelled: bool,
    pub total_amount: Decimal,
    pub items: Vec<SaleItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        let total_amount = sale.total_amount();
        Self {
            id: sale.id,
            sale_number: sale.sale_number,
            sale_date: sale.sale_date,
            branch_id: sale.branch_id,
            user_id: sale.user_id,
            is_cancelled: sale.is_cancelled,
            total_amount,
            items: sale.items,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i32, unit_price: Decimal) -> SaleItem {
        SaleItem::price(Uuid::new_v4(), unit_price, quantity).expect("quantity in range")
    }

    #[test]
    fn test_assemble_sums_line_totals() {
        let items = vec![line(3, dec!(10)), line(5, dec!(20)), line(10, dec!(50))];
        let sale = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), items).unwrap();

        assert_eq!(sale.total_amount(), dec!(520));
        assert_eq!(sale.items().len(), 3);
        assert!(!sale.is_cancelled);
        assert!(sale.updated_at.is_none());
        assert_eq!(sale.sale_date, sale.created_at);
    }

    #[test]
    fn test_assemble_timestamps_fit_database_precision() {
        let sale = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), vec![line(1, dec!(3))]).unwrap();
        assert_eq!(sale.created_at.timestamp_subsec_nanos() % 1_000, 0);
        assert_eq!(sale.sale_date, sale.sale_date.trunc_subsecs(6));
    }

    #[test]
    fn test_assemble_rejects_empty_items() {
        let err = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), vec![]).unwrap_err();
        assert!(matches!(err, SaleError::Validation(_)));
    }

    #[test]
    fn test_assemble_preserves_line_order() {
        let first = line(1, dec!(1));
        let second = line(2, dec!(2));
        let ids = vec![first.id, second.id];
        let sale = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), vec![first, second]).unwrap();

        let stored: Vec<Uuid> = sale.items().iter().map(|item| item.id).collect();
        assert_eq!(stored, ids);
    }

    #[test]
    fn test_sale_numbers_are_unique() {
        let a = generate_sale_number();
        let b = generate_sale_number();
        assert_ne!(a, b);
        assert!(a.starts_with("SALE-"));
        assert_eq!(a.len(), "SALE-".len() + 32);
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut sale = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), vec![line(2, dec!(5))]).unwrap();
        sale.cancel().unwrap();
        assert!(sale.is_cancelled);
        assert!(sale.updated_at.is_some());

        let err = sale.cancel().unwrap_err();
        assert!(matches!(err, SaleError::InvalidTransition(_)));
    }

    #[test]
    fn test_cancel_does_not_cascade_to_items() {
        let mut sale = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), vec![line(2, dec!(5))]).unwrap();
        sale.cancel().unwrap();
        assert!(sale.items().iter().all(|item| !item.is_cancelled));
    }

    #[test]
    fn test_cancel_item_leaves_sale_active_and_total_unchanged() {
        let kept = line(4, dec!(10));
        let cancelled = line(1, dec!(7));
        let cancelled_id = cancelled.id;
        let mut sale = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), vec![kept, cancelled]).unwrap();
        let before = sale.total_amount();

        let item = sale.cancel_item(cancelled_id).unwrap();
        assert!(item.is_cancelled);
        assert!(!sale.is_cancelled);
        assert_eq!(sale.total_amount(), before);

        let err = sale.cancel_item(cancelled_id).unwrap_err();
        assert!(matches!(err, SaleError::InvalidTransition(_)));
    }

    #[test]
    fn test_cancel_unknown_item() {
        let mut sale = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), vec![line(1, dec!(1))]).unwrap();
        let missing = Uuid::new_v4();
        let err = sale.cancel_item(missing).unwrap_err();
        assert!(matches!(err, SaleError::ItemNotFound { item_id, .. } if item_id == missing));
    }

    #[test]
    fn test_from_row_recomputes_total() {
        let items = vec![line(3, dec!(10)), line(4, dec!(10))];
        let row = SaleRow {
            id: Uuid::new_v4(),
            sale_number: generate_sale_number(),
            sale_date: Utc::now(),
            branch_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            is_cancelled: false,
            total_amount: dec!(999),
            created_at: Utc::now(),
            updated_at: None,
        };

        let sale = Sale::from_row(row, items);
        assert_eq!(sale.total_amount(), dec!(66));
    }

    #[test]
    fn test_validate_for_accepts_valid_request() {
        let request = CreateSaleRequest {
            branch_id: Uuid::new_v4(),
            items: vec![SaleItemRequest { product_id: Uuid::new_v4(), quantity: 20 }],
        };
        assert!(request.validate_for(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_validate_for_rejects_bad_input() {
        let empty = CreateSaleRequest { branch_id: Uuid::new_v4(), items: vec![] };
        let errors = empty.validate_for(Uuid::new_v4()).unwrap_err();
        assert!(errors.field_errors().contains_key("items"));

        let nil_branch = CreateSaleRequest {
            branch_id: Uuid::nil(),
            items: vec![SaleItemRequest { product_id: Uuid::new_v4(), quantity: 1 }],
        };
        let errors = nil_branch.validate_for(Uuid::new_v4()).unwrap_err();
        assert!(errors.field_errors().contains_key("branch_id"));

        let errors = nil_branch.validate_for(Uuid::nil()).unwrap_err();
        assert!(errors.field_errors().contains_key("user_id"));

        for quantity in [0, 21] {
            let request = CreateSaleRequest {
                branch_id: Uuid::new_v4(),
                items: vec![SaleItemRequest { product_id: Uuid::new_v4(), quantity }],
            };
            let errors = request.validate_for(Uuid::new_v4()).unwrap_err();
            assert!(errors.field_errors().contains_key("items"));
        }
    }

    #[test]
    fn test_sale_response_keeps_derived_total() {
        let sale = Sale::assemble(Uuid::new_v4(), Uuid::new_v4(), vec![line(10, dec!(50))]).unwrap();
        let response = SaleResponse::from(sale.clone());
        assert_eq!(response.total_amount, dec!(400));
        assert_eq!(response.items, sale.items().to_vec());

        let created = CreateSaleResponse::from(&sale);
        assert_eq!(created.id, sale.id);
        assert_eq!(created.total_amount, dec!(400));
    }
}
