// Validation utilities module
// Domain rules that the validator derive cannot express on its own

use std::borrow::Cow;

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// Largest number of fractional digits a stored price keeps
pub const PRICE_SCALE: u32 = 2;

/// Prices must stay below 10^10 to fit the `NUMERIC(12,2)` columns
pub fn max_unit_price() -> Decimal {
    Decimal::new(10_000_000_000, 0)
}

/// Validates that a unit price is strictly positive and fits the stored precision
pub fn validate_unit_price(price: &Decimal) -> Result<(), ValidationError> {
    let price = *price;
    if price <= Decimal::ZERO {
        let mut error = ValidationError::new("price_must_be_positive");
        error.message = Some(Cow::from("Unit price must be greater than zero"));
        return Err(error);
    }
    if price.normalize().scale() > PRICE_SCALE {
        let mut error = ValidationError::new("price_precision");
        error.message = Some(Cow::from("Unit price must have at most 2 decimal places"));
        error.add_param(Cow::from("value"), &price.to_string());
        return Err(error);
    }
    if price >= max_unit_price() {
        let mut error = ValidationError::new("price_out_of_range");
        error.message = Some(Cow::from("Unit price must be less than 10000000000"));
        error.add_param(Cow::from("value"), &price.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validates that an identifier is not the nil UUID
pub fn validate_required_id(id: &Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        let mut error = ValidationError::new("id_required");
        error.message = Some(Cow::from("Identifier must not be empty"));
        Err(error)
    } else {
        Ok(())
    }
}

/// Validates that a display name is non-blank
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut error = ValidationError::new("name_required");
        error.message = Some(Cow::from("Name must not be blank"));
        Err(error)
    } else {
        Ok(())
    }
}

/// Turns an accumulated error set into a `Result`
pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
