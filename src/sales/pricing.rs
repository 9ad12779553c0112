use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Smallest quantity accepted on a sale line
pub const MIN_QUANTITY: i32 = 1;

/// Largest quantity accepted on a sale line
pub const MAX_QUANTITY: i32 = 20;

/// Quantity-based discount tier applied to a single sale line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountTier {
    /// 1 to 3 units, no discount
    Standard,
    /// 4 to 9 units, 10% off
    Bulk,
    /// 10 to 20 units, 20% off
    Wholesale,
}

impl DiscountTier {
    /// Look up the tier for a line quantity.
    ///
    /// Returns `None` for quantities outside `MIN_QUANTITY..=MAX_QUANTITY`;
    /// those never reach pricing.
    pub fn for_quantity(quantity: i32) -> Option<Self> {
        match quantity {
            1..=3 => Some(DiscountTier::Standard),
            4..=9 => Some(DiscountTier::Bulk),
            10..=20 => Some(DiscountTier::Wholesale),
            _ => None,
        }
    }

    /// Exact discount fraction for this tier
    pub fn rate(self) -> Decimal {
        match self {
            DiscountTier::Standard => Decimal::ZERO,
            DiscountTier::Bulk => Decimal::new(10, 2),
            DiscountTier::Wholesale => Decimal::new(20, 2),
        }
    }
}

/// Priced sale line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePrice {
    pub discount: Decimal,
    pub total: Decimal,
}

/// Service for calculating sale line amounts and sale totals
pub struct PriceCalculator;

impl PriceCalculator {
    /// Gross amount for a line before discount (unit_price * quantity)
    pub fn calculate_subtotal(quantity: i32, unit_price: Decimal) -> Decimal {
        Decimal::from(quantity) * unit_price
    }

    /// Price a line: tier discount then `subtotal * (1 - discount)`.
    ///
    /// Returns `None` when the quantity falls outside the tier table.
    pub fn price_line(quantity: i32, unit_price: Decimal) -> Option<LinePrice> {
        let discount = DiscountTier::for_quantity(quantity)?.rate();
        let subtotal = Self::calculate_subtotal(quantity, unit_price);

        Some(LinePrice {
            discount,
            total: subtotal * (Decimal::ONE - discount),
        })
    }

    /// Sale total as the sum of line totals
    pub fn calculate_total(line_totals: &[Decimal]) -> Decimal {
        line_totals.iter().sum()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Discount is fully determined by quantity
        #[test]
        fn prop_discount_follows_tier_table(quantity in MIN_QUANTITY..=MAX_QUANTITY) {
            let expected = if quantity <= 3 {
                Decimal::ZERO
            } else if quantity <= 9 {
                Decimal::new(10, 2)
            } else {
                Decimal::new(20, 2)
            };
            let line = PriceCalculator::price_line(quantity, Decimal::ONE).unwrap();
            prop_assert_eq!(line.discount, expected);
        }

        /// Line total == unit_price * quantity * (1 - discount)
        #[test]
        fn prop_line_total_invariant(
            quantity in MIN_QUANTITY..=MAX_QUANTITY,
            price_cents in 1u32..=1_000_000u32
        ) {
            let unit_price = Decimal::from(price_cents) / Decimal::from(100);
            let line = PriceCalculator::price_line(quantity, unit_price).unwrap();
            let expected = unit_price * Decimal::from(quantity) * (Decimal::ONE - line.discount);
            prop_assert_eq!(line.total, expected);
            prop_assert!(line.total > Decimal::ZERO);
            prop_assert!(line.total <= unit_price * Decimal::from(quantity));
        }

        /// Quantities outside the accepted range never price
        #[test]
        fn prop_out_of_range_rejected(quantity in prop_oneof![i32::MIN..MIN_QUANTITY, (MAX_QUANTITY + 1)..i32::MAX]) {
            prop_assert!(PriceCalculator::price_line(quantity, Decimal::ONE).is_none());
        }

        /// Order of lines does not affect the total
        #[test]
        fn prop_total_is_commutative(totals_cents in prop::collection::vec(1u32..=100_000u32, 1..=20)) {
            let totals: Vec<Decimal> = totals_cents
                .iter()
                .map(|&cents| Decimal::from(cents) / Decimal::from(100))
                .collect();
            let mut reversed = totals.clone();
            reversed.reverse();
            prop_assert_eq!(
                PriceCalculator::calculate_total(&totals),
                PriceCalculator::calculate_total(&reversed)
            );
        }
    }
}
