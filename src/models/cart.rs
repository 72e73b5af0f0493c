use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::{checked_total, line_subtotal};
use crate::errors::ServiceError;

/// A cart line enriched with the catalog facts coupon scoping needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub variation_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_price: Decimal,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub vendor_id: Option<Uuid>,
}

impl CartLine {
    pub fn new(product_id: Uuid, quantity: i64, unit_price: Decimal) -> Self {
        Self {
            product_id,
            variation_id: None,
            quantity,
            unit_price,
            category_ids: Vec::new(),
            on_sale: false,
            vendor_id: None,
        }
    }

    /// Rounded line total. Lines are built from cart items that passed
    /// [`cart_subtotal`], so the product fits; it saturates otherwise.
    pub fn subtotal(&self) -> Decimal {
        line_subtotal(self.unit_price, self.quantity).unwrap_or(Decimal::MAX)
    }
}

/// Checked sum of the line totals.
pub fn cart_subtotal(lines: &[CartLine]) -> Result<Decimal, ServiceError> {
    checked_total(
        lines
            .iter()
            .map(|line| line_subtotal(line.unit_price, line.quantity)),
    )
}

pub fn total_quantity(lines: &[CartLine]) -> i64 {
    lines
        .iter()
        .fold(0i64, |total, line| total.saturating_add(line.quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn subtotal_overflow_is_an_error() {
        let lines = vec![
            CartLine::new(Uuid::new_v4(), 3, dec!(10)),
            CartLine::new(Uuid::new_v4(), 1_000_000_000, dec!(79228162514264337593543950)),
        ];
        assert_matches!(cart_subtotal(&lines), Err(ServiceError::InvalidInput(_)));
        assert_eq!(cart_subtotal(&lines[..1]).unwrap(), dec!(30));
    }

    #[test]
    fn quantity_total_saturates() {
        let lines = vec![
            CartLine::new(Uuid::new_v4(), i64::MAX, dec!(1)),
            CartLine::new(Uuid::new_v4(), 5, dec!(1)),
        ];
        assert_eq!(total_quantity(&lines), i64::MAX);
    }
}
