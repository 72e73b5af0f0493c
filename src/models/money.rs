//! Money helpers.
//!
//! Amounts travel through the services as `Decimal` and are persisted as
//! integer cents. Every conversion rounds to two places, half away from zero.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::errors::ServiceError;

const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest unit price, shipping cost or cart total a request may carry.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Round to cents, half-up.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a decimal amount into integer cents. Amounts that do not fit an `i64`
/// are rejected.
pub fn to_cents(value: Decimal) -> Result<i64, ServiceError> {
    round_money(value)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| ServiceError::InvalidInput(format!("amount {} is out of range", value)))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// `value * percent / 100`, rounded to cents.
pub fn percent_of(value: Decimal, percent: Decimal) -> Decimal {
    round_money(value * percent / Decimal::ONE_HUNDRED)
}

pub fn line_subtotal(unit_price: Decimal, quantity: i64) -> Result<Decimal, ServiceError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .map(round_money)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "line total for {} x {} is out of range",
                quantity, unit_price
            ))
        })
}

/// Sum of amounts, failing instead of overflowing.
pub fn checked_total<I>(amounts: I) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = Result<Decimal, ServiceError>>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(amount?)
            .ok_or_else(|| ServiceError::InvalidInput("cart total is out of range".to_string()))
    })
}

/// Rejects negative amounts and amounts above [`MAX_AMOUNT`].
pub fn ensure_amount(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value.is_sign_negative() {
        return Err(ServiceError::InvalidInput(format!("{} cannot be negative", field)));
    }
    if value > MAX_AMOUNT {
        return Err(ServiceError::InvalidInput(format!(
            "{} cannot exceed {}",
            field, MAX_AMOUNT
        )));
    }
    Ok(())
}

/// True when two amounts differ by no more than one cent.
pub fn amounts_match(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
    }

    #[test]
    fn cents_conversion() {
        assert_eq!(to_cents(dec!(19.99)).unwrap(), 1999);
        assert_eq!(to_cents(dec!(0.005)).unwrap(), 1);
        assert_eq!(from_cents(1999), dec!(19.99));
        assert_eq!(from_cents(to_cents(dec!(120)).unwrap()), dec!(120.00));
    }

    #[test]
    fn out_of_range_amounts_are_errors() {
        assert_matches!(to_cents(dec!(100000000000000000000)), Err(ServiceError::InvalidInput(_)));
        assert_matches!(
            line_subtotal(dec!(79228162514264337593543950), 1_000_000_000),
            Err(ServiceError::InvalidInput(_))
        );
        assert_matches!(
            checked_total([Ok(Decimal::MAX), Ok(Decimal::ONE)]),
            Err(ServiceError::InvalidInput(_))
        );
        assert_eq!(
            checked_total([line_subtotal(dec!(2.50), 4), Ok(dec!(1))]).unwrap(),
            dec!(11.00)
        );
    }

    #[test]
    fn amount_bounds() {
        assert!(ensure_amount("price", Decimal::ZERO).is_ok());
        assert!(ensure_amount("price", MAX_AMOUNT).is_ok());
        assert_matches!(ensure_amount("price", dec!(-0.01)), Err(ServiceError::InvalidInput(_)));
        assert_matches!(
            ensure_amount("price", MAX_AMOUNT + Decimal::ONE),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn percentage_of_amount() {
        assert_eq!(percent_of(dec!(100), dec!(20)), dec!(20.00));
        assert_eq!(percent_of(dec!(33.33), dec!(3)), dec!(1.00));
    }

    #[test]
    fn tolerance_comparison() {
        assert!(amounts_match(dec!(10.00), dec!(10.01)));
        assert!(!amounts_match(dec!(10.00), dec!(10.02)));
    }
}
