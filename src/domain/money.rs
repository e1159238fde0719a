//! Money helpers. Amounts are rupees held as `Decimal` with two places.

use rust_decimal::Decimal;

/// Highest list price accepted for a menu item, in rupees.
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Cost of `quantity` units at `unit_price`, or `None` if it does not fit.
pub fn line_total(unit_price: Decimal, quantity: u32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity)).map(round_money)
}

/// Sums line totals, giving up on the first overflow.
pub fn checked_total(lines: impl IntoIterator<Item = (Decimal, u32)>) -> Option<Decimal> {
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, (price, quantity)| acc.checked_add(line_total(price, quantity)?))
        .map(round_money)
}

/// Renders an amount the way the UI shows it, e.g. `₹130.00`.
pub fn format_inr(amount: Decimal) -> String {
    format!("₹{:.2}", round_money(amount))
}

/// Validates a list price: strictly positive, at most [`MAX_PRICE`], at most
/// two decimal places.
pub fn validate_price(price: Decimal) -> Result<Decimal, String> {
    if price <= Decimal::ZERO {
        return Err(format!("Price must be positive, got {}", price));
    }
    if price > MAX_PRICE {
        return Err(format!("Price cannot exceed {}, got {}", format_inr(MAX_PRICE), price));
    }
    if price.scale() > 2 && price != round_money(price) {
        return Err(format!("Price has more than two decimal places: {}", price));
    }
    Ok(round_money(price))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_and_format() {
        let total = checked_total([(Decimal::new(50, 0), 2), (Decimal::new(30, 0), 1)]).unwrap();
        assert_eq!(total, Decimal::new(130, 0));
        assert_eq!(line_total(Decimal::new(4550, 2), 3), Some(Decimal::new(13650, 2)));
        assert_eq!(format_inr(total), "₹130.00");
        assert_eq!(format_inr(Decimal::new(4550, 2)), "₹45.50");
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(Decimal::new(-5, 0)).is_err());
        assert!(validate_price(Decimal::new(12345, 3)).is_err());
        assert!(validate_price(MAX_PRICE + Decimal::ONE).is_err());
        assert_eq!(validate_price(MAX_PRICE), Ok(MAX_PRICE));
        assert_eq!(validate_price(Decimal::new(1250, 2)), Ok(Decimal::new(1250, 2)));
        // Trailing zeros beyond two places are fine.
        assert_eq!(validate_price(Decimal::new(12500, 3)), Ok(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_overflowing_totals_are_none() {
        assert_eq!(line_total(Decimal::MAX, u32::MAX), None);
        assert_eq!(checked_total([(Decimal::MAX, 1), (Decimal::MAX, 1)]), None);
        assert_eq!(checked_total(std::iter::empty()), Some(Decimal::ZERO));
    }
}
