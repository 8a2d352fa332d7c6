//! Discount stacking.

use crate::{Money, Percentage};

/// Applies a set of percentage discounts to a base price.
///
/// Discounts are applied largest first, each one to the amount left by the
/// previous: 20% then 10% off $100 yields $72, not $70.
pub fn apply_discounts(base_price: Money, discounts: &[Percentage]) -> Money {
    let mut ordered = discounts.to_vec();
    ordered.sort_unstable_by(|a, b| b.cmp(a));

    ordered
        .into_iter()
        .fold(base_price, |amount, pct| amount.apply_discount(pct))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(p: u32) -> Percentage {
        Percentage::from_percent(p).unwrap()
    }

    #[test]
    fn no_discounts_returns_base_price() {
        let price = Money::from_cents(1999);
        assert_eq!(apply_discounts(price, &[]), price);
    }

    #[test]
    fn discounts_compound_instead_of_adding() {
        let price = Money::from_dollars(100);
        assert_eq!(apply_discounts(price, &[pct(10), pct(20)]).cents(), 7200);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let price = Money::from_cents(12_345);
        let a = apply_discounts(price, &[pct(5), pct(30), pct(15)]);
        let b = apply_discounts(price, &[pct(30), pct(15), pct(5)]);
        assert_eq!(a, b);
    }

    #[test]
    fn largest_discount_applies_first_for_rounding() {
        // 30% of 999 = 299.7 -> 300, leaves 699; 5% of 699 = 34.95 -> 35, leaves 664.
        let price = Money::from_cents(999);
        assert_eq!(apply_discounts(price, &[pct(5), pct(30)]).cents(), 664);
    }

    #[test]
    fn full_discount_bottoms_out_at_zero() {
        let price = Money::from_dollars(50);
        assert_eq!(apply_discounts(price, &[pct(100), pct(10)]), Money::zero());
    }
}
