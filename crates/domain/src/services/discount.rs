//! Product pricing with sales and coupons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, Money, Percentage, apply_discounts};

use crate::{Coupon, CouponCode, CouponId, Product, ProductId, Sale, SaleId};

/// Where a discount came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountSource {
    Sale { sale_id: SaleId, name: String },
    Coupon { coupon_id: CouponId, code: CouponCode },
}

/// One discount that took part in a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub source: DiscountSource,
    pub percentage: Percentage,
}

/// The price of one unit of a product at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub product_id: ProductId,
    pub base_price: Money,
    pub final_price: Money,
    /// Applied discounts, largest first (the order they were applied in).
    pub applied: Vec<AppliedDiscount>,
}

impl PriceQuote {
    /// Amount saved per unit.
    pub fn savings(&self) -> Money {
        self.base_price - self.final_price
    }

    /// Returns true if a coupon took part in the price.
    pub fn coupon_applied(&self) -> bool {
        self.applied
            .iter()
            .any(|d| matches!(d.source, DiscountSource::Coupon { .. }))
    }
}

/// Prices products by stacking every applicable discount.
pub struct DiscountService;

impl DiscountService {
    /// Prices one unit of `product` at `now`.
    ///
    /// Every sale that is active and targets the product contributes its
    /// percentage; so does the coupon when it is valid and its rules make the
    /// product eligible. The percentages are stacked with
    /// [`apply_discounts`].
    pub fn price<'a>(
        product: &Product,
        sales: impl IntoIterator<Item = &'a Sale>,
        coupon: Option<&Coupon>,
        now: DateTime<Utc>,
    ) -> PriceQuote {
        let categories = product.category_ids();

        let mut applied: Vec<AppliedDiscount> = sales
            .into_iter()
            .filter(|sale| sale.is_active(now) && sale.applies_to(product.id(), categories))
            .map(|sale| AppliedDiscount {
                source: DiscountSource::Sale {
                    sale_id: sale.id(),
                    name: sale.name().to_string(),
                },
                percentage: sale.percentage(),
            })
            .collect();

        if let Some(coupon) = coupon
            && coupon.is_valid(now)
            && coupon.applies_to(product.id(), categories)
        {
            applied.push(AppliedDiscount {
                source: DiscountSource::Coupon {
                    coupon_id: coupon.id(),
                    code: coupon.code().clone(),
                },
                percentage: coupon.percentage(),
            });
        }

        applied.sort_by(|a, b| b.percentage.cmp(&a.percentage));
        let percentages: Vec<Percentage> = applied.iter().map(|d| d.percentage).collect();

        PriceQuote {
            product_id: product.id(),
            base_price: product.price(),
            final_price: apply_discounts(product.price(), &percentages),
            applied,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{CategoryId, CouponRules, CouponTerms, NewProduct, SaleTerms};

    const NO_SALES: &[Sale] = &[];

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    fn pct(p: u32) -> Percentage {
        Percentage::from_percent(p).unwrap()
    }

    fn product(cents: i64, categories: BTreeSet<CategoryId>) -> Product {
        Product::create(
            NewProduct {
                name: "Lamp".into(),
                description: String::new(),
                sku: "LAMP-1".into(),
                price: Money::from_cents(cents),
                stock: 10,
                category_ids: categories,
            },
            now(),
        )
        .unwrap()
    }

    fn sale(p: u32, product: &Product, starts: DateTime<Utc>) -> Sale {
        let mut sale = Sale::create(
            SaleTerms {
                name: format!("{p}% off"),
                description: String::new(),
                percentage: pct(p),
                starts_at: starts,
                ends_at: starts + Duration::days(7),
            },
            now(),
        )
        .unwrap();
        sale.set_targets(BTreeSet::from([product.id()]), BTreeSet::new(), now());
        sale
    }

    fn coupon(p: u32) -> Coupon {
        Coupon::create(
            CouponCode::parse("TAKE10").unwrap(),
            CouponTerms {
                description: String::new(),
                percentage: pct(p),
                valid_from: now() - Duration::days(1),
                valid_until: now() + Duration::days(1),
                usage_limit: None,
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn no_discounts_keeps_base_price() {
        let lamp = product(5000, BTreeSet::new());
        let quote = DiscountService::price(&lamp, NO_SALES, None, now());
        assert_eq!(quote.final_price, quote.base_price);
        assert!(quote.applied.is_empty());
    }

    #[test]
    fn sales_and_coupon_stack_largest_first() {
        let lamp = product(10_000, BTreeSet::new());
        let sales = [sale(10, &lamp, now() - Duration::days(1))];
        let coupon = coupon(20);

        let quote = DiscountService::price(&lamp, &sales, Some(&coupon), now());
        // 100.00 - 20% = 80.00, then - 10% = 72.00
        assert_eq!(quote.final_price.cents(), 7200);
        assert_eq!(quote.savings().cents(), 2800);
        assert!(quote.coupon_applied());
        assert_eq!(quote.applied[0].percentage, pct(20));
        assert_eq!(quote.applied[1].percentage, pct(10));
    }

    #[test]
    fn inactive_sales_are_ignored() {
        let lamp = product(10_000, BTreeSet::new());
        let future = [sale(50, &lamp, now() + Duration::days(1))];
        let quote = DiscountService::price(&lamp, &future, None, now());
        assert_eq!(quote.final_price.cents(), 10_000);
    }

    #[test]
    fn ineligible_or_invalid_coupon_is_ignored() {
        let toys = CategoryId::new();
        let lamp = product(10_000, BTreeSet::from([toys]));

        let mut excluded = coupon(10);
        excluded
            .set_rules(
                CouponRules {
                    excluded_categories: BTreeSet::from([toys]),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();
        let quote = DiscountService::price(&lamp, NO_SALES, Some(&excluded), now());
        assert!(!quote.coupon_applied());

        let mut inactive = coupon(10);
        inactive.deactivate(now());
        let quote = DiscountService::price(&lamp, NO_SALES, Some(&inactive), now());
        assert_eq!(quote.final_price.cents(), 10_000);
    }
}
