use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{
    CategoryId, Coupon, CouponCode, CouponTerms, DiscountService, NewProduct, Product, Sale,
    SaleTerms,
};
use shared_kernel::{Money, Percentage, apply_discounts};

fn pct(p: u32) -> Percentage {
    Percentage::from_percent(p).unwrap()
}

fn bench_apply_discounts(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing/apply_discounts");
    for count in [1usize, 4, 16] {
        let discounts: Vec<Percentage> = (0..count).map(|i| pct(1 + (i as u32 * 7) % 60)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &discounts, |b, d| {
            b.iter(|| apply_discounts(Money::from_cents(123_456), d));
        });
    }
    group.finish();
}

fn bench_price_product(c: &mut Criterion) {
    let now = Utc::now();
    let category = CategoryId::new();
    let product = Product::create(
        NewProduct {
            name: "Bench widget".into(),
            description: String::new(),
            sku: "BENCH-1".into(),
            price: Money::from_cents(19_999),
            stock: 100,
            category_ids: BTreeSet::from([category]),
        },
        now,
    )
    .unwrap();

    let sales: Vec<Sale> = (0..50)
        .map(|i| {
            let mut sale = Sale::create(
                SaleTerms {
                    name: format!("Sale {i}"),
                    description: String::new(),
                    percentage: pct(1 + i % 40),
                    starts_at: now - Duration::days(1),
                    ends_at: now + Duration::days(1),
                },
                now,
            )
            .unwrap();
            // Every fifth sale targets the product's category.
            let categories = if i % 5 == 0 {
                BTreeSet::from([category])
            } else {
                BTreeSet::new()
            };
            sale.set_targets(BTreeSet::new(), categories, now);
            sale
        })
        .collect();

    let coupon = Coupon::create(
        CouponCode::parse("BENCH10").unwrap(),
        CouponTerms {
            description: String::new(),
            percentage: pct(10),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            usage_limit: None,
        },
        now,
    )
    .unwrap();

    c.bench_function("pricing/price_product_50_sales", |b| {
        b.iter(|| DiscountService::price(&product, &sales, Some(&coupon), now));
    });
}

criterion_group!(benches, bench_apply_discounts, bench_price_product);
criterion_main!(benches);
