//! Integration tests for the domain crate.
//!
//! These tests drive several aggregates together the way the application
//! layer does: price products, place an order, settle the payment and ship.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::{
    Address, CategoryId, Coupon, CouponCode, CouponError, CouponRules, CouponTerms,
    DiscountService, DomainError, Event, NewOrder, NewProduct, NewShipment, Order, OrderEvent,
    OrderLine, OrderStatus, Payment, PaymentEvent, PaymentMethod, Product, Sale, SaleTerms,
    Shipment, ShippingMethod, UserId,
};
use shared_kernel::{AggregateRoot, DomainEvent, Money, Percentage};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 2, 10, 0, 0).unwrap()
}

fn pct(p: u32) -> Percentage {
    Percentage::from_percent(p).unwrap()
}

fn address() -> Address {
    Address::new("42 Elm St", "Portland", "OR", "97201", "US").unwrap()
}

fn product(name: &str, cents: i64, stock: u32, categories: &[CategoryId]) -> Product {
    Product::create(
        NewProduct {
            name: name.into(),
            description: String::new(),
            sku: format!("SKU-{name}"),
            price: Money::from_cents(cents),
            stock,
            category_ids: categories.iter().copied().collect(),
        },
        now(),
    )
    .unwrap()
}

fn coupon(p: u32, limit: Option<u32>) -> Coupon {
    Coupon::create(
        CouponCode::parse("cyber-monday").unwrap(),
        CouponTerms {
            description: "Cyber Monday".into(),
            percentage: pct(p),
            valid_from: now() - Duration::hours(10),
            valid_until: now() + Duration::hours(14),
            usage_limit: limit,
        },
        now(),
    )
    .unwrap()
}

mod pricing {
    use super::*;

    #[test]
    fn category_sale_and_coupon_stack_on_every_line() {
        let electronics = CategoryId::new();
        let headphones = product("Headphones", 9_999, 10, &[electronics]);
        let cable = product("Cable", 999, 10, &[]);

        let mut sale = Sale::create(
            SaleTerms {
                name: "Electronics week".into(),
                description: String::new(),
                percentage: pct(30),
                starts_at: now() - Duration::days(1),
                ends_at: now() + Duration::days(6),
            },
            now(),
        )
        .unwrap();
        sale.set_targets(BTreeSet::new(), BTreeSet::from([electronics]), now());
        let sales = vec![sale];
        let coupon = coupon(5, None);

        let headphones_quote = DiscountService::price(&headphones, &sales, Some(&coupon), now());
        // 99.99 - 30% = 69.99 (69.993 rounded), then - 5% = 66.49 (66.4905 rounded)
        assert_eq!(headphones_quote.final_price.cents(), 6_649);
        assert_eq!(headphones_quote.applied.len(), 2);

        let cable_quote = DiscountService::price(&cable, &sales, Some(&coupon), now());
        // Only the coupon applies: 9.99 - 5% = 9.49 (9.4905 rounded)
        assert_eq!(cable_quote.final_price.cents(), 949);
        assert!(cable_quote.coupon_applied());
    }

    #[test]
    fn coupon_allow_list_limits_discount_to_listed_products() {
        let book = product("Book", 2_000, 5, &[]);
        let pen = product("Pen", 300, 5, &[]);

        let mut coupon = coupon(50, None);
        coupon
            .set_rules(
                CouponRules {
                    allowed_products: BTreeSet::from([book.id()]),
                    ..Default::default()
                },
                now(),
            )
            .unwrap();

        let none: Vec<Sale> = Vec::new();
        assert_eq!(
            DiscountService::price(&book, &none, Some(&coupon), now())
                .final_price
                .cents(),
            1_000
        );
        assert_eq!(
            DiscountService::price(&pen, &none, Some(&coupon), now())
                .final_price
                .cents(),
            300
        );
    }
}

mod checkout {
    use super::*;

    fn place(lines: Vec<OrderLine>, shipping: Money, coupon: Option<&Coupon>) -> Order {
        Order::place(
            NewOrder {
                owner_id: UserId::new(),
                lines,
                shipping_address: address(),
                shipping_method_id: domain::ShippingMethodId::new(),
                shipping_cost: shipping,
                coupon_id: coupon.map(|c| c.id()),
                payment_method: PaymentMethod::Pix,
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn order_payment_and_shipment_lifecycle() {
        let mut lamp = product("Lamp", 4_000, 3, &[]);
        let mut coupon = coupon(25, Some(1));
        let none: Vec<Sale> = Vec::new();

        let quote = DiscountService::price(&lamp, &none, Some(&coupon), now());
        lamp.remove_stock(2, now()).unwrap();
        coupon.redeem(now()).unwrap();

        let mut order = place(
            vec![OrderLine::new(
                lamp.id(),
                lamp.name(),
                2,
                quote.base_price,
                quote.final_price,
            )],
            Money::from_cents(1_000),
            Some(&coupon),
        );
        assert_eq!(order.subtotal().cents(), 6_000);
        assert_eq!(order.discount_total().cents(), 2_000);
        assert_eq!(order.total().cents(), 7_000);
        assert_eq!(lamp.stock(), 1);

        // The coupon's single use is spent.
        assert!(matches!(
            coupon.ensure_valid(now()),
            Err(CouponError::UsageLimitReached { .. })
        ));

        let created = order.take_events();
        let total = match &created[0] {
            OrderEvent::OrderCreated(data) => data.total,
            other => panic!("unexpected {}", other.event_type()),
        };

        let mut payment =
            Payment::create(order.id(), order.owner_id(), total, order.payment_method(), now())
                .unwrap();
        payment.approve("TXN-0001", now()).unwrap();
        let approved = payment.take_events();
        assert!(matches!(
            approved.last(),
            Some(PaymentEvent::PaymentApproved { order_id, .. }) if *order_id == order.id()
        ));

        order.mark_paid(now()).unwrap();

        let method =
            ShippingMethod::create(domain::CarrierId::new(), "Ground", Money::from_cents(1_000), 4, now())
                .unwrap();
        let mut shipment = Shipment::create(
            NewShipment {
                order_id: order.id(),
                owner_id: order.owner_id(),
                carrier_id: method.carrier_id(),
                shipping_method_id: method.id(),
                address: order.shipping_address().clone(),
                estimated_delivery: method.estimated_delivery(now()),
            },
            now(),
        );
        assert_eq!(shipment.estimated_delivery(), now() + Duration::days(4));

        shipment.ship("1Z999", now()).unwrap();
        order.mark_shipped(now()).unwrap();
        shipment.deliver(now() + Duration::days(3)).unwrap();
        order.mark_delivered(now() + Duration::days(3)).unwrap();

        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn canceling_restores_stock_and_coupon_use() {
        let mut lamp = product("Lamp", 4_000, 3, &[]);
        let mut coupon = coupon(10, Some(1));

        lamp.remove_stock(3, now()).unwrap();
        coupon.redeem(now()).unwrap();
        let mut order = place(
            vec![OrderLine::new(
                lamp.id(),
                lamp.name(),
                3,
                lamp.price(),
                lamp.price(),
            )],
            Money::zero(),
            Some(&coupon),
        );

        order.cancel("customer request", now()).unwrap();
        for line in order.lines() {
            lamp.add_stock(line.quantity, now()).unwrap();
        }
        coupon.release(now());

        assert_eq!(lamp.stock(), 3);
        assert!(coupon.is_valid(now()));

        // A canceled order stays canceled.
        let err: DomainError = order.mark_paid(now()).unwrap_err().into();
        assert!(err.is_state_conflict());
    }
}

mod events {
    use super::*;

    #[test]
    fn aggregate_events_lift_into_the_union() {
        let mut order = Order::place(
            NewOrder {
                owner_id: UserId::new(),
                lines: vec![OrderLine::new(
                    domain::ProductId::new(),
                    "Mug",
                    1,
                    Money::from_cents(1_200),
                    Money::from_cents(1_200),
                )],
                shipping_address: address(),
                shipping_method_id: domain::ShippingMethodId::new(),
                shipping_cost: Money::zero(),
                coupon_id: None,
                payment_method: PaymentMethod::BankSlip,
            },
            now(),
        )
        .unwrap();

        let events: Vec<Event> = order.take_events().into_iter().map(Event::from).collect();
        assert_eq!(events[0].event_type(), "OrderCreated");

        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["aggregate"], "Order");
        assert_eq!(json["event"]["type"], "OrderCreated");
        assert_eq!(json["event"]["data"]["total"]["cents"], 1_200);

        let back: Event = serde_json::from_value(json).unwrap();
        assert!(matches!(back, Event::Order(OrderEvent::OrderCreated(_))));
    }

    #[test]
    fn persisted_state_excludes_pending_events() {
        let order = Order::place(
            NewOrder {
                owner_id: UserId::new(),
                lines: vec![OrderLine::new(
                    domain::ProductId::new(),
                    "Mug",
                    1,
                    Money::from_cents(1_200),
                    Money::from_cents(1_000),
                )],
                shipping_address: address(),
                shipping_method_id: domain::ShippingMethodId::new(),
                shipping_cost: Money::zero(),
                coupon_id: None,
                payment_method: PaymentMethod::DebitCard,
            },
            now(),
        )
        .unwrap();

        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("events").is_none());
        assert_eq!(json["status"], "Pending");

        let mut restored: Order = serde_json::from_value(json).unwrap();
        assert!(restored.take_events().is_empty());
        assert_eq!(restored.total(), order.total());
    }
}
