//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, Money, Version};

use super::{
    OrderError, OrderEvent, OrderLine, OrderStatus,
    events::{
        OrderCanceledData, OrderCreatedData, OrderDeliveredData, OrderPaidData, OrderShippedData,
    },
};
use crate::{Address, CouponId, OrderId, PaymentMethod, ShippingMethodId, UserId};

/// Input for [`Order::place`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner_id: UserId,
    pub lines: Vec<OrderLine>,
    pub shipping_address: Address,
    pub shipping_method_id: ShippingMethodId,
    pub shipping_cost: Money,
    pub coupon_id: Option<CouponId>,
    pub payment_method: PaymentMethod,
}

/// Order aggregate root.
///
/// Represents an order from placement to delivery or cancellation. Lines
/// are priced when the order is placed and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// User who placed the order.
    owner_id: UserId,

    /// Current status of the order.
    status: OrderStatus,

    /// Ordered products, one line per product.
    lines: Vec<OrderLine>,

    shipping_address: Address,
    shipping_method_id: ShippingMethodId,
    shipping_cost: Money,

    /// Coupon redeemed for this order, if any.
    coupon_id: Option<CouponId>,

    payment_method: PaymentMethod,
    cancel_reason: Option<String>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,

    /// Current version for optimistic concurrency.
    #[serde(skip)]
    version: Version,

    #[serde(skip)]
    events: Vec<OrderEvent>,
}

impl AggregateRoot for Order {
    type Id = OrderId;
    type Event = OrderEvent;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> OrderId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }
}

// Query methods
impl Order {
    /// Returns the owner ID.
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns all lines of the order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn shipping_method_id(&self) -> ShippingMethodId {
        self.shipping_method_id
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    pub fn coupon_id(&self) -> Option<CouponId> {
        self.coupon_id
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of the discounted line totals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(OrderLine::total).sum()
    }

    /// Amount saved through sales and coupons.
    pub fn discount_total(&self) -> Money {
        self.lines.iter().map(OrderLine::discount).sum()
    }

    /// Amount to charge: subtotal plus shipping.
    pub fn total(&self) -> Money {
        self.subtotal() + self.shipping_cost
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Merges lines for the same product, keeping the first line's prices.
fn merge_lines(lines: Vec<OrderLine>) -> Result<Vec<OrderLine>, OrderError> {
    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or(OrderError::AmountTooLarge)?;
            }
            None => merged.push(line),
        }
    }
    Ok(merged)
}

/// Undiscounted total of `lines` plus shipping, or None if it overflows.
///
/// Discounted amounts never exceed base prices, so every other total of an
/// order that passes this check is representable too.
fn checked_base_total(lines: &[OrderLine], shipping_cost: Money) -> Option<Money> {
    lines.iter().try_fold(shipping_cost, |total, line| {
        total.checked_add(line.base_price.checked_multiply(line.quantity)?)
    })
}

// Command methods
impl Order {
    /// Places a new order.
    pub fn place(new: NewOrder, now: DateTime<Utc>) -> Result<Self, OrderError> {
        if new.lines.is_empty() {
            return Err(OrderError::NoLines);
        }
        for line in &new.lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: line.quantity,
                });
            }
            if !line.base_price.is_positive()
                || line.unit_price.is_negative()
                || line.unit_price > line.base_price
            {
                return Err(OrderError::InvalidPrice {
                    product_id: line.product_id,
                });
            }
        }
        if new.shipping_cost.is_negative() {
            return Err(OrderError::InvalidShippingCost {
                cost: new.shipping_cost,
            });
        }

        let lines = merge_lines(new.lines)?;
        if checked_base_total(&lines, new.shipping_cost).is_none() {
            return Err(OrderError::AmountTooLarge);
        }

        let mut order = Self {
            id: OrderId::new(),
            owner_id: new.owner_id,
            status: OrderStatus::Pending,
            lines,
            shipping_address: new.shipping_address,
            shipping_method_id: new.shipping_method_id,
            shipping_cost: new.shipping_cost,
            coupon_id: new.coupon_id,
            payment_method: new.payment_method,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
            canceled_at: None,
            version: Version::initial(),
            events: Vec::new(),
        };

        order
            .events
            .push(OrderEvent::OrderCreated(OrderCreatedData {
                order_id: order.id,
                owner_id: order.owner_id,
                total: order.total(),
                payment_method: order.payment_method,
                created_at: now,
            }));
        Ok(order)
    }

    /// Marks the order as paid.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_pay() {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action: "mark paid",
            });
        }

        self.status = OrderStatus::Paid;
        self.paid_at = Some(now);
        self.updated_at = now;
        self.events.push(OrderEvent::OrderPaid(OrderPaidData {
            order_id: self.id,
            paid_at: now,
        }));
        Ok(())
    }

    /// Marks the order as shipped.
    pub fn mark_shipped(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_ship() {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action: "mark shipped",
            });
        }

        self.status = OrderStatus::Shipped;
        self.shipped_at = Some(now);
        self.updated_at = now;
        self.events.push(OrderEvent::OrderShipped(OrderShippedData {
            order_id: self.id,
            shipped_at: now,
        }));
        Ok(())
    }

    /// Marks the order as delivered.
    pub fn mark_delivered(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_deliver() {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action: "mark delivered",
            });
        }

        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(now);
        self.updated_at = now;
        self.events
            .push(OrderEvent::OrderDelivered(OrderDeliveredData {
                order_id: self.id,
                delivered_at: now,
            }));
        Ok(())
    }

    /// Cancels the order. Only pending orders can be canceled.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStatusTransition {
                current: self.status,
                action: "cancel",
            });
        }

        let reason = reason.into();
        self.status = OrderStatus::Canceled;
        self.cancel_reason = Some(reason.clone());
        self.canceled_at = Some(now);
        self.updated_at = now;
        self.events.push(OrderEvent::OrderCanceled(OrderCanceledData {
            order_id: self.id,
            reason,
            canceled_at: now,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProductId;
    use shared_kernel::DomainEvent;

    fn address() -> Address {
        Address::new("1 Main St", "Springfield", "IL", "62701", "US").unwrap()
    }

    fn new_order(lines: Vec<OrderLine>) -> NewOrder {
        NewOrder {
            owner_id: UserId::new(),
            lines,
            shipping_address: address(),
            shipping_method_id: ShippingMethodId::new(),
            shipping_cost: Money::from_cents(500),
            coupon_id: None,
            payment_method: PaymentMethod::CreditCard,
        }
    }

    fn line(product_id: ProductId, quantity: u32, base: i64, unit: i64) -> OrderLine {
        OrderLine::new(
            product_id,
            "Widget",
            quantity,
            Money::from_cents(base),
            Money::from_cents(unit),
        )
    }

    #[test]
    fn test_place_computes_totals() {
        let order = Order::place(
            new_order(vec![
                line(ProductId::new(), 2, 1000, 800),
                line(ProductId::new(), 1, 500, 500),
            ]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.subtotal().cents(), 2100);
        assert_eq!(order.discount_total().cents(), 400);
        assert_eq!(order.total().cents(), 2600);
        assert_eq!(order.total_quantity(), 3);
    }

    #[test]
    fn test_place_raises_order_created_with_total() {
        let mut order =
            Order::place(new_order(vec![line(ProductId::new(), 1, 1000, 1000)]), Utc::now())
                .unwrap();

        let events = order.take_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            OrderEvent::OrderCreated(data) => {
                assert_eq!(data.order_id, order.id());
                assert_eq!(data.total.cents(), 1500);
                assert_eq!(data.payment_method, PaymentMethod::CreditCard);
            }
            other => panic!("unexpected event {}", other.event_type()),
        }
    }

    #[test]
    fn test_place_merges_duplicate_products() {
        let product = ProductId::new();
        let order = Order::place(
            new_order(vec![line(product, 1, 1000, 900), line(product, 2, 1000, 900)]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].quantity, 3);
    }

    #[test]
    fn test_place_rejects_totals_that_overflow() {
        let price = i64::MAX / 2 + 1;
        assert_eq!(
            Order::place(new_order(vec![line(ProductId::new(), 2, price, price)]), Utc::now())
                .unwrap_err(),
            OrderError::AmountTooLarge
        );

        let product = ProductId::new();
        assert_eq!(
            Order::place(
                new_order(vec![line(product, u32::MAX, 1, 1), line(product, 1, 1, 1)]),
                Utc::now()
            )
            .unwrap_err(),
            OrderError::AmountTooLarge
        );

        // Fits alone, overflows once shipping is added.
        let mut order = new_order(vec![line(ProductId::new(), 1, i64::MAX - 100, 1)]);
        order.shipping_cost = Money::from_cents(101);
        assert_eq!(
            Order::place(order, Utc::now()).unwrap_err(),
            OrderError::AmountTooLarge
        );
    }

    #[test]
    fn test_place_validates_lines() {
        assert_eq!(
            Order::place(new_order(vec![]), Utc::now()).unwrap_err(),
            OrderError::NoLines
        );
        assert!(matches!(
            Order::place(new_order(vec![line(ProductId::new(), 0, 100, 100)]), Utc::now()),
            Err(OrderError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            Order::place(new_order(vec![line(ProductId::new(), 1, 100, 150)]), Utc::now()),
            Err(OrderError::InvalidPrice { .. })
        ));

        let mut negative_shipping = new_order(vec![line(ProductId::new(), 1, 100, 100)]);
        negative_shipping.shipping_cost = Money::from_cents(-1);
        assert!(matches!(
            Order::place(negative_shipping, Utc::now()),
            Err(OrderError::InvalidShippingCost { .. })
        ));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut order =
            Order::place(new_order(vec![line(ProductId::new(), 1, 100, 100)]), Utc::now())
                .unwrap();
        order.mark_paid(Utc::now()).unwrap();
        order.mark_shipped(Utc::now()).unwrap();
        order.mark_delivered(Utc::now()).unwrap();

        assert_eq!(order.status(), OrderStatus::Delivered);
        assert!(order.is_terminal());
        assert!(order.delivered_at().is_some());

        let types: Vec<_> = order.take_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            ["OrderCreated", "OrderPaid", "OrderShipped", "OrderDelivered"]
        );
    }

    #[test]
    fn test_only_pending_orders_can_be_canceled() {
        let mut order =
            Order::place(new_order(vec![line(ProductId::new(), 1, 100, 100)]), Utc::now())
                .unwrap();
        order.mark_paid(Utc::now()).unwrap();

        let err = order.cancel("changed my mind", Utc::now()).unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidStatusTransition {
                current: OrderStatus::Paid,
                action: "cancel",
            }
        );
    }

    #[test]
    fn test_cancel_records_reason() {
        let mut order =
            Order::place(new_order(vec![line(ProductId::new(), 1, 100, 100)]), Utc::now())
                .unwrap();
        order.cancel("payment rejected", Utc::now()).unwrap();

        assert_eq!(order.status(), OrderStatus::Canceled);
        assert_eq!(order.cancel_reason(), Some("payment rejected"));
        assert!(order.mark_paid(Utc::now()).is_err());
    }

    #[test]
    fn test_cannot_skip_statuses() {
        let mut order =
            Order::place(new_order(vec![line(ProductId::new(), 1, 100, 100)]), Utc::now())
                .unwrap();
        assert!(matches!(
            order.mark_shipped(Utc::now()),
            Err(OrderError::InvalidStatusTransition {
                current: OrderStatus::Pending,
                ..
            })
        ));
        assert!(order.mark_delivered(Utc::now()).is_err());
    }
}
