//! Order domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{DomainEvent, Money};

use crate::{OrderId, PaymentMethod, UserId};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed.
    OrderCreated(OrderCreatedData),

    /// Payment for the order was approved.
    OrderPaid(OrderPaidData),

    /// Order left the warehouse.
    OrderShipped(OrderShippedData),

    /// Order reached the customer.
    OrderDelivered(OrderDeliveredData),

    /// Order was canceled.
    OrderCanceled(OrderCanceledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::OrderPaid(_) => "OrderPaid",
            OrderEvent::OrderShipped(_) => "OrderShipped",
            OrderEvent::OrderDelivered(_) => "OrderDelivered",
            OrderEvent::OrderCanceled(_) => "OrderCanceled",
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// The unique order ID.
    pub order_id: OrderId,

    /// The user who placed the order.
    pub owner_id: UserId,

    /// Amount to charge, shipping included.
    pub total: Money,

    /// How the customer chose to pay.
    pub payment_method: PaymentMethod,

    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

/// Data for OrderPaid event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaidData {
    pub order_id: OrderId,
    pub paid_at: DateTime<Utc>,
}

/// Data for OrderShipped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShippedData {
    pub order_id: OrderId,
    pub shipped_at: DateTime<Utc>,
}

/// Data for OrderDelivered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDeliveredData {
    pub order_id: OrderId,
    pub delivered_at: DateTime<Utc>,
}

/// Data for OrderCanceled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCanceledData {
    /// The canceled order.
    pub order_id: OrderId,

    /// Why the order was canceled.
    pub reason: String,

    /// When the order was canceled.
    pub canceled_at: DateTime<Utc>,
}
