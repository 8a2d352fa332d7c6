//! Order, payment and shipment records.

use chrono::{DateTime, Utc};
use domain::{
    CarrierId, CouponId, Order, OrderId, OrderLine, Payment, PaymentId, ProductId, Shipment,
    ShipmentId, ShippingMethodId, UserId,
};
use persistence::{EventId, EventRecord};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, Enumeration};
use uuid::Uuid;

use crate::common::AddressDto;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub lines: Vec<OrderLineRequest>,
    pub shipping_method_id: ShippingMethodId,
    /// Falls back to the customer's saved address.
    #[serde(default)]
    pub shipping_address: Option<AddressDto>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    /// Payment method name, e.g. `CreditCard` or `Pix`.
    pub payment_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: String,
}

/// `GET /orders` filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    /// Status name, e.g. `Pending`.
    pub status: Option<String>,
    #[serde(default)]
    pub mine: bool,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub base_price_cents: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            base_price_cents: line.base_price.cents(),
            unit_price_cents: line.unit_price.cents(),
            total_cents: line.total().cents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub owner_id: UserId,
    pub status: String,
    pub lines: Vec<OrderLineResponse>,
    pub shipping_address: AddressDto,
    pub shipping_method_id: ShippingMethodId,
    pub shipping_cost_cents: i64,
    pub coupon_id: Option<CouponId>,
    pub payment_method: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            owner_id: order.owner_id(),
            status: order.status().name().to_string(),
            lines: order.lines().iter().map(OrderLineResponse::from).collect(),
            shipping_address: AddressDto::from(order.shipping_address()),
            shipping_method_id: order.shipping_method_id(),
            shipping_cost_cents: order.shipping_cost().cents(),
            coupon_id: order.coupon_id(),
            payment_method: order.payment_method().name().to_string(),
            subtotal_cents: order.subtotal().cents(),
            discount_cents: order.discount_total().cents(),
            total_cents: order.total().cents(),
            cancel_reason: order.cancel_reason().map(str::to_string),
            created_at: order.created_at(),
            paid_at: order.paid_at(),
            shipped_at: order.shipped_at(),
            delivered_at: order.delivered_at(),
            canceled_at: order.canceled_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount_cents: i64,
    pub method: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id(),
            order_id: payment.order_id(),
            amount_cents: payment.amount().cents(),
            method: payment.method().name().to_string(),
            status: payment.status().name().to_string(),
            transaction_id: payment.transaction_id().map(str::to_string),
            failure_reason: payment.failure_reason().map(str::to_string),
            created_at: payment.created_at(),
            processed_at: payment.processed_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipRequest {
    pub tracking_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentResponse {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub carrier_id: CarrierId,
    pub shipping_method_id: ShippingMethodId,
    pub address: AddressDto,
    pub status: String,
    pub tracking_number: Option<String>,
    /// Carrier tracking link, when the carrier publishes one.
    pub tracking_url: Option<String>,
    pub estimated_delivery: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Shipment> for ShipmentResponse {
    fn from(shipment: &Shipment) -> Self {
        Self {
            id: shipment.id(),
            order_id: shipment.order_id(),
            carrier_id: shipment.carrier_id(),
            shipping_method_id: shipment.shipping_method_id(),
            address: AddressDto::from(shipment.address()),
            status: shipment.status().name().to_string(),
            tracking_number: shipment.tracking_number().map(str::to_string),
            tracking_url: None,
            estimated_delivery: shipment.estimated_delivery(),
            shipped_at: shipment.shipped_at(),
            delivered_at: shipment.delivered_at(),
            created_at: shipment.created_at(),
        }
    }
}

impl ShipmentResponse {
    pub fn with_tracking_url(mut self, url: Option<String>) -> Self {
        self.tracking_url = url;
        self
    }
}

/// One entry of an order's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub event_id: EventId,
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub version: i64,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl From<EventRecord> for EventResponse {
    fn from(record: EventRecord) -> Self {
        Self {
            event_id: record.event_id,
            event_type: record.event_type,
            aggregate_type: record.aggregate_type,
            aggregate_id: record.aggregate_id,
            version: record.aggregate_version.as_i64(),
            timestamp: record.timestamp,
            payload: record.payload,
        }
    }
}
