//! The union of every aggregate's events.

use serde::{Deserialize, Serialize};
use shared_kernel::DomainEvent;

use crate::{
    CarrierEvent, CategoryEvent, CouponEvent, OrderEvent, PaymentEvent, ProductEvent, SaleEvent,
    ShipmentEvent, ShippingMethodEvent, UserEvent,
};

/// Any domain event, tagged by the aggregate that raised it.
///
/// In-process handlers receive this type so one dispatcher can route events
/// from every aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "aggregate", content = "event")]
pub enum Event {
    User(UserEvent),
    Category(CategoryEvent),
    Product(ProductEvent),
    Carrier(CarrierEvent),
    ShippingMethod(ShippingMethodEvent),
    Coupon(CouponEvent),
    Sale(SaleEvent),
    Order(OrderEvent),
    Payment(PaymentEvent),
    Shipment(ShipmentEvent),
}

impl DomainEvent for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::User(e) => e.event_type(),
            Event::Category(e) => e.event_type(),
            Event::Product(e) => e.event_type(),
            Event::Carrier(e) => e.event_type(),
            Event::ShippingMethod(e) => e.event_type(),
            Event::Coupon(e) => e.event_type(),
            Event::Sale(e) => e.event_type(),
            Event::Order(e) => e.event_type(),
            Event::Payment(e) => e.event_type(),
            Event::Shipment(e) => e.event_type(),
        }
    }
}

macro_rules! impl_from_event {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Event {
                fn from(event: $ty) -> Self {
                    Event::$variant(event)
                }
            }
        )*
    };
}

impl_from_event!(
    User(UserEvent),
    Category(CategoryEvent),
    Product(ProductEvent),
    Carrier(CarrierEvent),
    ShippingMethod(ShippingMethodEvent),
    Coupon(CouponEvent),
    Sale(SaleEvent),
    Order(OrderEvent),
    Payment(PaymentEvent),
    Shipment(ShipmentEvent),
);
