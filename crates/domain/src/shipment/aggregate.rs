use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, Version};

use super::{ShipmentError, ShipmentEvent, ShipmentStatus};
use crate::{Address, CarrierId, OrderId, ShipmentId, ShippingMethodId, UserId};

/// Input for [`Shipment::create`].
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub order_id: OrderId,
    pub owner_id: UserId,
    pub carrier_id: CarrierId,
    pub shipping_method_id: ShippingMethodId,
    pub address: Address,
    pub estimated_delivery: DateTime<Utc>,
}

/// Delivery of a paid order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,
    order_id: OrderId,
    owner_id: UserId,
    carrier_id: CarrierId,
    shipping_method_id: ShippingMethodId,
    address: Address,
    status: ShipmentStatus,
    tracking_number: Option<String>,
    estimated_delivery: DateTime<Utc>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<ShipmentEvent>,
}

impl Shipment {
    pub fn create(new: NewShipment, now: DateTime<Utc>) -> Self {
        let id = ShipmentId::new();
        Self {
            id,
            order_id: new.order_id,
            owner_id: new.owner_id,
            carrier_id: new.carrier_id,
            shipping_method_id: new.shipping_method_id,
            address: new.address,
            status: ShipmentStatus::Pending,
            tracking_number: None,
            estimated_delivery: new.estimated_delivery,
            shipped_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            events: vec![ShipmentEvent::ShipmentCreated {
                shipment_id: id,
                order_id: new.order_id,
                estimated_delivery: new.estimated_delivery,
            }],
        }
    }

    /// Hands the parcel to the carrier.
    pub fn ship(
        &mut self,
        tracking_number: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ShipmentError> {
        if !self.status.can_ship() {
            return Err(ShipmentError::InvalidStatusTransition {
                current: self.status,
                action: "ship",
            });
        }
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(ShipmentError::TrackingNumberRequired);
        }

        self.status = ShipmentStatus::Shipped;
        self.tracking_number = Some(tracking_number.to_string());
        self.shipped_at = Some(now);
        self.updated_at = now;
        self.events.push(ShipmentEvent::ShipmentShipped {
            shipment_id: self.id,
            order_id: self.order_id,
            tracking_number: tracking_number.to_string(),
            shipped_at: now,
        });
        Ok(())
    }

    pub fn deliver(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        if !self.status.can_deliver() {
            return Err(ShipmentError::InvalidStatusTransition {
                current: self.status,
                action: "deliver",
            });
        }

        self.status = ShipmentStatus::Delivered;
        self.delivered_at = Some(now);
        self.updated_at = now;
        self.events.push(ShipmentEvent::ShipmentDelivered {
            shipment_id: self.id,
            order_id: self.order_id,
            delivered_at: now,
        });
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        if !self.status.can_cancel() {
            return Err(ShipmentError::InvalidStatusTransition {
                current: self.status,
                action: "cancel",
            });
        }

        self.status = ShipmentStatus::Canceled;
        self.updated_at = now;
        self.events.push(ShipmentEvent::ShipmentCanceled {
            shipment_id: self.id,
            order_id: self.order_id,
        });
        Ok(())
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn carrier_id(&self) -> CarrierId {
        self.carrier_id
    }

    pub fn shipping_method_id(&self) -> ShippingMethodId {
        self.shipping_method_id
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn estimated_delivery(&self) -> DateTime<Utc> {
        self.estimated_delivery
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl AggregateRoot for Shipment {
    type Id = ShipmentId;
    type Event = ShipmentEvent;

    fn aggregate_type() -> &'static str {
        "Shipment"
    }

    fn id(&self) -> ShipmentId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<ShipmentEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending() -> Shipment {
        let now = Utc::now();
        Shipment::create(
            NewShipment {
                order_id: OrderId::new(),
                owner_id: UserId::new(),
                carrier_id: CarrierId::new(),
                shipping_method_id: ShippingMethodId::new(),
                address: Address::new("1 Main St", "Springfield", "IL", "62701", "US").unwrap(),
                estimated_delivery: now + Duration::days(3),
            },
            now,
        )
    }

    #[test]
    fn ship_then_deliver() {
        let mut shipment = pending();
        shipment.ship(" TRK-1 ", Utc::now()).unwrap();
        assert_eq!(shipment.tracking_number(), Some("TRK-1"));
        assert_eq!(shipment.status(), ShipmentStatus::Shipped);

        shipment.deliver(Utc::now()).unwrap();
        assert_eq!(shipment.status(), ShipmentStatus::Delivered);
        assert_eq!(shipment.take_events().len(), 3);
    }

    #[test]
    fn ship_requires_tracking_number() {
        let mut shipment = pending();
        assert_eq!(
            shipment.ship("", Utc::now()).unwrap_err(),
            ShipmentError::TrackingNumberRequired
        );
    }

    #[test]
    fn deliver_requires_shipped() {
        let mut shipment = pending();
        assert!(matches!(
            shipment.deliver(Utc::now()),
            Err(ShipmentError::InvalidStatusTransition {
                current: ShipmentStatus::Pending,
                action: "deliver"
            })
        ));
    }

    #[test]
    fn only_pending_shipments_cancel() {
        let mut shipment = pending();
        shipment.ship("TRK-2", Utc::now()).unwrap();
        assert!(shipment.cancel(Utc::now()).is_err());

        let mut other = pending();
        other.cancel(Utc::now()).unwrap();
        assert_eq!(other.status(), ShipmentStatus::Canceled);
        assert!(other.ship("TRK-3", Utc::now()).is_err());
    }
}
