//! Shipping method aggregate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, DomainEvent, Money, Version};
use thiserror::Error;

use crate::{CarrierId, ShippingMethodId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShippingMethodError {
    #[error("Shipping method name is required")]
    NameRequired,

    #[error("Shipping price cannot be negative: {price}")]
    NegativePrice { price: i64 },

    #[error("Estimated delivery days must be greater than 0")]
    InvalidDeliveryDays,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShippingMethodEvent {
    Created {
        shipping_method_id: ShippingMethodId,
        carrier_id: CarrierId,
        name: String,
        price: Money,
    },
    Updated {
        shipping_method_id: ShippingMethodId,
        name: String,
        price: Money,
    },
    Activated {
        shipping_method_id: ShippingMethodId,
    },
    Deactivated {
        shipping_method_id: ShippingMethodId,
    },
}

impl DomainEvent for ShippingMethodEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShippingMethodEvent::Created { .. } => "ShippingMethodCreated",
            ShippingMethodEvent::Updated { .. } => "ShippingMethodUpdated",
            ShippingMethodEvent::Activated { .. } => "ShippingMethodActivated",
            ShippingMethodEvent::Deactivated { .. } => "ShippingMethodDeactivated",
        }
    }
}

/// A delivery option offered by a carrier, e.g. "Express, 2 days".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMethod {
    id: ShippingMethodId,
    carrier_id: CarrierId,
    name: String,
    price: Money,
    estimated_days: u32,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<ShippingMethodEvent>,
}

fn validate(
    name: &str,
    price: Money,
    estimated_days: u32,
) -> Result<String, ShippingMethodError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ShippingMethodError::NameRequired);
    }
    if price.is_negative() {
        return Err(ShippingMethodError::NegativePrice {
            price: price.cents(),
        });
    }
    if estimated_days == 0 {
        return Err(ShippingMethodError::InvalidDeliveryDays);
    }
    Ok(name.to_string())
}

impl ShippingMethod {
    pub fn create(
        carrier_id: CarrierId,
        name: &str,
        price: Money,
        estimated_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, ShippingMethodError> {
        let name = validate(name, price, estimated_days)?;
        let id = ShippingMethodId::new();
        Ok(Self {
            id,
            carrier_id,
            name: name.clone(),
            price,
            estimated_days,
            active: true,
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            events: vec![ShippingMethodEvent::Created {
                shipping_method_id: id,
                carrier_id,
                name,
                price,
            }],
        })
    }

    pub fn update(
        &mut self,
        name: &str,
        price: Money,
        estimated_days: u32,
        now: DateTime<Utc>,
    ) -> Result<(), ShippingMethodError> {
        let name = validate(name, price, estimated_days)?;
        self.name = name.clone();
        self.price = price;
        self.estimated_days = estimated_days;
        self.updated_at = now;
        self.events.push(ShippingMethodEvent::Updated {
            shipping_method_id: self.id,
            name,
            price,
        });
        Ok(())
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        if !self.active {
            self.active = true;
            self.updated_at = now;
            self.events.push(ShippingMethodEvent::Activated {
                shipping_method_id: self.id,
            });
        }
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        if self.active {
            self.active = false;
            self.updated_at = now;
            self.events.push(ShippingMethodEvent::Deactivated {
                shipping_method_id: self.id,
            });
        }
    }

    /// Expected delivery time for a shipment leaving at `now`.
    pub fn estimated_delivery(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(i64::from(self.estimated_days))
    }

    pub fn carrier_id(&self) -> CarrierId {
        self.carrier_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn estimated_days(&self) -> u32 {
        self.estimated_days
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl AggregateRoot for ShippingMethod {
    type Id = ShippingMethodId;
    type Event = ShippingMethodEvent;

    fn aggregate_type() -> &'static str {
        "ShippingMethod"
    }

    fn id(&self) -> ShippingMethodId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<ShippingMethodEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn express() -> ShippingMethod {
        ShippingMethod::create(
            CarrierId::new(),
            "Express",
            Money::from_cents(1500),
            2,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn estimated_delivery_adds_days() {
        let method = express();
        let now = Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap();
        assert_eq!(
            method.estimated_delivery(now),
            Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn validation() {
        let carrier = CarrierId::new();
        assert_eq!(
            ShippingMethod::create(carrier, "Free", Money::zero(), 5, Utc::now())
                .unwrap()
                .price(),
            Money::zero()
        );
        assert!(matches!(
            ShippingMethod::create(carrier, "Bad", Money::from_cents(-1), 5, Utc::now()),
            Err(ShippingMethodError::NegativePrice { price: -1 })
        ));
        assert_eq!(
            ShippingMethod::create(carrier, "Bad", Money::zero(), 0, Utc::now()).unwrap_err(),
            ShippingMethodError::InvalidDeliveryDays
        );
    }

    #[test]
    fn update_and_deactivate() {
        let mut method = express();
        method
            .update("Overnight", Money::from_cents(2500), 1, Utc::now())
            .unwrap();
        method.deactivate(Utc::now());
        assert_eq!(method.name(), "Overnight");
        assert!(!method.is_active());
        assert_eq!(method.take_events().len(), 3);
    }
}
