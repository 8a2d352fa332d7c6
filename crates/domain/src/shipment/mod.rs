//! Shipment aggregate and related types.

mod aggregate;

pub use aggregate::{NewShipment, Shipment};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{DomainEvent, Enumeration};
use thiserror::Error;

use crate::{OrderId, ShipmentId};

/// Errors that can occur during shipment operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShipmentError {
    #[error("Tracking number is required to ship")]
    TrackingNumberRequired,

    /// Shipment is not in the expected status.
    #[error("Invalid status transition: cannot {action} a {current} shipment")]
    InvalidStatusTransition {
        current: ShipmentStatus,
        action: &'static str,
    },
}

/// The status of a shipment.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Shipped ──► Delivered
///           └──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Canceled,
}

impl ShipmentStatus {
    pub fn can_ship(&self) -> bool {
        matches!(self, ShipmentStatus::Pending)
    }

    pub fn can_deliver(&self) -> bool {
        matches!(self, ShipmentStatus::Shipped)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, ShipmentStatus::Pending)
    }
}

impl Enumeration for ShipmentStatus {
    fn all() -> &'static [Self] {
        &[
            ShipmentStatus::Pending,
            ShipmentStatus::Shipped,
            ShipmentStatus::Delivered,
            ShipmentStatus::Canceled,
        ]
    }

    fn id(&self) -> i32 {
        match self {
            ShipmentStatus::Pending => 1,
            ShipmentStatus::Shipped => 2,
            ShipmentStatus::Delivered => 3,
            ShipmentStatus::Canceled => 4,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::Shipped => "Shipped",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Events raised by the shipment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShipmentEvent {
    ShipmentCreated {
        shipment_id: ShipmentId,
        order_id: OrderId,
        estimated_delivery: DateTime<Utc>,
    },
    ShipmentShipped {
        shipment_id: ShipmentId,
        order_id: OrderId,
        tracking_number: String,
        shipped_at: DateTime<Utc>,
    },
    ShipmentDelivered {
        shipment_id: ShipmentId,
        order_id: OrderId,
        delivered_at: DateTime<Utc>,
    },
    ShipmentCanceled {
        shipment_id: ShipmentId,
        order_id: OrderId,
    },
}

impl DomainEvent for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::ShipmentCreated { .. } => "ShipmentCreated",
            ShipmentEvent::ShipmentShipped { .. } => "ShipmentShipped",
            ShipmentEvent::ShipmentDelivered { .. } => "ShipmentDelivered",
            ShipmentEvent::ShipmentCanceled { .. } => "ShipmentCanceled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        assert!(ShipmentStatus::Pending.can_ship());
        assert!(ShipmentStatus::Pending.can_cancel());
        assert!(!ShipmentStatus::Pending.can_deliver());
        assert!(ShipmentStatus::Shipped.can_deliver());
        assert!(!ShipmentStatus::Shipped.can_cancel());
        assert!(!ShipmentStatus::Delivered.can_ship());
        assert!(!ShipmentStatus::Canceled.can_ship());
    }
}
