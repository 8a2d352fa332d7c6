//! Payment domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{DomainEvent, Money};

use super::PaymentMethod;
use crate::{OrderId, PaymentId};

/// Events that can occur on a payment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PaymentEvent {
    /// Payment was created for an order.
    PaymentCreated {
        payment_id: PaymentId,
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
    },

    /// The gateway approved the charge.
    PaymentApproved {
        payment_id: PaymentId,
        order_id: OrderId,
        transaction_id: String,
        approved_at: DateTime<Utc>,
    },

    /// The gateway declined the charge.
    PaymentRejected {
        payment_id: PaymentId,
        order_id: OrderId,
        reason: String,
    },

    /// Payment was canceled before processing.
    PaymentCanceled {
        payment_id: PaymentId,
        order_id: OrderId,
    },
}

impl DomainEvent for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentCreated { .. } => "PaymentCreated",
            PaymentEvent::PaymentApproved { .. } => "PaymentApproved",
            PaymentEvent::PaymentRejected { .. } => "PaymentRejected",
            PaymentEvent::PaymentCanceled { .. } => "PaymentCanceled",
        }
    }
}
