//! Payment aggregate implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, Money, Version};

use super::{PaymentError, PaymentEvent, PaymentMethod, PaymentStatus};
use crate::{OrderId, PaymentId, UserId};

/// Payment of an order.
///
/// Created in `Pending` when the order is placed and resolved exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    owner_id: UserId,
    amount: Money,
    method: PaymentMethod,
    status: PaymentStatus,
    transaction_id: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<PaymentEvent>,
}

// Query methods
impl Payment {
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }
}

// Command methods
impl Payment {
    /// Creates a pending payment for an order.
    pub fn create(
        order_id: OrderId,
        owner_id: UserId,
        amount: Money,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Self, PaymentError> {
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount { amount });
        }

        let id = PaymentId::new();
        Ok(Self {
            id,
            order_id,
            owner_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            processed_at: None,
            version: Version::initial(),
            events: vec![PaymentEvent::PaymentCreated {
                payment_id: id,
                order_id,
                amount,
                method,
            }],
        })
    }

    fn ensure_pending(&self, action: &'static str) -> Result<(), PaymentError> {
        if !self.status.can_process() {
            return Err(PaymentError::InvalidStatusTransition {
                current: self.status,
                action,
            });
        }
        Ok(())
    }

    /// Approves the payment with the gateway's transaction id.
    pub fn approve(
        &mut self,
        transaction_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        self.ensure_pending("approve")?;
        let transaction_id = transaction_id.into();
        if transaction_id.trim().is_empty() {
            return Err(PaymentError::TransactionIdRequired);
        }

        self.status = PaymentStatus::Approved;
        self.transaction_id = Some(transaction_id.clone());
        self.processed_at = Some(now);
        self.updated_at = now;
        self.events.push(PaymentEvent::PaymentApproved {
            payment_id: self.id,
            order_id: self.order_id,
            transaction_id,
            approved_at: now,
        });
        Ok(())
    }

    /// Rejects the payment.
    pub fn reject(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        self.ensure_pending("reject")?;
        let reason = reason.into();

        self.status = PaymentStatus::Rejected;
        self.failure_reason = Some(reason.clone());
        self.processed_at = Some(now);
        self.updated_at = now;
        self.events.push(PaymentEvent::PaymentRejected {
            payment_id: self.id,
            order_id: self.order_id,
            reason,
        });
        Ok(())
    }

    /// Cancels the payment before it was processed.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), PaymentError> {
        self.ensure_pending("cancel")?;

        self.status = PaymentStatus::Canceled;
        self.updated_at = now;
        self.events.push(PaymentEvent::PaymentCanceled {
            payment_id: self.id,
            order_id: self.order_id,
        });
        Ok(())
    }
}

impl AggregateRoot for Payment {
    type Id = PaymentId;
    type Event = PaymentEvent;

    fn aggregate_type() -> &'static str {
        "Payment"
    }

    fn id(&self) -> PaymentId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<PaymentEvent> {
        std::mem::take(&mut self.events)
    }
}
