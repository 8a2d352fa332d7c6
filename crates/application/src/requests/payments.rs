//! Payment processing.

use async_trait::async_trait;
use domain::specifications::PaymentForOrder;
use domain::{Order, OrderId, Payment, PaymentError, PaymentId};
use shared_kernel::AggregateRoot;

use crate::authorization::Policy;
use crate::error::{AppError, Result};
use crate::mediator::Request;
use crate::services::{ChargeOutcome, ChargeRequest};
use crate::session::Session;

/// Charges a pending payment through the gateway.
///
/// A declined charge is not an error: the payment comes back `Rejected`
/// and the order is canceled by the event handlers.
#[derive(Debug, Clone, Copy)]
pub struct ProcessPayment {
    pub payment_id: PaymentId,
}

#[async_trait]
impl Request for ProcessPayment {
    type Response = Payment;
    const NAME: &'static str = "process_payment";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<Payment> {
        let mut payment: Payment = session.load(self.payment_id).await?;
        session.actor().ensure_owner_or_admin(payment.owner_id())?;
        if !payment.status().can_process() {
            return Err(PaymentError::InvalidStatusTransition {
                current: payment.status(),
                action: "process",
            }
            .into());
        }

        let gateway = session.context().gateway.clone();
        let outcome = gateway
            .charge(ChargeRequest {
                payment_id: payment.id(),
                order_id: payment.order_id(),
                amount: payment.amount(),
                method: payment.method(),
            })
            .await?;

        let now = session.now();
        match outcome {
            ChargeOutcome::Approved { transaction_id } => {
                tracing::info!(payment_id = %payment.id(), %transaction_id, "payment approved");
                payment.approve(transaction_id, now)?;
            }
            ChargeOutcome::Declined { reason } => {
                tracing::info!(payment_id = %payment.id(), %reason, "payment rejected");
                payment.reject(reason, now)?;
            }
        }
        session.save(&mut payment).await?;
        Ok(payment)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetPayment {
    pub payment_id: PaymentId,
}

#[async_trait]
impl Request for GetPayment {
    type Response = Payment;
    const NAME: &'static str = "get_payment";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<Payment> {
        let payment: Payment = session.load(self.payment_id).await?;
        session.actor().ensure_owner_or_admin(payment.owner_id())?;
        Ok(payment)
    }
}

/// The latest payment of an order.
#[derive(Debug, Clone, Copy)]
pub struct GetPaymentForOrder {
    pub order_id: OrderId,
}

#[async_trait]
impl Request for GetPaymentForOrder {
    type Response = Payment;
    const NAME: &'static str = "get_payment_for_order";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<Payment> {
        let order: Order = session.load(self.order_id).await?;
        session.actor().ensure_owner_or_admin(order.owner_id())?;

        session
            .repository::<Payment>()
            .find_one(&PaymentForOrder(order.id()))
            .await?
            .ok_or_else(|| AppError::not_found("Payment for order", order.id()))
    }
}
