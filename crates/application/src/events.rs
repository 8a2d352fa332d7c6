//! In-process domain event handlers.
//!
//! Handlers react to events raised while a request runs and carry the work
//! across aggregates: an order gets a payment, an approved payment pays the
//! order and opens a shipment, and so on. Whatever a handler saves raises
//! more events, so dispatch repeats until the queue is empty.

use std::sync::Arc;

use async_trait::async_trait;
use domain::specifications::PaymentForOrder;
use domain::{
    Coupon, Event, NewShipment, Order, OrderEvent, Payment, PaymentEvent, PaymentStatus, Product,
    Shipment, ShipmentEvent, ShippingMethod,
};
use shared_kernel::{AggregateRoot, DomainEvent};

use crate::error::{AppError, Result};
use crate::session::Session;

/// Upper bound on events handled for one request.
const MAX_EVENTS_PER_REQUEST: usize = 256;

/// Reason recorded on orders canceled by a declined payment.
pub const PAYMENT_REJECTED_REASON: &str = "payment rejected";

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &Event, session: &mut Session) -> Result<()>;
}

/// Delivers queued events to every handler.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The storefront's handlers.
    pub fn standard() -> Self {
        Self::new()
            .with(CreatePaymentForOrder)
            .with(FulfilPaidOrder)
            .with(CancelOrderOnRejectedPayment)
            .with(RestoreCanceledOrder)
            .with(TrackShipmentProgress)
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Handles queued events until none remain.
    pub async fn dispatch(&self, session: &mut Session) -> Result<()> {
        let mut handled = 0usize;

        loop {
            let events = session.take_events();
            if events.is_empty() {
                return Ok(());
            }

            for event in events {
                handled += 1;
                if handled > MAX_EVENTS_PER_REQUEST {
                    return Err(AppError::Internal(format!(
                        "event cascade exceeded {MAX_EVENTS_PER_REQUEST} events"
                    )));
                }

                let event_type = event.event_type();
                metrics::counter!("domain_events_dispatched_total", "event" => event_type)
                    .increment(1);
                tracing::debug!(event_type, "dispatching domain event");

                for handler in &self.handlers {
                    handler.handle(&event, session).await.inspect_err(|err| {
                        tracing::warn!(handler = handler.name(), event_type, error = %err, "event handler failed");
                    })?;
                }
            }
        }
    }
}

/// `OrderCreated`: opens a pending payment for the order total.
pub struct CreatePaymentForOrder;

#[async_trait]
impl EventHandler for CreatePaymentForOrder {
    fn name(&self) -> &'static str {
        "create_payment_for_order"
    }

    async fn handle(&self, event: &Event, session: &mut Session) -> Result<()> {
        let Event::Order(OrderEvent::OrderCreated(data)) = event else {
            return Ok(());
        };

        let mut payment = Payment::create(
            data.order_id,
            data.owner_id,
            data.total,
            data.payment_method,
            session.now(),
        )?;
        session.save(&mut payment).await
    }
}

/// `PaymentApproved`: marks the order paid and opens its shipment.
pub struct FulfilPaidOrder;

#[async_trait]
impl EventHandler for FulfilPaidOrder {
    fn name(&self) -> &'static str {
        "fulfil_paid_order"
    }

    async fn handle(&self, event: &Event, session: &mut Session) -> Result<()> {
        let Event::Payment(PaymentEvent::PaymentApproved { order_id, .. }) = event else {
            return Ok(());
        };

        let mut order: Order = session.load(*order_id).await?;
        order.mark_paid(session.now())?;
        session.save(&mut order).await?;

        let method: ShippingMethod = session.load(order.shipping_method_id()).await?;
        let mut shipment = Shipment::create(
            NewShipment {
                order_id: order.id(),
                owner_id: order.owner_id(),
                carrier_id: method.carrier_id(),
                shipping_method_id: method.id(),
                address: order.shipping_address().clone(),
                estimated_delivery: method.estimated_delivery(session.now()),
            },
            session.now(),
        );
        session.save(&mut shipment).await
    }
}

/// `PaymentRejected`: cancels the order while it is still pending.
pub struct CancelOrderOnRejectedPayment;

#[async_trait]
impl EventHandler for CancelOrderOnRejectedPayment {
    fn name(&self) -> &'static str {
        "cancel_order_on_rejected_payment"
    }

    async fn handle(&self, event: &Event, session: &mut Session) -> Result<()> {
        let Event::Payment(PaymentEvent::PaymentRejected { order_id, .. }) = event else {
            return Ok(());
        };

        let mut order: Order = session.load(*order_id).await?;
        if !order.status().can_cancel() {
            return Ok(());
        }
        order.cancel(PAYMENT_REJECTED_REASON, session.now())?;
        session.save(&mut order).await
    }
}

/// `OrderCanceled`: returns stock, releases the coupon and cancels the
/// pending payment.
pub struct RestoreCanceledOrder;

#[async_trait]
impl EventHandler for RestoreCanceledOrder {
    fn name(&self) -> &'static str {
        "restore_canceled_order"
    }

    async fn handle(&self, event: &Event, session: &mut Session) -> Result<()> {
        let Event::Order(OrderEvent::OrderCanceled(data)) = event else {
            return Ok(());
        };
        let now = session.now();
        let order: Order = session.load(data.order_id).await?;

        for line in order.lines() {
            let mut product: Product = session.load(line.product_id).await?;
            product.add_stock(line.quantity, now)?;
            session.save(&mut product).await?;
        }

        if let Some(coupon_id) = order.coupon_id() {
            let mut coupon: Coupon = session.load(coupon_id).await?;
            coupon.release(now);
            session.save(&mut coupon).await?;
        }

        let payments = session
            .repository::<Payment>()
            .find_all(&PaymentForOrder(order.id()))
            .await?;
        for mut payment in payments {
            if payment.status() == PaymentStatus::Pending {
                payment.cancel(now)?;
                session.save(&mut payment).await?;
            }
        }
        Ok(())
    }
}

/// `ShipmentShipped` / `ShipmentDelivered`: moves the order along.
pub struct TrackShipmentProgress;

#[async_trait]
impl EventHandler for TrackShipmentProgress {
    fn name(&self) -> &'static str {
        "track_shipment_progress"
    }

    async fn handle(&self, event: &Event, session: &mut Session) -> Result<()> {
        let now = session.now();
        match event {
            Event::Shipment(ShipmentEvent::ShipmentShipped { order_id, .. }) => {
                let mut order: Order = session.load(*order_id).await?;
                order.mark_shipped(now)?;
                session.save(&mut order).await
            }
            Event::Shipment(ShipmentEvent::ShipmentDelivered { order_id, .. }) => {
                let mut order: Order = session.load(*order_id).await?;
                order.mark_delivered(now)?;
                session.save(&mut order).await
            }
            _ => Ok(()),
        }
    }
}
