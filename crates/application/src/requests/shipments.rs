//! Shipment tracking.

use async_trait::async_trait;
use domain::specifications::ShipmentForOrder;
use domain::{Order, OrderId, Shipment, ShipmentId};
use shared_kernel::AggregateRoot;

use crate::authorization::Policy;
use crate::error::{AppError, Result};
use crate::mediator::Request;
use crate::session::Session;
use crate::validation::ValidationErrors;

const MAX_TRACKING_LEN: usize = 100;

#[derive(Debug, Clone)]
pub struct ShipShipment {
    pub shipment_id: ShipmentId,
    pub tracking_number: String,
}

#[async_trait]
impl Request for ShipShipment {
    type Response = Shipment;
    const NAME: &'static str = "ship_shipment";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.require("tracking_number", &self.tracking_number);
        errors.max_len("tracking_number", &self.tracking_number, MAX_TRACKING_LEN);
    }

    async fn handle(self, session: &mut Session) -> Result<Shipment> {
        let mut shipment: Shipment = session.load(self.shipment_id).await?;
        shipment.ship(&self.tracking_number, session.now())?;
        session.save(&mut shipment).await?;
        Ok(shipment)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeliverShipment {
    pub shipment_id: ShipmentId,
}

#[async_trait]
impl Request for DeliverShipment {
    type Response = Shipment;
    const NAME: &'static str = "deliver_shipment";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<Shipment> {
        let mut shipment: Shipment = session.load(self.shipment_id).await?;
        shipment.deliver(session.now())?;
        session.save(&mut shipment).await?;
        Ok(shipment)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetShipment {
    pub shipment_id: ShipmentId,
}

#[async_trait]
impl Request for GetShipment {
    type Response = Shipment;
    const NAME: &'static str = "get_shipment";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<Shipment> {
        let shipment: Shipment = session.load(self.shipment_id).await?;
        session.actor().ensure_owner_or_admin(shipment.owner_id())?;
        Ok(shipment)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetShipmentForOrder {
    pub order_id: OrderId,
}

#[async_trait]
impl Request for GetShipmentForOrder {
    type Response = Shipment;
    const NAME: &'static str = "get_shipment_for_order";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<Shipment> {
        let order: Order = session.load(self.order_id).await?;
        session.actor().ensure_owner_or_admin(order.owner_id())?;

        session
            .repository::<Shipment>()
            .find_one(&ShipmentForOrder(order.id()))
            .await?
            .ok_or_else(|| AppError::not_found("Shipment for order", order.id()))
    }
}
