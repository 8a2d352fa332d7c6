//! Carriers and shipping methods.

use async_trait::async_trait;
use domain::specifications::{
    ActiveShippingMethods, AllCarriers, AllShippingMethods, ShippingMethodsByCarrier,
};
use domain::{Carrier, CarrierId, Email, ShippingMethod, ShippingMethodId};
use shared_kernel::{AggregateRoot, Money, Page, Paged, Specification, SpecificationExt};

use crate::authorization::Policy;
use crate::error::{AppError, Result};
use crate::mediator::Request;
use crate::session::Session;
use crate::validation::ValidationErrors;

const MAX_NAME_LEN: usize = 100;
const MAX_DELIVERY_DAYS: u32 = 365;

fn validate_carrier(errors: &mut ValidationErrors, name: &str, contact_email: &str) {
    errors.require("name", name);
    errors.max_len("name", name, MAX_NAME_LEN);
    errors.email("contact_email", contact_email);
}

fn validate_method(errors: &mut ValidationErrors, name: &str, price_cents: i64, days: u32) {
    errors.require("name", name);
    errors.max_len("name", name, MAX_NAME_LEN);
    errors.non_negative_cents("price_cents", price_cents);
    errors.check(
        (1..=MAX_DELIVERY_DAYS).contains(&days),
        "estimated_days",
        format!("must be between 1 and {MAX_DELIVERY_DAYS}"),
    );
}

// Carriers

#[derive(Debug, Clone)]
pub struct CreateCarrier {
    pub name: String,
    pub contact_email: String,
    pub tracking_url_template: Option<String>,
}

#[async_trait]
impl Request for CreateCarrier {
    type Response = Carrier;
    const NAME: &'static str = "create_carrier";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_carrier(errors, &self.name, &self.contact_email);
    }

    async fn handle(self, session: &mut Session) -> Result<Carrier> {
        let email = Email::parse(&self.contact_email)?;
        let mut carrier =
            Carrier::create(&self.name, email, self.tracking_url_template, session.now())?;
        session.save(&mut carrier).await?;
        Ok(carrier)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateCarrier {
    pub carrier_id: CarrierId,
    pub name: String,
    pub contact_email: String,
    pub tracking_url_template: Option<String>,
}

#[async_trait]
impl Request for UpdateCarrier {
    type Response = Carrier;
    const NAME: &'static str = "update_carrier";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_carrier(errors, &self.name, &self.contact_email);
    }

    async fn handle(self, session: &mut Session) -> Result<Carrier> {
        let email = Email::parse(&self.contact_email)?;
        let mut carrier: Carrier = session.load(self.carrier_id).await?;
        carrier.update(&self.name, email, self.tracking_url_template, session.now())?;
        session.save(&mut carrier).await?;
        Ok(carrier)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SetCarrierActive {
    pub carrier_id: CarrierId,
    pub active: bool,
}

#[async_trait]
impl Request for SetCarrierActive {
    type Response = Carrier;
    const NAME: &'static str = "set_carrier_active";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<Carrier> {
        let mut carrier: Carrier = session.load(self.carrier_id).await?;
        if self.active {
            carrier.activate(session.now());
        } else {
            carrier.deactivate(session.now());
        }
        session.save(&mut carrier).await?;
        Ok(carrier)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetCarrier {
    pub carrier_id: CarrierId,
}

#[async_trait]
impl Request for GetCarrier {
    type Response = Carrier;
    const NAME: &'static str = "get_carrier";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<Carrier> {
        session.load(self.carrier_id).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListCarriers {
    pub page: Page,
}

#[async_trait]
impl Request for ListCarriers {
    type Response = Paged<Carrier>;
    const NAME: &'static str = "list_carriers";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<Paged<Carrier>> {
        Ok(session
            .repository::<Carrier>()
            .find(&AllCarriers, self.page)
            .await?)
    }
}

// Shipping methods

#[derive(Debug, Clone)]
pub struct CreateShippingMethod {
    pub carrier_id: CarrierId,
    pub name: String,
    pub price_cents: i64,
    pub estimated_days: u32,
}

#[async_trait]
impl Request for CreateShippingMethod {
    type Response = ShippingMethod;
    const NAME: &'static str = "create_shipping_method";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_method(errors, &self.name, self.price_cents, self.estimated_days);
    }

    async fn handle(self, session: &mut Session) -> Result<ShippingMethod> {
        let carrier: Carrier = session.load(self.carrier_id).await?;
        let mut method = ShippingMethod::create(
            carrier.id(),
            &self.name,
            Money::from_cents(self.price_cents),
            self.estimated_days,
            session.now(),
        )?;
        session.save(&mut method).await?;
        Ok(method)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateShippingMethod {
    pub shipping_method_id: ShippingMethodId,
    pub name: String,
    pub price_cents: i64,
    pub estimated_days: u32,
}

#[async_trait]
impl Request for UpdateShippingMethod {
    type Response = ShippingMethod;
    const NAME: &'static str = "update_shipping_method";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_method(errors, &self.name, self.price_cents, self.estimated_days);
    }

    async fn handle(self, session: &mut Session) -> Result<ShippingMethod> {
        let mut method: ShippingMethod = session.load(self.shipping_method_id).await?;
        method.update(
            &self.name,
            Money::from_cents(self.price_cents),
            self.estimated_days,
            session.now(),
        )?;
        session.save(&mut method).await?;
        Ok(method)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SetShippingMethodActive {
    pub shipping_method_id: ShippingMethodId,
    pub active: bool,
}

#[async_trait]
impl Request for SetShippingMethodActive {
    type Response = ShippingMethod;
    const NAME: &'static str = "set_shipping_method_active";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<ShippingMethod> {
        let mut method: ShippingMethod = session.load(self.shipping_method_id).await?;
        if self.active {
            let carrier: Carrier = session.load(method.carrier_id()).await?;
            if !carrier.is_active() {
                return Err(AppError::Conflict(format!(
                    "Carrier {} is inactive",
                    carrier.name()
                )));
            }
            method.activate(session.now());
        } else {
            method.deactivate(session.now());
        }
        session.save(&mut method).await?;
        Ok(method)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetShippingMethod {
    pub shipping_method_id: ShippingMethodId,
}

#[async_trait]
impl Request for GetShippingMethod {
    type Response = ShippingMethod;
    const NAME: &'static str = "get_shipping_method";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<ShippingMethod> {
        session.load(self.shipping_method_id).await
    }
}

/// Lists shipping methods, cheapest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListShippingMethods {
    pub carrier_id: Option<CarrierId>,
    pub active_only: bool,
    pub page: Page,
}

#[async_trait]
impl Request for ListShippingMethods {
    type Response = Paged<ShippingMethod>;
    const NAME: &'static str = "list_shipping_methods";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<Paged<ShippingMethod>> {
        let mut spec: Box<dyn Specification<ShippingMethod>> = Box::new(AllShippingMethods);
        if let Some(carrier_id) = self.carrier_id {
            spec = Box::new(spec.and(ShippingMethodsByCarrier(carrier_id)));
        }
        if self.active_only || !session.actor().is_admin() {
            spec = Box::new(spec.and(ActiveShippingMethods));
        }

        Ok(session
            .repository::<ShippingMethod>()
            .find(&spec, self.page)
            .await?)
    }
}
