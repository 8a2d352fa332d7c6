//! Placing, canceling and reading orders.

use std::collections::BTreeMap;

use async_trait::async_trait;
use domain::specifications::{
    AllOrders, OrdersByOwner, OrdersByStatus, PaymentForOrder, ShipmentForOrder,
};
use domain::{
    Carrier, Coupon, CouponError, DiscountService, NewOrder, Order, OrderId, OrderLine,
    OrderStatus, Payment, PaymentError, PaymentMethod, Product, ProductId, Shipment,
    ShippingMethod, ShippingMethodId, User,
};
use persistence::{EventQuery, EventRecord};
use shared_kernel::{AggregateRoot, Page, Paged, Specification, SpecificationExt};

use super::catalog::active_sales;
use super::promotions::coupon_by_code;
use crate::authorization::Policy;
use crate::error::{AppError, Result};
use crate::mediator::Request;
use crate::session::Session;
use crate::validation::{AddressInput, ValidationErrors};

const MAX_LINES: usize = 50;
const MAX_REASON_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Places an order for the caller.
///
/// Without `shipping_address` the caller's saved address is used.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub lines: Vec<OrderLineInput>,
    pub shipping_method_id: ShippingMethodId,
    pub shipping_address: Option<AddressInput>,
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
}

#[async_trait]
impl Request for PlaceOrder {
    type Response = Order;
    const NAME: &'static str = "place_order";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.check(!self.lines.is_empty(), "lines", "must contain at least one line");
        errors.check(
            self.lines.len() <= MAX_LINES,
            "lines",
            format!("must contain at most {MAX_LINES} lines"),
        );
        errors.check(
            self.lines.iter().all(|line| line.quantity > 0),
            "lines",
            "quantities must be greater than 0",
        );
        if let Some(address) = &self.shipping_address {
            errors.address("shipping_address", address);
        }
        if let Some(code) = &self.coupon_code {
            errors.coupon_code("coupon_code", code);
        }
    }

    async fn handle(self, session: &mut Session) -> Result<Order> {
        let now = session.now();
        let owner_id = session.actor().require_user()?;
        let user: User = session.load(owner_id).await?;

        let shipping_address = match &self.shipping_address {
            Some(input) => input.to_address()?,
            None => user.shipping_address().cloned().ok_or_else(|| {
                let mut errors = ValidationErrors::new();
                errors.add("shipping_address", "is required when no address is saved");
                AppError::Validation(errors)
            })?,
        };

        let method: ShippingMethod = session.load(self.shipping_method_id).await?;
        let carrier: Carrier = session.load(method.carrier_id()).await?;
        if !method.is_active() || !carrier.is_active() {
            return Err(AppError::Conflict(format!(
                "Shipping method {} is not available",
                method.name()
            )));
        }

        let coupon = match &self.coupon_code {
            Some(code) => {
                let coupon = coupon_by_code(session, code).await?;
                coupon.ensure_valid(now)?;
                Some(coupon)
            }
            None => None,
        };

        let mut quantities: BTreeMap<ProductId, u32> = BTreeMap::new();
        for line in &self.lines {
            let quantity = quantities.entry(line.product_id).or_default();
            *quantity = quantity.saturating_add(line.quantity);
        }

        let mut products = Vec::with_capacity(quantities.len());
        for (&product_id, &quantity) in &quantities {
            let product: Product = session.load(product_id).await?;
            product.ensure_orderable(quantity)?;
            products.push((product, quantity));
        }

        let sales = active_sales(session).await?;
        let mut lines = Vec::with_capacity(products.len());
        let mut coupon_used = false;
        for (product, quantity) in &products {
            let quote = DiscountService::price(product, &sales, coupon.as_ref(), now);
            coupon_used |= quote.coupon_applied();
            lines.push(OrderLine::new(
                product.id(),
                product.name(),
                *quantity,
                quote.base_price,
                quote.final_price,
            ));
        }
        if let Some(coupon) = &coupon
            && !coupon_used
        {
            return Err(CouponError::NotApplicable {
                code: coupon.code().clone(),
            }
            .into());
        }

        let mut order = Order::place(
            NewOrder {
                owner_id,
                lines,
                shipping_address,
                shipping_method_id: method.id(),
                shipping_cost: method.price(),
                coupon_id: coupon.as_ref().map(Coupon::id),
                payment_method: self.payment_method,
            },
            now,
        )?;
        if !order.total().is_positive() {
            return Err(PaymentError::InvalidAmount {
                amount: order.total(),
            }
            .into());
        }

        for (mut product, quantity) in products {
            product.remove_stock(quantity, now)?;
            session.save(&mut product).await?;
        }
        if let Some(mut coupon) = coupon {
            coupon.redeem(now)?;
            session.save(&mut coupon).await?;
        }
        session.save(&mut order).await?;

        tracing::info!(
            order_id = %order.id(),
            total = %order.total(),
            lines = order.lines().len(),
            "order placed"
        );
        Ok(order)
    }
}

#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub reason: String,
}

#[async_trait]
impl Request for CancelOrder {
    type Response = Order;
    const NAME: &'static str = "cancel_order";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.require("reason", &self.reason);
        errors.max_len("reason", &self.reason, MAX_REASON_LEN);
    }

    async fn handle(self, session: &mut Session) -> Result<Order> {
        let mut order: Order = session.load(self.order_id).await?;
        session.actor().ensure_owner_or_admin(order.owner_id())?;

        order.cancel(self.reason.trim(), session.now())?;
        session.save(&mut order).await?;
        Ok(order)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetOrder {
    pub order_id: OrderId,
}

#[async_trait]
impl Request for GetOrder {
    type Response = Order;
    const NAME: &'static str = "get_order";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<Order> {
        let order: Order = session.load(self.order_id).await?;
        session.actor().ensure_owner_or_admin(order.owner_id())?;
        Ok(order)
    }
}

/// Lists orders, newest first.
///
/// Customers see their own orders; administrators see everyone's unless
/// they ask for `mine`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOrders {
    pub status: Option<OrderStatus>,
    pub mine: bool,
    pub page: Page,
}

#[async_trait]
impl Request for ListOrders {
    type Response = Paged<Order>;
    const NAME: &'static str = "list_orders";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<Paged<Order>> {
        let actor = session.actor();
        let mut spec: Box<dyn Specification<Order>> = if actor.is_admin() && !self.mine {
            Box::new(AllOrders)
        } else {
            Box::new(OrdersByOwner(actor.require_user()?))
        };
        if let Some(status) = self.status {
            spec = Box::new(spec.and(OrdersByStatus(status)));
        }

        Ok(session.repository::<Order>().find(&spec, self.page).await?)
    }
}

/// Every event recorded for an order, its payments and its shipment,
/// oldest first.
#[derive(Debug, Clone, Copy)]
pub struct GetOrderHistory {
    pub order_id: OrderId,
}

#[async_trait]
impl Request for GetOrderHistory {
    type Response = Vec<EventRecord>;
    const NAME: &'static str = "get_order_history";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<Vec<EventRecord>> {
        let order: Order = session.load(self.order_id).await?;
        session.actor().ensure_owner_or_admin(order.owner_id())?;

        let mut aggregates = vec![order.id().as_uuid()];
        let payments = session
            .repository::<Payment>()
            .find_all(&PaymentForOrder(order.id()))
            .await?;
        aggregates.extend(payments.iter().map(|payment| payment.id().as_uuid()));
        let shipments = session
            .repository::<Shipment>()
            .find_all(&ShipmentForOrder(order.id()))
            .await?;
        aggregates.extend(shipments.iter().map(|shipment| shipment.id().as_uuid()));

        // Oldest first; events written together keep their log order.
        Ok(session
            .store()
            .query_events(EventQuery::for_aggregates(aggregates))
            .await?)
    }
}
