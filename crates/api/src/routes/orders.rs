//! Checkout, order, payment and shipment endpoints.

use std::sync::Arc;

use application::Actor;
use application::requests::{
    CancelOrder, DeliverShipment, GetCarrier, GetOrder, GetOrderHistory, GetPayment,
    GetPaymentForOrder, GetShipment, GetShipmentForOrder, ListOrders, OrderLineInput,
    PlaceOrder, ProcessPayment, ShipShipment,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    CancelOrderRequest, EventResponse, OrderQuery, OrderResponse, PagedResponse,
    PaymentResponse, PlaceOrderRequest, ShipRequest, ShipmentResponse,
};
use domain::{OrderId, OrderStatus, PaymentId, PaymentMethod, Shipment, ShipmentId};
use shared_kernel::Page;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, Auth, address_input, parse_id, parse_name};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list).post(place))
        .route("/orders/{id}", get(get_one))
        .route("/orders/{id}/cancel", post(cancel))
        .route("/orders/{id}/payment", get(order_payment))
        .route("/orders/{id}/shipment", get(order_shipment))
        .route("/orders/{id}/events", get(events))
        .route("/payments/{id}", get(get_payment))
        .route("/payments/{id}/process", post(process_payment))
        .route("/shipments/{id}", get(get_shipment))
        .route("/shipments/{id}/ship", post(ship))
        .route("/shipments/{id}/deliver", post(deliver))
}

/// Adds the carrier's tracking link once the shipment has a tracking number.
async fn shipment_response(
    state: &AppState,
    actor: Actor,
    shipment: &Shipment,
) -> Result<ShipmentResponse, ApiError> {
    let tracking_url = match shipment.tracking_number() {
        Some(number) => state
            .mediator
            .send(
                actor,
                GetCarrier {
                    carrier_id: shipment.carrier_id(),
                },
            )
            .await?
            .tracking_url(number),
        None => None,
    };
    Ok(ShipmentResponse::from(shipment).with_tracking_url(tracking_url))
}

// -- Orders --

/// POST /orders: place an order and open its payment.
#[tracing::instrument(skip_all)]
pub async fn place(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let payment_method: PaymentMethod = parse_name("payment_method", &req.payment_method)?;
    let order = state
        .mediator
        .send(
            actor,
            PlaceOrder {
                lines: req
                    .lines
                    .iter()
                    .map(|line| OrderLineInput {
                        product_id: line.product_id,
                        quantity: line.quantity,
                    })
                    .collect(),
                shipping_method_id: req.shipping_method_id,
                shipping_address: req.shipping_address.map(address_input),
                coupon_code: req.coupon_code,
                payment_method,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders: the caller's orders, or everyone's for administrators.
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<PagedResponse<OrderResponse>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|name| parse_name::<OrderStatus>("status", name))
        .transpose()?;
    let page = Page::new(
        query.offset.unwrap_or(0),
        query.limit.unwrap_or(Page::DEFAULT_LIMIT),
    );
    let orders = state
        .mediator
        .send(
            actor,
            ListOrders {
                status,
                mine: query.mine,
                page,
            },
        )
        .await?;
    Ok(Json(PagedResponse::map(orders, |order| {
        OrderResponse::from(&order)
    })))
}

/// GET /orders/{id}
#[tracing::instrument(skip_all)]
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state.mediator.send(actor, GetOrder { order_id }).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel: only pending orders can be canceled.
#[tracing::instrument(skip_all)]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CancelOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state
        .mediator
        .send(
            actor,
            CancelOrder {
                order_id,
                reason: req.reason,
            },
        )
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/{id}/payment
#[tracing::instrument(skip_all)]
pub async fn order_payment(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let payment = state
        .mediator
        .send(actor, GetPaymentForOrder { order_id })
        .await?;
    Ok(Json(PaymentResponse::from(&payment)))
}

/// GET /orders/{id}/shipment: exists once the order is paid.
#[tracing::instrument(skip_all)]
pub async fn order_shipment(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let shipment = state
        .mediator
        .send(actor, GetShipmentForOrder { order_id })
        .await?;
    Ok(Json(shipment_response(&state, actor, &shipment).await?))
}

/// GET /orders/{id}/events: every event of the order, its payment and shipment.
#[tracing::instrument(skip_all)]
pub async fn events(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let events = state
        .mediator
        .send(actor, GetOrderHistory { order_id })
        .await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

// -- Payments --

/// GET /payments/{id}
#[tracing::instrument(skip_all)]
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment_id: PaymentId = parse_id(&id)?;
    let payment = state.mediator.send(actor, GetPayment { payment_id }).await?;
    Ok(Json(PaymentResponse::from(&payment)))
}

/// POST /payments/{id}/process: charge through the gateway.
///
/// A declined charge still answers 200; the payment comes back `Rejected`
/// and its order is canceled.
#[tracing::instrument(skip_all)]
pub async fn process_payment(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment_id: PaymentId = parse_id(&id)?;
    let payment = state
        .mediator
        .send(actor, ProcessPayment { payment_id })
        .await?;
    Ok(Json(PaymentResponse::from(&payment)))
}

// -- Shipments --

/// GET /shipments/{id}
#[tracing::instrument(skip_all)]
pub async fn get_shipment(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id: ShipmentId = parse_id(&id)?;
    let shipment = state
        .mediator
        .send(actor, GetShipment { shipment_id })
        .await?;
    Ok(Json(shipment_response(&state, actor, &shipment).await?))
}

/// POST /shipments/{id}/ship
#[tracing::instrument(skip_all)]
pub async fn ship(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ShipRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id: ShipmentId = parse_id(&id)?;
    let shipment = state
        .mediator
        .send(
            actor,
            ShipShipment {
                shipment_id,
                tracking_number: req.tracking_number,
            },
        )
        .await?;
    Ok(Json(shipment_response(&state, actor, &shipment).await?))
}

/// POST /shipments/{id}/deliver
#[tracing::instrument(skip_all)]
pub async fn deliver(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id: ShipmentId = parse_id(&id)?;
    let shipment = state
        .mediator
        .send(actor, DeliverShipment { shipment_id })
        .await?;
    Ok(Json(shipment_response(&state, actor, &shipment).await?))
}
