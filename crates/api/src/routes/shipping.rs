//! Carrier and shipping method endpoints.

use std::sync::Arc;

use application::requests::{
    CreateCarrier, CreateShippingMethod, GetCarrier, GetShippingMethod, ListCarriers,
    ListShippingMethods, SetCarrierActive, SetShippingMethodActive, UpdateCarrier,
    UpdateShippingMethod,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use contracts::{
    CarrierRequest, CarrierResponse, CreateShippingMethodRequest, PageQuery, PagedResponse,
    SetActiveRequest, ShippingMethodQuery, ShippingMethodResponse, UpdateShippingMethodRequest,
};
use domain::{CarrierId, ShippingMethodId};
use shared_kernel::Page;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, Auth, parse_id};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/carriers", get(list_carriers).post(create_carrier))
        .route("/carriers/{id}", get(get_carrier).put(update_carrier))
        .route("/carriers/{id}/active", put(set_carrier_active))
        .route("/shipping-methods", get(list_methods).post(create_method))
        .route("/shipping-methods/{id}", get(get_method).put(update_method))
        .route("/shipping-methods/{id}/active", put(set_method_active))
}

/// GET /carriers
#[tracing::instrument(skip_all)]
pub async fn list_carriers(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PagedResponse<CarrierResponse>>, ApiError> {
    let carriers = state
        .mediator
        .send(actor, ListCarriers { page: query.page() })
        .await?;
    Ok(Json(PagedResponse::map(carriers, |carrier| {
        CarrierResponse::from(&carrier)
    })))
}

/// POST /carriers
#[tracing::instrument(skip_all)]
pub async fn create_carrier(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<CarrierRequest>,
) -> Result<(StatusCode, Json<CarrierResponse>), ApiError> {
    let carrier = state
        .mediator
        .send(
            actor,
            CreateCarrier {
                name: req.name,
                contact_email: req.contact_email,
                tracking_url_template: req.tracking_url_template,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CarrierResponse::from(&carrier))))
}

/// GET /carriers/{id}
#[tracing::instrument(skip_all)]
pub async fn get_carrier(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<CarrierResponse>, ApiError> {
    let carrier_id: CarrierId = parse_id(&id)?;
    let carrier = state.mediator.send(actor, GetCarrier { carrier_id }).await?;
    Ok(Json(CarrierResponse::from(&carrier)))
}

/// PUT /carriers/{id}
#[tracing::instrument(skip_all)]
pub async fn update_carrier(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CarrierRequest>,
) -> Result<Json<CarrierResponse>, ApiError> {
    let carrier_id: CarrierId = parse_id(&id)?;
    let carrier = state
        .mediator
        .send(
            actor,
            UpdateCarrier {
                carrier_id,
                name: req.name,
                contact_email: req.contact_email,
                tracking_url_template: req.tracking_url_template,
            },
        )
        .await?;
    Ok(Json(CarrierResponse::from(&carrier)))
}

/// PUT /carriers/{id}/active
#[tracing::instrument(skip_all)]
pub async fn set_carrier_active(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> Result<Json<CarrierResponse>, ApiError> {
    let carrier_id: CarrierId = parse_id(&id)?;
    let carrier = state
        .mediator
        .send(
            actor,
            SetCarrierActive {
                carrier_id,
                active: req.active,
            },
        )
        .await?;
    Ok(Json(CarrierResponse::from(&carrier)))
}

/// GET /shipping-methods
#[tracing::instrument(skip_all)]
pub async fn list_methods(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiQuery(query): ApiQuery<ShippingMethodQuery>,
) -> Result<Json<PagedResponse<ShippingMethodResponse>>, ApiError> {
    let page = Page::new(
        query.offset.unwrap_or(0),
        query.limit.unwrap_or(Page::DEFAULT_LIMIT),
    );
    let methods = state
        .mediator
        .send(
            actor,
            ListShippingMethods {
                carrier_id: query.carrier_id,
                active_only: query.active_only,
                page,
            },
        )
        .await?;
    Ok(Json(PagedResponse::map(methods, |method| {
        ShippingMethodResponse::from(&method)
    })))
}

/// POST /shipping-methods
#[tracing::instrument(skip_all)]
pub async fn create_method(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<CreateShippingMethodRequest>,
) -> Result<(StatusCode, Json<ShippingMethodResponse>), ApiError> {
    let method = state
        .mediator
        .send(
            actor,
            CreateShippingMethod {
                carrier_id: req.carrier_id,
                name: req.name,
                price_cents: req.price_cents,
                estimated_days: req.estimated_days,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ShippingMethodResponse::from(&method))))
}

/// GET /shipping-methods/{id}
#[tracing::instrument(skip_all)]
pub async fn get_method(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<ShippingMethodResponse>, ApiError> {
    let shipping_method_id: ShippingMethodId = parse_id(&id)?;
    let method = state
        .mediator
        .send(actor, GetShippingMethod { shipping_method_id })
        .await?;
    Ok(Json(ShippingMethodResponse::from(&method)))
}

/// PUT /shipping-methods/{id}
#[tracing::instrument(skip_all)]
pub async fn update_method(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateShippingMethodRequest>,
) -> Result<Json<ShippingMethodResponse>, ApiError> {
    let shipping_method_id: ShippingMethodId = parse_id(&id)?;
    let method = state
        .mediator
        .send(
            actor,
            UpdateShippingMethod {
                shipping_method_id,
                name: req.name,
                price_cents: req.price_cents,
                estimated_days: req.estimated_days,
            },
        )
        .await?;
    Ok(Json(ShippingMethodResponse::from(&method)))
}

/// PUT /shipping-methods/{id}/active: activation needs an active carrier.
#[tracing::instrument(skip_all)]
pub async fn set_method_active(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> Result<Json<ShippingMethodResponse>, ApiError> {
    let shipping_method_id: ShippingMethodId = parse_id(&id)?;
    let method = state
        .mediator
        .send(
            actor,
            SetShippingMethodActive {
                shipping_method_id,
                active: req.active,
            },
        )
        .await?;
    Ok(Json(ShippingMethodResponse::from(&method)))
}
