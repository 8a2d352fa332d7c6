//! Coupon and sale endpoints.

use std::sync::Arc;

use application::requests::{
    CouponInput, CreateCoupon, CreateSale, DeleteCoupon, EndSale, GetCoupon, GetSale,
    ListCoupons, ListSales, PreviewCoupon, SaleInput, SetCouponActive, SetCouponRules,
    SetSaleTargets, UpdateCoupon, UpdateSale,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use contracts::{
    CouponPreviewRequest, CouponPreviewResponse, CouponResponse, CouponRulesDto,
    CouponTermsRequest, CreateCouponRequest, CreateSaleRequest, PageQuery, PagedResponse,
    PriceQuoteResponse, SaleQuery, SaleResponse, SaleTargetsRequest, SaleTermsRequest,
    SetActiveRequest, basis_points, percent,
};
use domain::{CouponId, SaleId};
use shared_kernel::Page;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, Auth, parse_id};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/coupons", get(list_coupons).post(create_coupon))
        .route("/coupons/preview", post(preview_coupon))
        .route(
            "/coupons/{id}",
            get(get_coupon).put(update_coupon).delete(delete_coupon),
        )
        .route("/coupons/{id}/rules", put(set_rules))
        .route("/coupons/{id}/active", put(set_coupon_active))
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale).put(update_sale))
        .route("/sales/{id}/targets", put(set_targets))
        .route("/sales/{id}/end", post(end_sale))
}

fn coupon_input(terms: CouponTermsRequest) -> CouponInput {
    CouponInput {
        description: terms.description,
        percentage: basis_points(terms.percentage),
        valid_from: terms.valid_from,
        valid_until: terms.valid_until,
        usage_limit: terms.usage_limit,
    }
}

fn sale_input(terms: SaleTermsRequest) -> SaleInput {
    SaleInput {
        name: terms.name,
        description: terms.description,
        percentage: basis_points(terms.percentage),
        starts_at: terms.starts_at,
        ends_at: terms.ends_at,
    }
}

// -- Coupons --

/// GET /coupons
#[tracing::instrument(skip_all)]
pub async fn list_coupons(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PagedResponse<CouponResponse>>, ApiError> {
    let coupons = state
        .mediator
        .send(actor, ListCoupons { page: query.page() })
        .await?;
    Ok(Json(PagedResponse::map(coupons, |coupon| {
        CouponResponse::from(&coupon)
    })))
}

/// POST /coupons
#[tracing::instrument(skip_all)]
pub async fn create_coupon(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<CreateCouponRequest>,
) -> Result<(StatusCode, Json<CouponResponse>), ApiError> {
    let coupon = state
        .mediator
        .send(
            actor,
            CreateCoupon {
                code: req.code,
                terms: coupon_input(req.terms),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CouponResponse::from(&coupon))))
}

/// POST /coupons/preview: price products as if the coupon were applied.
#[tracing::instrument(skip_all)]
pub async fn preview_coupon(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<CouponPreviewRequest>,
) -> Result<Json<CouponPreviewResponse>, ApiError> {
    let preview = state
        .mediator
        .send(
            actor,
            PreviewCoupon {
                code: req.code,
                product_ids: req.product_ids,
            },
        )
        .await?;
    Ok(Json(CouponPreviewResponse {
        code: preview.coupon.code().to_string(),
        percentage: percent(preview.coupon.percentage()),
        items: preview.quotes.iter().map(PriceQuoteResponse::from).collect(),
    }))
}

/// GET /coupons/{id}
#[tracing::instrument(skip_all)]
pub async fn get_coupon(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<CouponResponse>, ApiError> {
    let coupon_id: CouponId = parse_id(&id)?;
    let coupon = state.mediator.send(actor, GetCoupon { coupon_id }).await?;
    Ok(Json(CouponResponse::from(&coupon)))
}

/// PUT /coupons/{id}
#[tracing::instrument(skip_all)]
pub async fn update_coupon(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CouponTermsRequest>,
) -> Result<Json<CouponResponse>, ApiError> {
    let coupon_id: CouponId = parse_id(&id)?;
    let coupon = state
        .mediator
        .send(
            actor,
            UpdateCoupon {
                coupon_id,
                terms: coupon_input(req),
            },
        )
        .await?;
    Ok(Json(CouponResponse::from(&coupon)))
}

/// DELETE /coupons/{id}: only coupons that were never redeemed.
#[tracing::instrument(skip_all)]
pub async fn delete_coupon(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let coupon_id: CouponId = parse_id(&id)?;
    state.mediator.send(actor, DeleteCoupon { coupon_id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /coupons/{id}/rules
#[tracing::instrument(skip_all)]
pub async fn set_rules(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CouponRulesDto>,
) -> Result<Json<CouponResponse>, ApiError> {
    let coupon_id: CouponId = parse_id(&id)?;
    let coupon = state
        .mediator
        .send(
            actor,
            SetCouponRules {
                coupon_id,
                rules: req.into(),
            },
        )
        .await?;
    Ok(Json(CouponResponse::from(&coupon)))
}

/// PUT /coupons/{id}/active
#[tracing::instrument(skip_all)]
pub async fn set_coupon_active(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> Result<Json<CouponResponse>, ApiError> {
    let coupon_id: CouponId = parse_id(&id)?;
    let coupon = state
        .mediator
        .send(
            actor,
            SetCouponActive {
                coupon_id,
                active: req.active,
            },
        )
        .await?;
    Ok(Json(CouponResponse::from(&coupon)))
}

// -- Sales --

/// GET /sales
#[tracing::instrument(skip_all)]
pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiQuery(query): ApiQuery<SaleQuery>,
) -> Result<Json<PagedResponse<SaleResponse>>, ApiError> {
    let page = Page::new(
        query.offset.unwrap_or(0),
        query.limit.unwrap_or(Page::DEFAULT_LIMIT),
    );
    let sales = state
        .mediator
        .send(
            actor,
            ListSales {
                active_only: query.active_only,
                page,
            },
        )
        .await?;
    Ok(Json(PagedResponse::map(sales, |sale| SaleResponse::from(&sale))))
}

/// POST /sales
#[tracing::instrument(skip_all)]
pub async fn create_sale(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), ApiError> {
    let sale = state
        .mediator
        .send(
            actor,
            CreateSale {
                terms: sale_input(req.terms),
                product_ids: req.product_ids,
                category_ids: req.category_ids,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(SaleResponse::from(&sale))))
}

/// GET /sales/{id}
#[tracing::instrument(skip_all)]
pub async fn get_sale(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale_id: SaleId = parse_id(&id)?;
    let sale = state.mediator.send(actor, GetSale { sale_id }).await?;
    Ok(Json(SaleResponse::from(&sale)))
}

/// PUT /sales/{id}
#[tracing::instrument(skip_all)]
pub async fn update_sale(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SaleTermsRequest>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale_id: SaleId = parse_id(&id)?;
    let sale = state
        .mediator
        .send(
            actor,
            UpdateSale {
                sale_id,
                terms: sale_input(req),
            },
        )
        .await?;
    Ok(Json(SaleResponse::from(&sale)))
}

/// PUT /sales/{id}/targets: replace the products and categories on sale.
#[tracing::instrument(skip_all)]
pub async fn set_targets(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SaleTargetsRequest>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale_id: SaleId = parse_id(&id)?;
    let sale = state
        .mediator
        .send(
            actor,
            SetSaleTargets {
                sale_id,
                product_ids: req.product_ids,
                category_ids: req.category_ids,
            },
        )
        .await?;
    Ok(Json(SaleResponse::from(&sale)))
}

/// POST /sales/{id}/end: stop a sale now.
#[tracing::instrument(skip_all)]
pub async fn end_sale(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale_id: SaleId = parse_id(&id)?;
    let sale = state.mediator.send(actor, EndSale { sale_id }).await?;
    Ok(Json(SaleResponse::from(&sale)))
}
