//! Category and product endpoints.

use std::sync::Arc;

use application::requests::{
    AdjustStock, ChangeProductPrice, CreateCategory, CreateProduct, DeleteCategory, GetCategory,
    GetProduct, ListCategories, ListProducts, ProductView, SetProductActive,
    SetProductCategories, UpdateCategory, UpdateProduct,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use contracts::{
    AdjustStockRequest, CategoryRequest, CategoryResponse, ChangePriceRequest,
    CreateProductRequest, PageQuery, PagedResponse, ProductQuery, ProductResponse,
    SetActiveRequest, SetCategoriesRequest, UpdateProductRequest,
};
use domain::{CategoryId, ProductId};
use shared_kernel::Page;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, Auth, parse_id};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product).put(update_product))
        .route("/products/{id}/price", put(change_price))
        .route("/products/{id}/stock", post(adjust_stock))
        .route("/products/{id}/categories", put(set_categories))
        .route("/products/{id}/active", put(set_active))
}

fn product_response(view: &ProductView) -> ProductResponse {
    ProductResponse::new(&view.product, &view.pricing)
}

// -- Categories --

/// GET /categories
#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PagedResponse<CategoryResponse>>, ApiError> {
    let categories = state
        .mediator
        .send(actor, ListCategories { page: query.page() })
        .await?;
    Ok(Json(PagedResponse::map(categories, |category| {
        CategoryResponse::from(&category)
    })))
}

/// POST /categories
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = state
        .mediator
        .send(
            actor,
            CreateCategory {
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(&category))))
}

/// GET /categories/{id}
#[tracing::instrument(skip_all)]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category_id: CategoryId = parse_id(&id)?;
    let category = state
        .mediator
        .send(actor, GetCategory { category_id })
        .await?;
    Ok(Json(CategoryResponse::from(&category)))
}

/// PUT /categories/{id}
#[tracing::instrument(skip_all)]
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category_id: CategoryId = parse_id(&id)?;
    let category = state
        .mediator
        .send(
            actor,
            UpdateCategory {
                category_id,
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok(Json(CategoryResponse::from(&category)))
}

/// DELETE /categories/{id}: refused while products reference the category.
#[tracing::instrument(skip_all)]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let category_id: CategoryId = parse_id(&id)?;
    state
        .mediator
        .send(actor, DeleteCategory { category_id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Products --

/// GET /products: the catalog with current sale pricing.
#[tracing::instrument(skip_all)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<PagedResponse<ProductResponse>>, ApiError> {
    let page = Page::new(
        query.offset.unwrap_or(0),
        query.limit.unwrap_or(Page::DEFAULT_LIMIT),
    );
    let products = state
        .mediator
        .send(
            actor,
            ListProducts {
                category_id: query.category_id,
                search: query.search,
                include_inactive: query.include_inactive,
                page,
            },
        )
        .await?;
    Ok(Json(PagedResponse::map(products, |view| {
        product_response(&view)
    })))
}

/// POST /products
#[tracing::instrument(skip_all)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let view = state
        .mediator
        .send(
            actor,
            CreateProduct {
                name: req.name,
                description: req.description,
                sku: req.sku,
                price_cents: req.price_cents,
                stock: req.stock,
                category_ids: req.category_ids,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(product_response(&view))))
}

/// GET /products/{id}
#[tracing::instrument(skip_all)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let view = state.mediator.send(actor, GetProduct { product_id }).await?;
    Ok(Json(product_response(&view)))
}

/// PUT /products/{id}
#[tracing::instrument(skip_all)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let view = state
        .mediator
        .send(
            actor,
            UpdateProduct {
                product_id,
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok(Json(product_response(&view)))
}

/// PUT /products/{id}/price
#[tracing::instrument(skip_all)]
pub async fn change_price(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ChangePriceRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let view = state
        .mediator
        .send(
            actor,
            ChangeProductPrice {
                product_id,
                price_cents: req.price_cents,
            },
        )
        .await?;
    Ok(Json(product_response(&view)))
}

/// POST /products/{id}/stock: add or remove units.
#[tracing::instrument(skip_all)]
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AdjustStockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let view = state
        .mediator
        .send(
            actor,
            AdjustStock {
                product_id,
                delta: req.delta,
            },
        )
        .await?;
    Ok(Json(product_response(&view)))
}

/// PUT /products/{id}/categories
#[tracing::instrument(skip_all)]
pub async fn set_categories(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SetCategoriesRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let view = state
        .mediator
        .send(
            actor,
            SetProductCategories {
                product_id,
                category_ids: req.category_ids,
            },
        )
        .await?;
    Ok(Json(product_response(&view)))
}

/// PUT /products/{id}/active
#[tracing::instrument(skip_all)]
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id)?;
    let view = state
        .mediator
        .send(
            actor,
            SetProductActive {
                product_id,
                active: req.active,
            },
        )
        .await?;
    Ok(Json(product_response(&view)))
}
