//! Category and product records.

use chrono::{DateTime, Utc};
use domain::{
    AppliedDiscount, Category, CategoryId, DiscountSource, PriceQuote, Product, ProductId,
};
use serde::{Deserialize, Serialize};
use shared_kernel::AggregateRoot;
use std::collections::BTreeSet;

use crate::common::percent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id(),
            name: category.name().to_string(),
            description: category.description().to_string(),
            created_at: category.created_at(),
            updated_at: category.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sku: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category_ids: BTreeSet<CategoryId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChangePriceRequest {
    pub price_cents: i64,
}

/// Positive to add stock, negative to remove it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCategoriesRequest {
    pub category_ids: BTreeSet<CategoryId>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// `GET /products` filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// A discount that took part in a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountResponse {
    /// `Sale` or `Coupon`.
    pub source: String,
    /// Sale id or coupon id.
    pub id: String,
    /// Sale name or coupon code.
    pub label: String,
    pub percentage: f64,
}

impl From<&AppliedDiscount> for DiscountResponse {
    fn from(discount: &AppliedDiscount) -> Self {
        let (source, id, label) = match &discount.source {
            DiscountSource::Sale { sale_id, name } => ("Sale", sale_id.to_string(), name.clone()),
            DiscountSource::Coupon { coupon_id, code } => {
                ("Coupon", coupon_id.to_string(), code.to_string())
            }
        };
        Self {
            source: source.to_string(),
            id,
            label,
            percentage: percent(discount.percentage),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuoteResponse {
    pub product_id: ProductId,
    pub base_price_cents: i64,
    pub final_price_cents: i64,
    pub discounts: Vec<DiscountResponse>,
}

impl From<&PriceQuote> for PriceQuoteResponse {
    fn from(quote: &PriceQuote) -> Self {
        Self {
            product_id: quote.product_id,
            base_price_cents: quote.base_price.cents(),
            final_price_cents: quote.final_price.cents(),
            discounts: quote.applied.iter().map(DiscountResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub sku: String,
    pub price_cents: i64,
    /// Price after the sales running now.
    pub final_price_cents: i64,
    pub discounts: Vec<DiscountResponse>,
    pub stock: u32,
    pub active: bool,
    pub category_ids: BTreeSet<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn new(product: &Product, pricing: &PriceQuote) -> Self {
        Self {
            id: product.id(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            sku: product.sku().to_string(),
            price_cents: product.price().cents(),
            final_price_cents: pricing.final_price.cents(),
            discounts: pricing.applied.iter().map(DiscountResponse::from).collect(),
            stock: product.stock(),
            active: product.is_active(),
            category_ids: product.category_ids().clone(),
            created_at: product.created_at(),
            updated_at: product.updated_at(),
        }
    }
}
