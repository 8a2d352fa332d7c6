//! Coupon and sale records.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use domain::{CategoryId, Coupon, CouponId, CouponRules, ProductId, Sale, SaleId};
use serde::{Deserialize, Serialize};
use shared_kernel::AggregateRoot;

use crate::catalog::PriceQuoteResponse;
use crate::common::percent;

/// Coupon terms. `percentage` is a percent value such as `12.5`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponTermsRequest {
    #[serde(default)]
    pub description: String,
    pub percentage: f64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCouponRequest {
    pub code: String,
    #[serde(flatten)]
    pub terms: CouponTermsRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRulesDto {
    #[serde(default)]
    pub allowed_products: BTreeSet<ProductId>,
    #[serde(default)]
    pub allowed_categories: BTreeSet<CategoryId>,
    #[serde(default)]
    pub excluded_products: BTreeSet<ProductId>,
    #[serde(default)]
    pub excluded_categories: BTreeSet<CategoryId>,
}

impl From<&CouponRules> for CouponRulesDto {
    fn from(rules: &CouponRules) -> Self {
        Self {
            allowed_products: rules.allowed_products.clone(),
            allowed_categories: rules.allowed_categories.clone(),
            excluded_products: rules.excluded_products.clone(),
            excluded_categories: rules.excluded_categories.clone(),
        }
    }
}

impl From<CouponRulesDto> for CouponRules {
    fn from(dto: CouponRulesDto) -> Self {
        Self {
            allowed_products: dto.allowed_products,
            allowed_categories: dto.allowed_categories,
            excluded_products: dto.excluded_products,
            excluded_categories: dto.excluded_categories,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponResponse {
    pub id: CouponId,
    pub code: String,
    pub description: String,
    pub percentage: f64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<u32>,
    pub times_used: u32,
    pub active: bool,
    pub rules: CouponRulesDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Coupon> for CouponResponse {
    fn from(coupon: &Coupon) -> Self {
        Self {
            id: coupon.id(),
            code: coupon.code().to_string(),
            description: coupon.description().to_string(),
            percentage: percent(coupon.percentage()),
            valid_from: coupon.valid_from(),
            valid_until: coupon.valid_until(),
            usage_limit: coupon.usage_limit(),
            times_used: coupon.times_used(),
            active: coupon.is_active(),
            rules: CouponRulesDto::from(coupon.rules()),
            created_at: coupon.created_at(),
            updated_at: coupon.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponPreviewRequest {
    pub code: String,
    pub product_ids: Vec<ProductId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponPreviewResponse {
    pub code: String,
    pub percentage: f64,
    pub items: Vec<PriceQuoteResponse>,
}

/// Sale terms. `percentage` is a percent value such as `12.5`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleTermsRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub percentage: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    #[serde(flatten)]
    pub terms: SaleTermsRequest,
    #[serde(default)]
    pub product_ids: BTreeSet<ProductId>,
    #[serde(default)]
    pub category_ids: BTreeSet<CategoryId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleTargetsRequest {
    #[serde(default)]
    pub product_ids: BTreeSet<ProductId>,
    #[serde(default)]
    pub category_ids: BTreeSet<CategoryId>,
}

/// `GET /sales` filters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SaleQuery {
    #[serde(default)]
    pub active_only: bool,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleResponse {
    pub id: SaleId,
    pub name: String,
    pub description: String,
    pub percentage: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub product_ids: BTreeSet<ProductId>,
    pub category_ids: BTreeSet<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Sale> for SaleResponse {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id(),
            name: sale.name().to_string(),
            description: sale.description().to_string(),
            percentage: percent(sale.percentage()),
            starts_at: sale.starts_at(),
            ends_at: sale.ends_at(),
            product_ids: sale.product_ids().clone(),
            category_ids: sale.category_ids().clone(),
            created_at: sale.created_at(),
            updated_at: sale.updated_at(),
        }
    }
}
