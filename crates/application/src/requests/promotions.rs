//! Coupons and sales.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::specifications::{ActiveSales, AllCoupons, AllSales, CouponByCode};
use domain::{
    Category, CategoryId, Coupon, CouponCode, CouponError, CouponId, CouponRules, CouponTerms,
    DiscountService, PriceQuote, Product, ProductId, Sale, SaleId, SaleTerms,
};
use shared_kernel::{AggregateRoot, Page, Paged, Percentage, Specification};

use super::catalog::active_sales;
use crate::authorization::Policy;
use crate::error::{AppError, Result};
use crate::mediator::Request;
use crate::session::Session;
use crate::validation::ValidationErrors;

const MAX_NAME_LEN: usize = 100;
const MAX_PREVIEW_PRODUCTS: usize = 100;

fn percentage(basis_points: u32) -> Result<Percentage> {
    Percentage::from_basis_points(basis_points).map_err(|err| {
        let mut errors = ValidationErrors::new();
        errors.add("percentage", err.to_string());
        AppError::Validation(errors)
    })
}

fn validate_window(
    errors: &mut ValidationErrors,
    field: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) {
    errors.check(from < until, field, "must end after it starts");
}

async fn ensure_targets_exist(
    session: &Session,
    products: &BTreeSet<ProductId>,
    categories: &BTreeSet<CategoryId>,
) -> Result<()> {
    let product_repository = session.repository::<Product>();
    for id in products {
        if product_repository.get(*id).await?.is_none() {
            return Err(AppError::not_found("Product", id));
        }
    }
    let category_repository = session.repository::<Category>();
    for id in categories {
        if category_repository.get(*id).await?.is_none() {
            return Err(AppError::not_found("Category", id));
        }
    }
    Ok(())
}

/// Loads the coupon with `code`, failing with `NotFound`.
pub(crate) async fn coupon_by_code(session: &Session, code: &str) -> Result<Coupon> {
    let code = CouponCode::parse(code)?;
    session
        .repository::<Coupon>()
        .find_one(&CouponByCode(code.clone()))
        .await?
        .ok_or_else(|| AppError::not_found("Coupon", code))
}

// Coupons

#[derive(Debug, Clone)]
pub struct CouponInput {
    pub description: String,
    /// Basis points: 1250 is 12.5%.
    pub percentage: u32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<u32>,
}

impl CouponInput {
    fn validate(&self, errors: &mut ValidationErrors) {
        errors.percentage("percentage", self.percentage);
        validate_window(errors, "valid_until", self.valid_from, self.valid_until);
        errors.check(
            self.usage_limit != Some(0),
            "usage_limit",
            "must be greater than 0",
        );
    }

    fn into_terms(self) -> Result<CouponTerms> {
        Ok(CouponTerms {
            description: self.description,
            percentage: percentage(self.percentage)?,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            usage_limit: self.usage_limit,
        })
    }
}

/// Scope of the unique key held for every coupon code.
const COUPON_CODE_KEY: &str = "CouponCode";

#[derive(Debug, Clone)]
pub struct CreateCoupon {
    pub code: String,
    pub terms: CouponInput,
}

#[async_trait]
impl Request for CreateCoupon {
    type Response = Coupon;
    const NAME: &'static str = "create_coupon";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.coupon_code("code", &self.code);
        self.terms.validate(errors);
    }

    async fn handle(self, session: &mut Session) -> Result<Coupon> {
        let code = CouponCode::parse(&self.code)?;
        let taken = session
            .repository::<Coupon>()
            .find_one(&CouponByCode(code.clone()))
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(format!("Coupon code {code} already exists")));
        }

        let mut coupon = Coupon::create(code, self.terms.into_terms()?, session.now())?;
        session
            .claim_unique(COUPON_CODE_KEY, coupon.code().as_str(), coupon.id().as_uuid())
            .await?;
        session.save(&mut coupon).await?;
        Ok(coupon)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateCoupon {
    pub coupon_id: CouponId,
    pub terms: CouponInput,
}

#[async_trait]
impl Request for UpdateCoupon {
    type Response = Coupon;
    const NAME: &'static str = "update_coupon";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        self.terms.validate(errors);
    }

    async fn handle(self, session: &mut Session) -> Result<Coupon> {
        let mut coupon: Coupon = session.load(self.coupon_id).await?;
        coupon.update(self.terms.into_terms()?, session.now())?;
        session.save(&mut coupon).await?;
        Ok(coupon)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SetCouponActive {
    pub coupon_id: CouponId,
    pub active: bool,
}

#[async_trait]
impl Request for SetCouponActive {
    type Response = Coupon;
    const NAME: &'static str = "set_coupon_active";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<Coupon> {
        let mut coupon: Coupon = session.load(self.coupon_id).await?;
        if self.active {
            coupon.activate(session.now());
        } else {
            coupon.deactivate(session.now());
        }
        session.save(&mut coupon).await?;
        Ok(coupon)
    }
}

#[derive(Debug, Clone)]
pub struct SetCouponRules {
    pub coupon_id: CouponId,
    pub rules: CouponRules,
}

#[async_trait]
impl Request for SetCouponRules {
    type Response = Coupon;
    const NAME: &'static str = "set_coupon_rules";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        if let Err(err) = self.rules.validate() {
            errors.add("rules", err.to_string());
        }
    }

    async fn handle(self, session: &mut Session) -> Result<Coupon> {
        let rules = self.rules;
        let products: BTreeSet<ProductId> = rules
            .allowed_products
            .union(&rules.excluded_products)
            .copied()
            .collect();
        let categories: BTreeSet<CategoryId> = rules
            .allowed_categories
            .union(&rules.excluded_categories)
            .copied()
            .collect();
        ensure_targets_exist(session, &products, &categories).await?;

        let mut coupon: Coupon = session.load(self.coupon_id).await?;
        coupon.set_rules(rules, session.now())?;
        session.save(&mut coupon).await?;
        Ok(coupon)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetCoupon {
    pub coupon_id: CouponId,
}

#[async_trait]
impl Request for GetCoupon {
    type Response = Coupon;
    const NAME: &'static str = "get_coupon";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<Coupon> {
        session.load(self.coupon_id).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListCoupons {
    pub page: Page,
}

#[async_trait]
impl Request for ListCoupons {
    type Response = Paged<Coupon>;
    const NAME: &'static str = "list_coupons";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<Paged<Coupon>> {
        Ok(session
            .repository::<Coupon>()
            .find(&AllCoupons, self.page)
            .await?)
    }
}

/// Deletes a coupon that was never redeemed. Redeemed coupons are kept for
/// the orders that reference them; deactivate those instead.
#[derive(Debug, Clone, Copy)]
pub struct DeleteCoupon {
    pub coupon_id: CouponId,
}

#[async_trait]
impl Request for DeleteCoupon {
    type Response = ();
    const NAME: &'static str = "delete_coupon";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<()> {
        let coupon: Coupon = session.load(self.coupon_id).await?;
        if coupon.times_used() > 0 {
            return Err(AppError::Conflict(format!(
                "Coupon {} has been redeemed {} time(s)",
                coupon.code(),
                coupon.times_used()
            )));
        }
        session.repository::<Coupon>().delete(&coupon).await?;
        session
            .release_unique(COUPON_CODE_KEY, coupon.code().as_str())
            .await?;
        Ok(())
    }
}

/// What a coupon would do for a set of products.
#[derive(Debug, Clone)]
pub struct CouponPreview {
    pub coupon: Coupon,
    pub quotes: Vec<PriceQuote>,
}

/// Prices products with a coupon code without redeeming it.
#[derive(Debug, Clone)]
pub struct PreviewCoupon {
    pub code: String,
    pub product_ids: Vec<ProductId>,
}

#[async_trait]
impl Request for PreviewCoupon {
    type Response = CouponPreview;
    const NAME: &'static str = "preview_coupon";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.coupon_code("code", &self.code);
        errors.check(
            !self.product_ids.is_empty(),
            "product_ids",
            "must list at least one product",
        );
        errors.check(
            self.product_ids.len() <= MAX_PREVIEW_PRODUCTS,
            "product_ids",
            format!("must list at most {MAX_PREVIEW_PRODUCTS} products"),
        );
    }

    async fn handle(self, session: &mut Session) -> Result<CouponPreview> {
        let now = session.now();
        let coupon = coupon_by_code(session, &self.code).await?;
        coupon.ensure_valid(now)?;

        let sales = active_sales(session).await?;
        let mut quotes = Vec::with_capacity(self.product_ids.len());
        for product_id in self.product_ids {
            let product: Product = session.load(product_id).await?;
            quotes.push(DiscountService::price(&product, &sales, Some(&coupon), now));
        }

        if !quotes.iter().any(PriceQuote::coupon_applied) {
            return Err(CouponError::NotApplicable {
                code: coupon.code().clone(),
            }
            .into());
        }
        Ok(CouponPreview { coupon, quotes })
    }
}

// Sales

#[derive(Debug, Clone)]
pub struct SaleInput {
    pub name: String,
    pub description: String,
    /// Basis points: 1250 is 12.5%.
    pub percentage: u32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl SaleInput {
    fn validate(&self, errors: &mut ValidationErrors) {
        errors.require("name", &self.name);
        errors.max_len("name", &self.name, MAX_NAME_LEN);
        errors.percentage("percentage", self.percentage);
        validate_window(errors, "ends_at", self.starts_at, self.ends_at);
    }

    fn into_terms(self) -> Result<SaleTerms> {
        Ok(SaleTerms {
            name: self.name,
            description: self.description,
            percentage: percentage(self.percentage)?,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateSale {
    pub terms: SaleInput,
    pub product_ids: BTreeSet<ProductId>,
    pub category_ids: BTreeSet<CategoryId>,
}

#[async_trait]
impl Request for CreateSale {
    type Response = Sale;
    const NAME: &'static str = "create_sale";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        self.terms.validate(errors);
    }

    async fn handle(self, session: &mut Session) -> Result<Sale> {
        ensure_targets_exist(session, &self.product_ids, &self.category_ids).await?;

        let now = session.now();
        let mut sale = Sale::create(self.terms.into_terms()?, now)?;
        if !self.product_ids.is_empty() || !self.category_ids.is_empty() {
            sale.set_targets(self.product_ids, self.category_ids, now);
        }
        session.save(&mut sale).await?;

        tracing::info!(sale_id = %sale.id(), "sale created");
        Ok(sale)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateSale {
    pub sale_id: SaleId,
    pub terms: SaleInput,
}

#[async_trait]
impl Request for UpdateSale {
    type Response = Sale;
    const NAME: &'static str = "update_sale";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        self.terms.validate(errors);
    }

    async fn handle(self, session: &mut Session) -> Result<Sale> {
        let mut sale: Sale = session.load(self.sale_id).await?;
        sale.update(self.terms.into_terms()?, session.now())?;
        session.save(&mut sale).await?;
        Ok(sale)
    }
}

#[derive(Debug, Clone)]
pub struct SetSaleTargets {
    pub sale_id: SaleId,
    pub product_ids: BTreeSet<ProductId>,
    pub category_ids: BTreeSet<CategoryId>,
}

#[async_trait]
impl Request for SetSaleTargets {
    type Response = Sale;
    const NAME: &'static str = "set_sale_targets";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<Sale> {
        ensure_targets_exist(session, &self.product_ids, &self.category_ids).await?;
        let mut sale: Sale = session.load(self.sale_id).await?;
        sale.set_targets(self.product_ids, self.category_ids, session.now());
        session.save(&mut sale).await?;
        Ok(sale)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EndSale {
    pub sale_id: SaleId,
}

#[async_trait]
impl Request for EndSale {
    type Response = Sale;
    const NAME: &'static str = "end_sale";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<Sale> {
        let mut sale: Sale = session.load(self.sale_id).await?;
        sale.end(session.now())?;
        session.save(&mut sale).await?;
        Ok(sale)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetSale {
    pub sale_id: SaleId,
}

#[async_trait]
impl Request for GetSale {
    type Response = Sale;
    const NAME: &'static str = "get_sale";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<Sale> {
        session.load(self.sale_id).await
    }
}

/// Lists sales, latest start first. `active_only` keeps the running ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSales {
    pub active_only: bool,
    pub page: Page,
}

#[async_trait]
impl Request for ListSales {
    type Response = Paged<Sale>;
    const NAME: &'static str = "list_sales";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<Paged<Sale>> {
        let spec: Box<dyn Specification<Sale>> = if self.active_only {
            Box::new(ActiveSales::at(session.now()))
        } else {
            Box::new(AllSales)
        };
        Ok(session.repository::<Sale>().find(&spec, self.page).await?)
    }
}
