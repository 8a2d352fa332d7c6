//! Categories and products.

use std::collections::BTreeSet;

use async_trait::async_trait;
use domain::specifications::{
    ActiveProducts, ActiveSales, AllCategories, AllProducts, ProductBySku, ProductsInCategory,
    ProductsMatchingName,
};
use domain::{
    Category, CategoryId, DiscountService, NewProduct, PriceQuote, Product, ProductId, Sale,
    normalize_sku,
};
use shared_kernel::{AggregateRoot, Money, Page, Paged, Specification, SpecificationExt};

use crate::authorization::Policy;
use crate::error::{AppError, Result};
use crate::mediator::Request;
use crate::session::Session;
use crate::validation::ValidationErrors;

const MAX_NAME_LEN: usize = 200;
const MAX_SKU_LEN: usize = 64;

/// A product with its current sale pricing.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub product: Product,
    pub pricing: PriceQuote,
}

pub(crate) async fn active_sales(session: &Session) -> Result<Vec<Sale>> {
    Ok(session
        .repository::<Sale>()
        .find_all(&ActiveSales::at(session.now()))
        .await?)
}

fn view(product: Product, sales: &[Sale], session: &Session) -> ProductView {
    let pricing = DiscountService::price(&product, sales, None, session.now());
    ProductView { product, pricing }
}

async fn view_one(product: Product, session: &Session) -> Result<ProductView> {
    let sales = active_sales(session).await?;
    Ok(view(product, &sales, session))
}

async fn ensure_categories_exist(session: &Session, ids: &BTreeSet<CategoryId>) -> Result<()> {
    let repository = session.repository::<Category>();
    for id in ids {
        if repository.get(*id).await?.is_none() {
            return Err(AppError::not_found("Category", id));
        }
    }
    Ok(())
}

fn validate_category(errors: &mut ValidationErrors, name: &str) {
    errors.require("name", name);
    errors.max_len("name", name, MAX_NAME_LEN);
}

fn validate_product_details(errors: &mut ValidationErrors, name: &str) {
    errors.require("name", name);
    errors.max_len("name", name, MAX_NAME_LEN);
}

// Categories

#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub description: String,
}

#[async_trait]
impl Request for CreateCategory {
    type Response = Category;
    const NAME: &'static str = "create_category";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_category(errors, &self.name);
    }

    async fn handle(self, session: &mut Session) -> Result<Category> {
        let mut category = Category::create(&self.name, &self.description, session.now())?;
        session.save(&mut category).await?;
        Ok(category)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateCategory {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
}

#[async_trait]
impl Request for UpdateCategory {
    type Response = Category;
    const NAME: &'static str = "update_category";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_category(errors, &self.name);
    }

    async fn handle(self, session: &mut Session) -> Result<Category> {
        let mut category: Category = session.load(self.category_id).await?;
        category.update(&self.name, &self.description, session.now())?;
        session.save(&mut category).await?;
        Ok(category)
    }
}

/// Deletes a category no product references.
#[derive(Debug, Clone, Copy)]
pub struct DeleteCategory {
    pub category_id: CategoryId,
}

#[async_trait]
impl Request for DeleteCategory {
    type Response = ();
    const NAME: &'static str = "delete_category";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<()> {
        let category: Category = session.load(self.category_id).await?;
        let in_use = session
            .repository::<Product>()
            .count(&ProductsInCategory(self.category_id))
            .await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Category {} is assigned to {in_use} product(s)",
                category.name()
            )));
        }

        session.repository::<Category>().delete(&category).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetCategory {
    pub category_id: CategoryId,
}

#[async_trait]
impl Request for GetCategory {
    type Response = Category;
    const NAME: &'static str = "get_category";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<Category> {
        session.load(self.category_id).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListCategories {
    pub page: Page,
}

#[async_trait]
impl Request for ListCategories {
    type Response = Paged<Category>;
    const NAME: &'static str = "list_categories";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<Paged<Category>> {
        Ok(session
            .repository::<Category>()
            .find(&AllCategories, self.page)
            .await?)
    }
}

// Products

const SKU_KEY: &str = "SKU";

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub sku: String,
    pub price_cents: i64,
    pub stock: u32,
    pub category_ids: BTreeSet<CategoryId>,
}

#[async_trait]
impl Request for CreateProduct {
    type Response = ProductView;
    const NAME: &'static str = "create_product";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_product_details(errors, &self.name);
        errors.require("sku", &self.sku);
        errors.max_len("sku", &self.sku, MAX_SKU_LEN);
        errors.positive_cents("price_cents", self.price_cents);
    }

    async fn handle(self, session: &mut Session) -> Result<ProductView> {
        let sku = normalize_sku(&self.sku);
        let taken = session
            .repository::<Product>()
            .find_one(&ProductBySku(sku.clone()))
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(format!("SKU {sku} is already in use")));
        }
        ensure_categories_exist(session, &self.category_ids).await?;

        let mut product = Product::create(
            NewProduct {
                name: self.name,
                description: self.description,
                sku,
                price: Money::from_cents(self.price_cents),
                stock: self.stock,
                category_ids: self.category_ids,
            },
            session.now(),
        )?;
        session
            .claim_unique(SKU_KEY, product.sku(), product.id().as_uuid())
            .await?;
        session.save(&mut product).await?;

        tracing::info!(product_id = %product.id(), sku = product.sku(), "product created");
        view_one(product, session).await
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProduct {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
}

#[async_trait]
impl Request for UpdateProduct {
    type Response = ProductView;
    const NAME: &'static str = "update_product";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_product_details(errors, &self.name);
    }

    async fn handle(self, session: &mut Session) -> Result<ProductView> {
        let mut product: Product = session.load(self.product_id).await?;
        product.update_details(&self.name, &self.description, session.now())?;
        session.save(&mut product).await?;
        view_one(product, session).await
    }
}

/// Fetches a product. Inactive products are only visible to administrators.
#[derive(Debug, Clone, Copy)]
pub struct GetProduct {
    pub product_id: ProductId,
}

#[async_trait]
impl Request for GetProduct {
    type Response = ProductView;
    const NAME: &'static str = "get_product";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<ProductView> {
        let product: Product = session.load(self.product_id).await?;
        if !product.is_active() && !session.actor().is_admin() {
            return Err(AppError::not_found("Product", self.product_id));
        }
        view_one(product, session).await
    }
}

/// Lists products. Customers and anonymous callers only see active ones.
#[derive(Debug, Clone, Default)]
pub struct ListProducts {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub include_inactive: bool,
    pub page: Page,
}

#[async_trait]
impl Request for ListProducts {
    type Response = Paged<ProductView>;
    const NAME: &'static str = "list_products";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    async fn handle(self, session: &mut Session) -> Result<Paged<ProductView>> {
        let mut spec: Box<dyn Specification<Product>> = Box::new(AllProducts);
        if let Some(category_id) = self.category_id {
            spec = Box::new(spec.and(ProductsInCategory(category_id)));
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.trim().is_empty()) {
            spec = Box::new(spec.and(ProductsMatchingName::new(term)));
        }
        if !(self.include_inactive && session.actor().is_admin()) {
            spec = Box::new(spec.and(ActiveProducts));
        }

        let page = session.repository::<Product>().find(&spec, self.page).await?;
        let sales = active_sales(session).await?;
        let session = &*session;
        Ok(Paged {
            items: page
                .items
                .into_iter()
                .map(|product| view(product, &sales, session))
                .collect(),
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeProductPrice {
    pub product_id: ProductId,
    pub price_cents: i64,
}

#[async_trait]
impl Request for ChangeProductPrice {
    type Response = ProductView;
    const NAME: &'static str = "change_product_price";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.positive_cents("price_cents", self.price_cents);
    }

    async fn handle(self, session: &mut Session) -> Result<ProductView> {
        let mut product: Product = session.load(self.product_id).await?;
        product.change_price(Money::from_cents(self.price_cents), session.now())?;
        session.save(&mut product).await?;
        view_one(product, session).await
    }
}

/// Adds (positive delta) or removes (negative delta) stock.
#[derive(Debug, Clone, Copy)]
pub struct AdjustStock {
    pub product_id: ProductId,
    pub delta: i64,
}

#[async_trait]
impl Request for AdjustStock {
    type Response = ProductView;
    const NAME: &'static str = "adjust_stock";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.check(self.delta != 0, "delta", "must not be 0");
        errors.check(
            u32::try_from(self.delta.unsigned_abs()).is_ok(),
            "delta",
            "is too large",
        );
    }

    async fn handle(self, session: &mut Session) -> Result<ProductView> {
        let quantity = u32::try_from(self.delta.unsigned_abs())
            .map_err(|_| AppError::Internal("stock delta out of range".to_string()))?;

        let mut product: Product = session.load(self.product_id).await?;
        if self.delta > 0 {
            product.add_stock(quantity, session.now())?;
        } else {
            product.remove_stock(quantity, session.now())?;
        }
        session.save(&mut product).await?;
        view_one(product, session).await
    }
}

#[derive(Debug, Clone)]
pub struct SetProductCategories {
    pub product_id: ProductId,
    pub category_ids: BTreeSet<CategoryId>,
}

#[async_trait]
impl Request for SetProductCategories {
    type Response = ProductView;
    const NAME: &'static str = "set_product_categories";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<ProductView> {
        ensure_categories_exist(session, &self.category_ids).await?;
        let mut product: Product = session.load(self.product_id).await?;
        product.assign_categories(self.category_ids, session.now());
        session.save(&mut product).await?;
        view_one(product, session).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SetProductActive {
    pub product_id: ProductId,
    pub active: bool,
}

#[async_trait]
impl Request for SetProductActive {
    type Response = ProductView;
    const NAME: &'static str = "set_product_active";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<ProductView> {
        let mut product: Product = session.load(self.product_id).await?;
        if self.active {
            product.activate(session.now());
        } else {
            product.deactivate(session.now());
        }
        session.save(&mut product).await?;
        view_one(product, session).await
    }
}
