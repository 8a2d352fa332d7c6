//! Product aggregate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, DomainEvent, Money, Version};
use thiserror::Error;

use crate::{CategoryId, ProductId};

/// Errors that can occur during product operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Product name is required")]
    NameRequired,

    #[error("Product SKU is required")]
    SkuRequired,

    /// Price must be greater than zero.
    #[error("Invalid price: {price} (must be greater than 0)")]
    InvalidPrice { price: i64 },

    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Not enough units on hand.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Product is not for sale.
    #[error("Product {product_id} is not active")]
    Inactive { product_id: ProductId },
}

/// Events raised by the product aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProductEvent {
    Created {
        product_id: ProductId,
        name: String,
        sku: String,
        price: Money,
    },
    DetailsUpdated {
        product_id: ProductId,
        name: String,
    },
    PriceChanged {
        product_id: ProductId,
        old_price: Money,
        new_price: Money,
    },
    StockAdded {
        product_id: ProductId,
        quantity: u32,
        stock: u32,
    },
    StockRemoved {
        product_id: ProductId,
        quantity: u32,
        stock: u32,
    },
    CategoriesAssigned {
        product_id: ProductId,
        category_ids: BTreeSet<CategoryId>,
    },
    Activated {
        product_id: ProductId,
    },
    Deactivated {
        product_id: ProductId,
    },
}

impl DomainEvent for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::Created { .. } => "ProductCreated",
            ProductEvent::DetailsUpdated { .. } => "ProductDetailsUpdated",
            ProductEvent::PriceChanged { .. } => "ProductPriceChanged",
            ProductEvent::StockAdded { .. } => "ProductStockAdded",
            ProductEvent::StockRemoved { .. } => "ProductStockRemoved",
            ProductEvent::CategoriesAssigned { .. } => "ProductCategoriesAssigned",
            ProductEvent::Activated { .. } => "ProductActivated",
            ProductEvent::Deactivated { .. } => "ProductDeactivated",
        }
    }
}

/// Input for [`Product::create`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub sku: String,
    pub price: Money,
    pub stock: u32,
    pub category_ids: BTreeSet<CategoryId>,
}

/// A product in the catalog.
///
/// Products start active. Stock can only be removed while enough units are
/// on hand, and an inactive product cannot be ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    sku: String,
    price: Money,
    stock: u32,
    category_ids: BTreeSet<CategoryId>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<ProductEvent>,
}

fn validate_price(price: Money) -> Result<Money, ProductError> {
    if !price.is_positive() {
        return Err(ProductError::InvalidPrice {
            price: price.cents(),
        });
    }
    Ok(price)
}

/// Normalizes a SKU: trimmed and uppercase.
pub fn normalize_sku(sku: &str) -> String {
    sku.trim().to_uppercase()
}

// Query methods
impl Product {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn category_ids(&self) -> &BTreeSet<CategoryId> {
        &self.category_ids
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn in_category(&self, category_id: CategoryId) -> bool {
        self.category_ids.contains(&category_id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks that `quantity` units can be ordered right now.
    pub fn ensure_orderable(&self, quantity: u32) -> Result<(), ProductError> {
        if !self.active {
            return Err(ProductError::Inactive {
                product_id: self.id,
            });
        }
        if quantity == 0 {
            return Err(ProductError::InvalidQuantity { quantity });
        }
        if quantity > self.stock {
            return Err(ProductError::InsufficientStock {
                product_id: self.id,
                requested: quantity,
                available: self.stock,
            });
        }
        Ok(())
    }
}

// Command methods
impl Product {
    /// Creates a new, active product.
    pub fn create(new: NewProduct, now: DateTime<Utc>) -> Result<Self, ProductError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(ProductError::NameRequired);
        }
        let sku = normalize_sku(&new.sku);
        if sku.is_empty() {
            return Err(ProductError::SkuRequired);
        }
        let price = validate_price(new.price)?;

        let id = ProductId::new();
        Ok(Self {
            id,
            name: name.clone(),
            description: new.description.trim().to_string(),
            sku: sku.clone(),
            price,
            stock: new.stock,
            category_ids: new.category_ids,
            active: true,
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            events: vec![ProductEvent::Created {
                product_id: id,
                name,
                sku,
                price,
            }],
        })
    }

    /// Changes name and description.
    pub fn update_details(
        &mut self,
        name: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ProductError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductError::NameRequired);
        }
        self.name = name.to_string();
        self.description = description.trim().to_string();
        self.updated_at = now;
        self.events.push(ProductEvent::DetailsUpdated {
            product_id: self.id,
            name: self.name.clone(),
        });
        Ok(())
    }

    /// Changes the list price.
    pub fn change_price(&mut self, price: Money, now: DateTime<Utc>) -> Result<(), ProductError> {
        let new_price = validate_price(price)?;
        if new_price == self.price {
            return Ok(());
        }
        let old_price = self.price;
        self.price = new_price;
        self.updated_at = now;
        self.events.push(ProductEvent::PriceChanged {
            product_id: self.id,
            old_price,
            new_price,
        });
        Ok(())
    }

    /// Adds units to the stock.
    pub fn add_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<(), ProductError> {
        if quantity == 0 {
            return Err(ProductError::InvalidQuantity { quantity });
        }
        self.stock = self.stock.saturating_add(quantity);
        self.updated_at = now;
        self.events.push(ProductEvent::StockAdded {
            product_id: self.id,
            quantity,
            stock: self.stock,
        });
        Ok(())
    }

    /// Removes units from the stock.
    pub fn remove_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<(), ProductError> {
        if quantity == 0 {
            return Err(ProductError::InvalidQuantity { quantity });
        }
        if quantity > self.stock {
            return Err(ProductError::InsufficientStock {
                product_id: self.id,
                requested: quantity,
                available: self.stock,
            });
        }
        self.stock -= quantity;
        self.updated_at = now;
        self.events.push(ProductEvent::StockRemoved {
            product_id: self.id,
            quantity,
            stock: self.stock,
        });
        Ok(())
    }

    /// Replaces the category assignments.
    pub fn assign_categories(&mut self, category_ids: BTreeSet<CategoryId>, now: DateTime<Utc>) {
        self.category_ids = category_ids.clone();
        self.updated_at = now;
        self.events.push(ProductEvent::CategoriesAssigned {
            product_id: self.id,
            category_ids,
        });
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        if self.active {
            return;
        }
        self.active = true;
        self.updated_at = now;
        self.events.push(ProductEvent::Activated {
            product_id: self.id,
        });
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        if !self.active {
            return;
        }
        self.active = false;
        self.updated_at = now;
        self.events.push(ProductEvent::Deactivated {
            product_id: self.id,
        });
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;
    type Event = ProductEvent;

    fn aggregate_type() -> &'static str {
        "Product"
    }

    fn id(&self) -> ProductId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<ProductEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: u32) -> Product {
        Product::create(
            NewProduct {
                name: "Widget".into(),
                description: "A widget".into(),
                sku: " wid-001 ".into(),
                price: Money::from_cents(1999),
                stock,
                category_ids: BTreeSet::new(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_normalizes_and_raises_event() {
        let mut product = widget(5);
        assert_eq!(product.sku(), "WID-001");
        assert!(product.is_active());
        assert_eq!(product.take_events()[0].event_type(), "ProductCreated");
    }

    #[test]
    fn create_rejects_non_positive_price() {
        let result = Product::create(
            NewProduct {
                name: "Free".into(),
                description: String::new(),
                sku: "FREE".into(),
                price: Money::zero(),
                stock: 0,
                category_ids: BTreeSet::new(),
            },
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), ProductError::InvalidPrice { price: 0 });
    }

    #[test]
    fn change_price_records_old_and_new() {
        let mut product = widget(5);
        product.take_events();

        product
            .change_price(Money::from_cents(2499), Utc::now())
            .unwrap();
        match &product.take_events()[..] {
            [ProductEvent::PriceChanged {
                old_price,
                new_price,
                ..
            }] => {
                assert_eq!(old_price.cents(), 1999);
                assert_eq!(new_price.cents(), 2499);
            }
            other => panic!("unexpected events: {other:?}"),
        }

        // Same price is a no-op.
        product
            .change_price(Money::from_cents(2499), Utc::now())
            .unwrap();
        assert!(product.take_events().is_empty());
    }

    #[test]
    fn stock_cannot_go_negative() {
        let mut product = widget(3);
        product.remove_stock(2, Utc::now()).unwrap();
        assert_eq!(product.stock(), 1);

        let err = product.remove_stock(2, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            ProductError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            }
        ));

        product.add_stock(10, Utc::now()).unwrap();
        assert_eq!(product.stock(), 11);
        assert!(product.add_stock(0, Utc::now()).is_err());
    }

    #[test]
    fn inactive_products_are_not_orderable() {
        let mut product = widget(3);
        assert!(product.ensure_orderable(3).is_ok());
        assert!(product.ensure_orderable(4).is_err());

        product.deactivate(Utc::now());
        assert!(matches!(
            product.ensure_orderable(1),
            Err(ProductError::Inactive { .. })
        ));

        product.activate(Utc::now());
        assert!(product.ensure_orderable(1).is_ok());
    }

    #[test]
    fn assign_categories_replaces_set() {
        let mut product = widget(1);
        let books = CategoryId::new();
        product.assign_categories(BTreeSet::from([books]), Utc::now());
        assert!(product.in_category(books));

        product.assign_categories(BTreeSet::new(), Utc::now());
        assert!(!product.in_category(books));
    }
}
