//! Sale aggregate.
//!
//! A sale discounts the products and categories it targets while `now` lies
//! in `[starts_at, ends_at)`. A sale with no targets discounts nothing.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, DomainEvent, Percentage, Version};
use thiserror::Error;

use crate::{CategoryId, ProductId, SaleId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    #[error("Sale name is required")]
    NameRequired,

    #[error("Sale must start before it ends")]
    InvalidWindow,

    #[error("Sale already ended at {ended_at}")]
    AlreadyEnded { ended_at: DateTime<Utc> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SaleEvent {
    Created {
        sale_id: SaleId,
        name: String,
        percentage: Percentage,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
    Updated {
        sale_id: SaleId,
        percentage: Percentage,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
    TargetsChanged {
        sale_id: SaleId,
        product_ids: BTreeSet<ProductId>,
        category_ids: BTreeSet<CategoryId>,
    },
    Ended {
        sale_id: SaleId,
        ended_at: DateTime<Utc>,
    },
}

impl DomainEvent for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::Created { .. } => "SaleCreated",
            SaleEvent::Updated { .. } => "SaleUpdated",
            SaleEvent::TargetsChanged { .. } => "SaleTargetsChanged",
            SaleEvent::Ended { .. } => "SaleEnded",
        }
    }
}

/// The editable terms of a sale.
#[derive(Debug, Clone)]
pub struct SaleTerms {
    pub name: String,
    pub description: String,
    pub percentage: Percentage,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl SaleTerms {
    fn validate(&self) -> Result<String, SaleError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SaleError::NameRequired);
        }
        if self.starts_at >= self.ends_at {
            return Err(SaleError::InvalidWindow);
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    name: String,
    description: String,
    percentage: Percentage,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    product_ids: BTreeSet<ProductId>,
    category_ids: BTreeSet<CategoryId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<SaleEvent>,
}

impl Sale {
    pub fn create(terms: SaleTerms, now: DateTime<Utc>) -> Result<Self, SaleError> {
        let name = terms.validate()?;
        let id = SaleId::new();
        Ok(Self {
            id,
            name: name.clone(),
            description: terms.description.trim().to_string(),
            percentage: terms.percentage,
            starts_at: terms.starts_at,
            ends_at: terms.ends_at,
            product_ids: BTreeSet::new(),
            category_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            events: vec![SaleEvent::Created {
                sale_id: id,
                name,
                percentage: terms.percentage,
                starts_at: terms.starts_at,
                ends_at: terms.ends_at,
            }],
        })
    }

    pub fn update(&mut self, terms: SaleTerms, now: DateTime<Utc>) -> Result<(), SaleError> {
        let name = terms.validate()?;
        self.name = name;
        self.description = terms.description.trim().to_string();
        self.percentage = terms.percentage;
        self.starts_at = terms.starts_at;
        self.ends_at = terms.ends_at;
        self.updated_at = now;
        self.events.push(SaleEvent::Updated {
            sale_id: self.id,
            percentage: self.percentage,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        });
        Ok(())
    }

    /// Replaces the targeted products and categories.
    pub fn set_targets(
        &mut self,
        product_ids: BTreeSet<ProductId>,
        category_ids: BTreeSet<CategoryId>,
        now: DateTime<Utc>,
    ) {
        self.product_ids = product_ids.clone();
        self.category_ids = category_ids.clone();
        self.updated_at = now;
        self.events.push(SaleEvent::TargetsChanged {
            sale_id: self.id,
            product_ids,
            category_ids,
        });
    }

    /// Ends the sale at `now`.
    ///
    /// A sale that has not started yet ends with an empty window.
    pub fn end(&mut self, now: DateTime<Utc>) -> Result<(), SaleError> {
        if self.ends_at <= now {
            return Err(SaleError::AlreadyEnded {
                ended_at: self.ends_at,
            });
        }
        self.ends_at = now.max(self.starts_at);
        self.updated_at = now;
        self.events.push(SaleEvent::Ended {
            sale_id: self.id,
            ended_at: self.ends_at,
        });
        Ok(())
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now < self.ends_at
    }

    pub fn applies_to(&self, product_id: ProductId, categories: &BTreeSet<CategoryId>) -> bool {
        self.product_ids.contains(&product_id) || !self.category_ids.is_disjoint(categories)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn percentage(&self) -> Percentage {
        self.percentage
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    pub fn product_ids(&self) -> &BTreeSet<ProductId> {
        &self.product_ids
    }

    pub fn category_ids(&self) -> &BTreeSet<CategoryId> {
        &self.category_ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl AggregateRoot for Sale {
    type Id = SaleId;
    type Event = SaleEvent;

    fn aggregate_type() -> &'static str {
        "Sale"
    }

    fn id(&self) -> SaleId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<SaleEvent> {
        std::mem::take(&mut self.events)
    }
}
