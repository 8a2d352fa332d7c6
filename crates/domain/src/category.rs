//! Category aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, DomainEvent, Version};
use thiserror::Error;

use crate::CategoryId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error("Category name is required")]
    NameRequired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CategoryEvent {
    Created {
        category_id: CategoryId,
        name: String,
    },
    Updated {
        category_id: CategoryId,
        name: String,
    },
}

impl DomainEvent for CategoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CategoryEvent::Created { .. } => "CategoryCreated",
            CategoryEvent::Updated { .. } => "CategoryUpdated",
        }
    }
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<CategoryEvent>,
}

impl Category {
    pub fn create(name: &str, description: &str, now: DateTime<Utc>) -> Result<Self, CategoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryError::NameRequired);
        }

        let id = CategoryId::new();
        Ok(Self {
            id,
            name: name.to_string(),
            description: description.trim().to_string(),
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            events: vec![CategoryEvent::Created {
                category_id: id,
                name: name.to_string(),
            }],
        })
    }

    pub fn update(
        &mut self,
        name: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CategoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryError::NameRequired);
        }
        self.name = name.to_string();
        self.description = description.trim().to_string();
        self.updated_at = now;
        self.events.push(CategoryEvent::Updated {
            category_id: self.id,
            name: self.name.clone(),
        });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl AggregateRoot for Category {
    type Id = CategoryId;
    type Event = CategoryEvent;

    fn aggregate_type() -> &'static str {
        "Category"
    }

    fn id(&self) -> CategoryId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<CategoryEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_update() {
        let mut category = Category::create(" Books ", "Paper things", Utc::now()).unwrap();
        assert_eq!(category.name(), "Books");

        category.update("E-books", "", Utc::now()).unwrap();
        assert_eq!(category.name(), "E-books");
        assert_eq!(category.description(), "");

        let types: Vec<_> = category
            .take_events()
            .iter()
            .map(|e| e.event_type())
            .collect();
        assert_eq!(types, ["CategoryCreated", "CategoryUpdated"]);
    }

    #[test]
    fn name_is_required() {
        assert_eq!(
            Category::create("", "x", Utc::now()).unwrap_err(),
            CategoryError::NameRequired
        );
        let mut category = Category::create("Toys", "", Utc::now()).unwrap();
        assert!(category.update("  ", "", Utc::now()).is_err());
        assert_eq!(category.name(), "Toys");
    }
}
