//! Carrier aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, DomainEvent, Version};
use thiserror::Error;

use crate::{CarrierId, Email};

/// Placeholder a tracking-url template must contain.
pub const TRACKING_PLACEHOLDER: &str = "{tracking_number}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CarrierError {
    #[error("Carrier name is required")]
    NameRequired,

    #[error("Tracking url template must contain {{tracking_number}}")]
    InvalidTrackingTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CarrierEvent {
    Created { carrier_id: CarrierId, name: String },
    Updated { carrier_id: CarrierId, name: String },
    Activated { carrier_id: CarrierId },
    Deactivated { carrier_id: CarrierId },
}

impl DomainEvent for CarrierEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CarrierEvent::Created { .. } => "CarrierCreated",
            CarrierEvent::Updated { .. } => "CarrierUpdated",
            CarrierEvent::Activated { .. } => "CarrierActivated",
            CarrierEvent::Deactivated { .. } => "CarrierDeactivated",
        }
    }
}

/// A shipping company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    id: CarrierId,
    name: String,
    contact_email: Email,
    tracking_url_template: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<CarrierEvent>,
}

fn validate(name: &str, template: Option<String>) -> Result<(String, Option<String>), CarrierError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CarrierError::NameRequired);
    }
    let template = template
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if let Some(ref t) = template
        && !t.contains(TRACKING_PLACEHOLDER)
    {
        return Err(CarrierError::InvalidTrackingTemplate);
    }
    Ok((name.to_string(), template))
}

impl Carrier {
    pub fn create(
        name: &str,
        contact_email: Email,
        tracking_url_template: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, CarrierError> {
        let (name, tracking_url_template) = validate(name, tracking_url_template)?;
        let id = CarrierId::new();
        Ok(Self {
            id,
            name: name.clone(),
            contact_email,
            tracking_url_template,
            active: true,
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            events: vec![CarrierEvent::Created {
                carrier_id: id,
                name,
            }],
        })
    }

    pub fn update(
        &mut self,
        name: &str,
        contact_email: Email,
        tracking_url_template: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), CarrierError> {
        let (name, tracking_url_template) = validate(name, tracking_url_template)?;
        self.name = name.clone();
        self.contact_email = contact_email;
        self.tracking_url_template = tracking_url_template;
        self.updated_at = now;
        self.events.push(CarrierEvent::Updated {
            carrier_id: self.id,
            name,
        });
        Ok(())
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        if !self.active {
            self.active = true;
            self.updated_at = now;
            self.events.push(CarrierEvent::Activated {
                carrier_id: self.id,
            });
        }
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        if self.active {
            self.active = false;
            self.updated_at = now;
            self.events.push(CarrierEvent::Deactivated {
                carrier_id: self.id,
            });
        }
    }

    /// Builds the public tracking url for a tracking number, if the carrier has a template.
    pub fn tracking_url(&self, tracking_number: &str) -> Option<String> {
        self.tracking_url_template
            .as_ref()
            .map(|t| t.replace(TRACKING_PLACEHOLDER, tracking_number))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact_email(&self) -> &Email {
        &self.contact_email
    }

    pub fn tracking_url_template(&self) -> Option<&str> {
        self.tracking_url_template.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl AggregateRoot for Carrier {
    type Id = CarrierId;
    type Event = CarrierEvent;

    fn aggregate_type() -> &'static str {
        "Carrier"
    }

    fn id(&self) -> CarrierId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<CarrierEvent> {
        std::mem::take(&mut self.events)
    }
}
