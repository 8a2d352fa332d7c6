//! Carrier and shipping method records.

use chrono::{DateTime, Utc};
use domain::{Carrier, CarrierId, ShippingMethod, ShippingMethodId};
use serde::{Deserialize, Serialize};
use shared_kernel::AggregateRoot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierRequest {
    pub name: String,
    pub contact_email: String,
    /// URL with a `{tracking_number}` placeholder.
    #[serde(default)]
    pub tracking_url_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierResponse {
    pub id: CarrierId,
    pub name: String,
    pub contact_email: String,
    pub tracking_url_template: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Carrier> for CarrierResponse {
    fn from(carrier: &Carrier) -> Self {
        Self {
            id: carrier.id(),
            name: carrier.name().to_string(),
            contact_email: carrier.contact_email().as_str().to_string(),
            tracking_url_template: carrier.tracking_url_template().map(str::to_string),
            active: carrier.is_active(),
            created_at: carrier.created_at(),
            updated_at: carrier.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShippingMethodRequest {
    pub carrier_id: CarrierId,
    pub name: String,
    pub price_cents: i64,
    pub estimated_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateShippingMethodRequest {
    pub name: String,
    pub price_cents: i64,
    pub estimated_days: u32,
}

/// `GET /shipping-methods` filters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ShippingMethodQuery {
    pub carrier_id: Option<CarrierId>,
    #[serde(default)]
    pub active_only: bool,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMethodResponse {
    pub id: ShippingMethodId,
    pub carrier_id: CarrierId,
    pub name: String,
    pub price_cents: i64,
    pub estimated_days: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ShippingMethod> for ShippingMethodResponse {
    fn from(method: &ShippingMethod) -> Self {
        Self {
            id: method.id(),
            carrier_id: method.carrier_id(),
            name: method.name().to_string(),
            price_cents: method.price().cents(),
            estimated_days: method.estimated_days(),
            active: method.is_active(),
            created_at: method.created_at(),
            updated_at: method.updated_at(),
        }
    }
}
