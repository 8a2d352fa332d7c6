//! HTTP routes, one module per resource area.

pub mod catalog;
pub mod health;
pub mod identity;
pub mod metrics;
pub mod orders;
pub mod promotions;
pub mod shipping;
