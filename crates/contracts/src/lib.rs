//! JSON contracts of the storefront HTTP API.
//!
//! Request bodies deserialize straight from client JSON; responses are
//! built from domain aggregates with `From` conversions. Money travels as
//! integer cents, percentages as percent values (`12.5`) and enumerations
//! as their names.

pub mod catalog;
pub mod common;
pub mod identity;
pub mod ordering;
pub mod promotions;
pub mod shipping;

pub use catalog::*;
pub use common::{AddressDto, ErrorResponse, PageQuery, PagedResponse, basis_points, percent};
pub use identity::*;
pub use ordering::*;
pub use promotions::*;
pub use shipping::*;
