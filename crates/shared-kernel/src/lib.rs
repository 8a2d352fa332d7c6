//! Shared kernel for the storefront backend.
//!
//! Building blocks every other crate leans on:
//! - [`Version`] and the [`define_id!`] macro for typed identifiers
//! - [`Money`] and [`Percentage`] value objects, plus [`apply_discounts`]
//! - [`AggregateRoot`] and [`DomainEvent`] traits
//! - [`Enumeration`] for the small status enums
//! - [`Specification`] for reusable query filters

pub mod aggregate;
pub mod discount;
pub mod enumeration;
pub mod id;
pub mod money;
pub mod percentage;
pub mod specification;

pub use aggregate::{AggregateRoot, DomainEvent};
pub use discount::apply_discounts;
pub use enumeration::Enumeration;
pub use id::Version;
pub use money::Money;
pub use percentage::{Percentage, PercentageError};
pub use specification::{All, Page, Paged, Specification, SpecificationExt, spec_fn};

#[doc(hidden)]
pub use uuid as __uuid;
