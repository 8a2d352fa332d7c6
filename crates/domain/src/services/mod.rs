//! Domain services spanning several aggregates.

mod discount;

pub use discount::{AppliedDiscount, DiscountService, DiscountSource, PriceQuote};
