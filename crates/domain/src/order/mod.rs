//! Order aggregate and related types.

mod aggregate;
mod events;
mod line;
mod status;

pub use aggregate::{NewOrder, Order};
pub use events::{
    OrderCanceledData, OrderCreatedData, OrderDeliveredData, OrderEvent, OrderPaidData,
    OrderShippedData,
};
pub use line::OrderLine;
pub use status::OrderStatus;

use shared_kernel::Money;
use thiserror::Error;

use crate::ProductId;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order has no lines.
    #[error("Order has no items")]
    NoLines,

    /// Invalid quantity.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Discounted price is negative or above the base price.
    #[error("Invalid price for product {product_id}")]
    InvalidPrice { product_id: ProductId },

    /// Shipping cost is negative.
    #[error("Invalid shipping cost: {cost}")]
    InvalidShippingCost { cost: Money },

    /// Line totals do not fit in a money amount.
    #[error("Order total is too large")]
    AmountTooLarge,

    /// Order is not in the expected status.
    #[error("Invalid status transition: cannot {action} from {current} status")]
    InvalidStatusTransition {
        current: OrderStatus,
        action: &'static str,
    },
}
