//! Payment aggregate and related types.

mod aggregate;
mod events;
mod status;

pub use aggregate::Payment;
pub use events::PaymentEvent;
pub use status::{PaymentMethod, PaymentStatus};

use shared_kernel::Money;
use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Amount must be greater than zero.
    #[error("Invalid payment amount: {amount}")]
    InvalidAmount { amount: Money },

    /// Payment is not in the expected status.
    #[error("Invalid status transition: cannot {action} a {current} payment")]
    InvalidStatusTransition {
        current: PaymentStatus,
        action: &'static str,
    },

    #[error("Transaction id is required to approve a payment")]
    TransactionIdRequired,
}
