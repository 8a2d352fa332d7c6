//! Order status machine.

use serde::{Deserialize, Serialize};
use shared_kernel::Enumeration;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Paid ──► Shipped ──► Delivered
///           │
///           └──► Canceled
/// ```
/// Only pending orders can be canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed, awaiting payment.
    #[default]
    Pending,

    /// Payment approved, awaiting shipment.
    Paid,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer (terminal state).
    Delivered,

    /// Canceled before payment (terminal state).
    Canceled,
}

impl OrderStatus {
    /// Returns true if the order can be marked paid in this status.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be marked shipped in this status.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the order can be marked delivered in this status.
    pub fn can_deliver(&self) -> bool {
        matches!(self, OrderStatus::Shipped)
    }

    /// Returns true if the order can be canceled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

impl Enumeration for OrderStatus {
    fn all() -> &'static [Self] {
        &[
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Canceled,
        ]
    }

    fn id(&self) -> i32 {
        match self {
            OrderStatus::Pending => 1,
            OrderStatus::Paid => 2,
            OrderStatus::Shipped => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Canceled => 5,
        }
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_only_pending_can_pay_or_cancel() {
        for status in OrderStatus::all() {
            let pending = *status == OrderStatus::Pending;
            assert_eq!(status.can_pay(), pending, "{status}");
            assert_eq!(status.can_cancel(), pending, "{status}");
        }
    }

    #[test]
    fn test_fulfilment_order() {
        assert!(OrderStatus::Paid.can_ship());
        assert!(!OrderStatus::Pending.can_ship());
        assert!(OrderStatus::Shipped.can_deliver());
        assert!(!OrderStatus::Paid.can_deliver());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(OrderStatus::from_name("shipped"), Some(OrderStatus::Shipped));
        assert_eq!(OrderStatus::from_id(5), Some(OrderStatus::Canceled));
        assert_eq!(OrderStatus::Paid.to_string(), "Paid");
    }
}
