//! Payment status machine and payment methods.

use serde::{Deserialize, Serialize};
use shared_kernel::Enumeration;

/// The status of a payment.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Approved
///           ├──► Rejected
///           └──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Awaiting processing.
    #[default]
    Pending,

    /// Charge succeeded (terminal state).
    Approved,

    /// Charge was declined (terminal state).
    Rejected,

    /// Payment was withdrawn before processing (terminal state).
    Canceled,
}

impl PaymentStatus {
    /// Returns true if the payment can be approved, rejected or canceled.
    pub fn can_process(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.can_process()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Approved => "Approved",
            PaymentStatus::Rejected => "Rejected",
            PaymentStatus::Canceled => "Canceled",
        }
    }
}

impl Enumeration for PaymentStatus {
    fn all() -> &'static [Self] {
        &[
            PaymentStatus::Pending,
            PaymentStatus::Approved,
            PaymentStatus::Rejected,
            PaymentStatus::Canceled,
        ]
    }

    fn id(&self) -> i32 {
        match self {
            PaymentStatus::Pending => 1,
            PaymentStatus::Approved => 2,
            PaymentStatus::Rejected => 3,
            PaymentStatus::Canceled => 4,
        }
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Pix,
    BankSlip,
}

impl Enumeration for PaymentMethod {
    fn all() -> &'static [Self] {
        &[
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
            PaymentMethod::Pix,
            PaymentMethod::BankSlip,
        ]
    }

    fn id(&self) -> i32 {
        match self {
            PaymentMethod::CreditCard => 1,
            PaymentMethod::DebitCard => 2,
            PaymentMethod::Pix => 3,
            PaymentMethod::BankSlip => 4,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CreditCard",
            PaymentMethod::DebitCard => "DebitCard",
            PaymentMethod::Pix => "Pix",
            PaymentMethod::BankSlip => "BankSlip",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_can_be_processed() {
        assert!(PaymentStatus::Pending.can_process());
        assert!(!PaymentStatus::Approved.can_process());
        assert!(!PaymentStatus::Rejected.can_process());
        assert!(!PaymentStatus::Canceled.can_process());
        assert!(PaymentStatus::Canceled.is_terminal());
    }

    #[test]
    fn method_names_round_trip() {
        for method in PaymentMethod::all() {
            assert_eq!(PaymentMethod::from_name(method.name()), Some(*method));
        }
        assert_eq!(PaymentMethod::from_name("pix"), Some(PaymentMethod::Pix));
        assert_eq!(PaymentMethod::from_name("cash"), None);
    }
}
